use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entities::gene::Gene;

/// Drugs covered by the rule table, one gene each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Drug {
    Codeine,
    Warfarin,
    Clopidogrel,
    Simvastatin,
    Azathioprine,
    Fluorouracil,
}

impl Drug {
    pub const ALL: [Drug; 6] = [
        Drug::Codeine,
        Drug::Warfarin,
        Drug::Clopidogrel,
        Drug::Simvastatin,
        Drug::Azathioprine,
        Drug::Fluorouracil,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Drug::Codeine => "CODEINE",
            Drug::Warfarin => "WARFARIN",
            Drug::Clopidogrel => "CLOPIDOGREL",
            Drug::Simvastatin => "SIMVASTATIN",
            Drug::Azathioprine => "AZATHIOPRINE",
            Drug::Fluorouracil => "FLUOROURACIL",
        }
    }

    pub fn gene(self) -> Gene {
        match self {
            Drug::Codeine => Gene::Cyp2d6,
            Drug::Warfarin => Gene::Cyp2c9,
            Drug::Clopidogrel => Gene::Cyp2c19,
            Drug::Simvastatin => Gene::Slco1b1,
            Drug::Azathioprine => Gene::Tpmt,
            Drug::Fluorouracil => Gene::Dpyd,
        }
    }

    pub fn from_name(value: &str) -> Option<Drug> {
        let normalized = canonical_drug_name(value);
        Self::ALL.into_iter().find(|drug| drug.name() == normalized)
    }
}

impl fmt::Display for Drug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn canonical_drug_name(value: &str) -> String {
    value.trim().to_ascii_uppercase()
}

#[derive(Debug, Clone, Serialize)]
pub struct SupportedDrug {
    pub drug: Drug,
    pub gene: Gene,
}

pub fn supported_drugs() -> Vec<SupportedDrug> {
    Drug::ALL
        .into_iter()
        .map(|drug| SupportedDrug {
            drug,
            gene: drug.gene(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_drug_maps_to_a_distinct_gene() {
        let mut genes: Vec<Gene> = Drug::ALL.iter().map(|d| d.gene()).collect();
        genes.sort();
        genes.dedup();
        assert_eq!(genes.len(), Drug::ALL.len());
    }

    #[test]
    fn from_name_canonicalizes_case_and_whitespace() {
        assert_eq!(Drug::from_name("  Codeine "), Some(Drug::Codeine));
        assert_eq!(Drug::from_name("fluorouracil"), Some(Drug::Fluorouracil));
        assert_eq!(Drug::from_name("ibuprofen"), None);
    }

    #[test]
    fn supported_drugs_pair_each_drug_with_its_gene() {
        let rows = supported_drugs();
        assert_eq!(rows.len(), 6);
        let json = serde_json::to_string(&rows[0]).expect("json");
        assert_eq!(json, r#"{"drug":"CODEINE","gene":"CYP2D6"}"#);
    }

    #[test]
    fn drug_serializes_upper_case() {
        let json = serde_json::to_string(&Drug::Clopidogrel).expect("json");
        assert_eq!(json, "\"CLOPIDOGREL\"");
    }
}
