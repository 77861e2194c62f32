use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entities::gene::GeneEvidence;
use crate::pgx::alleles::{UNKNOWN_ALLELE, allele_score};

/// Metabolizer phenotype categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phenotype {
    #[serde(rename = "PM")]
    Poor,
    #[serde(rename = "IM")]
    Intermediate,
    #[serde(rename = "NM")]
    Normal,
    #[serde(rename = "RM")]
    Rapid,
    #[serde(rename = "URM")]
    UltraRapid,
    Unknown,
}

impl Phenotype {
    pub fn code(self) -> &'static str {
        match self {
            Phenotype::Poor => "PM",
            Phenotype::Intermediate => "IM",
            Phenotype::Normal => "NM",
            Phenotype::Rapid => "RM",
            Phenotype::UltraRapid => "URM",
            Phenotype::Unknown => "Unknown",
        }
    }

    pub fn from_code(code: &str) -> Phenotype {
        match code.trim().to_ascii_uppercase().as_str() {
            "PM" => Phenotype::Poor,
            "IM" => Phenotype::Intermediate,
            "NM" => Phenotype::Normal,
            "RM" => Phenotype::Rapid,
            "URM" => Phenotype::UltraRapid,
            _ => Phenotype::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phenotype::Poor => "Poor Metabolizer",
            Phenotype::Intermediate => "Intermediate Metabolizer",
            Phenotype::Normal => "Normal Metabolizer",
            Phenotype::Rapid => "Rapid Metabolizer",
            Phenotype::UltraRapid => "Ultra-rapid Metabolizer",
            Phenotype::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Phenotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

pub fn unknown_diplotype() -> String {
    format!("{UNKNOWN_ALLELE}/{UNKNOWN_ALLELE}")
}

/// First two distinct alleles, a self-paired single allele, or the unknown pair.
pub fn resolve_diplotype(evidence: Option<&GeneEvidence>) -> String {
    let alleles = evidence.map(|e| e.star_alleles.as_slice()).unwrap_or(&[]);
    match alleles {
        [] => unknown_diplotype(),
        [only] => format!("{only}/{only}"),
        [first, second, ..] => format!("{first}/{second}"),
    }
}

/// Summed activity of a two-allele diplotype; `None` if either allele is unscored.
pub fn activity_score(diplotype: &str) -> Option<f64> {
    let parts: Vec<&str> = diplotype.split('/').map(str::trim).collect();
    let [first, second] = parts.as_slice() else {
        return None;
    };
    Some(allele_score(first)? + allele_score(second)?)
}

pub fn infer_phenotype(diplotype: &str) -> Phenotype {
    activity_score(diplotype)
        .map(phenotype_for_activity)
        .unwrap_or(Phenotype::Unknown)
}

fn phenotype_for_activity(total: f64) -> Phenotype {
    if total <= 0.0 {
        Phenotype::Poor
    } else if total <= 1.0 {
        Phenotype::Intermediate
    } else if total <= 2.0 {
        Phenotype::Normal
    } else if total <= 3.0 {
        Phenotype::Rapid
    } else {
        Phenotype::UltraRapid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::gene::Gene;

    fn evidence(alleles: &[&str]) -> GeneEvidence {
        let mut e = GeneEvidence::new(Gene::Cyp2d6);
        for allele in alleles {
            e.record_allele(allele);
        }
        e
    }

    #[test]
    fn reference_pairs_and_thresholds() {
        assert_eq!(infer_phenotype("*1/*1"), Phenotype::Normal);
        assert_eq!(infer_phenotype("*4/*4"), Phenotype::Poor);
        assert_eq!(infer_phenotype("*1/*4"), Phenotype::Intermediate);
        assert_eq!(infer_phenotype("*17/*17"), Phenotype::UltraRapid);
        assert_eq!(infer_phenotype("*1/*17"), Phenotype::Rapid);
        assert_eq!(infer_phenotype("*2/*4"), Phenotype::Intermediate);
        assert_eq!(infer_phenotype("*2/*2"), Phenotype::Intermediate);
        assert_eq!(infer_phenotype("*1/*2"), Phenotype::Normal);
        assert_eq!(infer_phenotype("*4/*17"), Phenotype::Normal);
    }

    #[test]
    fn unrecognized_allele_forces_unknown() {
        assert_eq!(infer_phenotype("*1/*99"), Phenotype::Unknown);
        assert_eq!(infer_phenotype("*99/*17"), Phenotype::Unknown);
        assert_eq!(infer_phenotype("*?/*?"), Phenotype::Unknown);
    }

    #[test]
    fn malformed_diplotypes_are_unknown() {
        assert_eq!(infer_phenotype("*1"), Phenotype::Unknown);
        assert_eq!(infer_phenotype("*1/*1/*4"), Phenotype::Unknown);
        assert_eq!(infer_phenotype(""), Phenotype::Unknown);
    }

    #[test]
    fn inference_is_deterministic() {
        for diplotype in ["*1/*1", "*1/*4", "*10/*41", "*xN/*1", "*1B/*2A"] {
            assert_eq!(infer_phenotype(diplotype), infer_phenotype(diplotype));
        }
    }

    #[test]
    fn diplotype_resolution_shapes() {
        assert_eq!(resolve_diplotype(None), "*?/*?");
        assert_eq!(resolve_diplotype(Some(&evidence(&[]))), "*?/*?");
        assert_eq!(resolve_diplotype(Some(&evidence(&["*4"]))), "*4/*4");
        assert_eq!(resolve_diplotype(Some(&evidence(&["*1", "*4"]))), "*1/*4");
        assert_eq!(
            resolve_diplotype(Some(&evidence(&["*2", "*1", "*4"]))),
            "*2/*1"
        );
    }

    #[test]
    fn activity_scores_sum_both_alleles() {
        assert_eq!(activity_score("*1/*17"), Some(3.0));
        assert_eq!(activity_score(" *2 / *4 "), Some(0.5));
        assert_eq!(activity_score("*1/*99"), None);
        assert_eq!(activity_score("*1"), None);
    }

    #[test]
    fn codes_round_trip_through_from_code() {
        for phenotype in [
            Phenotype::Poor,
            Phenotype::Intermediate,
            Phenotype::Normal,
            Phenotype::Rapid,
            Phenotype::UltraRapid,
            Phenotype::Unknown,
        ] {
            assert_eq!(Phenotype::from_code(phenotype.code()), phenotype);
        }
        assert_eq!(Phenotype::from_code("urm"), Phenotype::UltraRapid);
        assert_eq!(Phenotype::from_code("slow"), Phenotype::Unknown);
    }

    #[test]
    fn phenotype_wire_codes() {
        let json = serde_json::to_string(&Phenotype::UltraRapid).expect("json");
        assert_eq!(json, "\"URM\"");
        assert_eq!(Phenotype::Normal.label(), "Normal Metabolizer");
    }
}
