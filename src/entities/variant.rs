use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// INFO key carrying the gene symbol.
pub const INFO_GENE: &str = "GENE";
/// INFO key carrying the star-allele designation.
pub const INFO_STAR: &str = "STAR";
/// INFO key carrying the dbSNP reference identifier.
pub const INFO_RS: &str = "RS";

/// One data line of an annotated VCF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantRecord {
    pub chrom: String,
    pub pos: u64,
    pub id: String,
    #[serde(rename = "ref")]
    pub ref_allele: String,
    #[serde(rename = "alt")]
    pub alt_allele: String,
    pub qual: String,
    pub filter: String,
    /// INFO pairs; keys are upper-cased at parse time.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub info: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genotype: Option<String>,
}

impl VariantRecord {
    pub fn info_value(&self, key: &str) -> Option<&str> {
        self.info
            .get(&key.to_ascii_uppercase())
            .map(String::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    pub fn gene_symbol(&self) -> Option<String> {
        self.info_value(INFO_GENE).map(str::to_ascii_uppercase)
    }

    pub fn star_allele(&self) -> Option<&str> {
        self.info_value(INFO_STAR)
    }

    /// The RS annotation when present, else the ID column.
    pub fn rsid(&self) -> Option<&str> {
        self.info_value(INFO_RS).or_else(|| {
            let id = self.id.trim();
            (!id.is_empty()).then_some(id)
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedVcf {
    pub header: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_format: Option<String>,
    pub records: Vec<VariantRecord>,
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ParsedVcf {
    /// Some records parsed even though the file is not fully valid.
    pub fn is_partially_usable(&self) -> bool {
        !self.records.is_empty()
    }
}
