use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Pharmacogenes covered by the rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Gene {
    #[serde(rename = "CYP2D6")]
    Cyp2d6,
    #[serde(rename = "CYP2C19")]
    Cyp2c19,
    #[serde(rename = "CYP2C9")]
    Cyp2c9,
    #[serde(rename = "SLCO1B1")]
    Slco1b1,
    #[serde(rename = "TPMT")]
    Tpmt,
    #[serde(rename = "DPYD")]
    Dpyd,
}

impl Gene {
    pub const ALL: [Gene; 6] = [
        Gene::Cyp2d6,
        Gene::Cyp2c19,
        Gene::Cyp2c9,
        Gene::Slco1b1,
        Gene::Tpmt,
        Gene::Dpyd,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Gene::Cyp2d6 => "CYP2D6",
            Gene::Cyp2c19 => "CYP2C19",
            Gene::Cyp2c9 => "CYP2C9",
            Gene::Slco1b1 => "SLCO1B1",
            Gene::Tpmt => "TPMT",
            Gene::Dpyd => "DPYD",
        }
    }

    pub fn from_symbol(value: &str) -> Option<Gene> {
        let normalized = value.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|gene| gene.symbol() == normalized)
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zygosity {
    Heterozygous,
    Homozygous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantEffect {
    LossOfFunction,
    GainOfFunction,
    ReducedFunction,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedVariant {
    pub rsid: String,
    pub star_allele: String,
    pub zygosity: Zygosity,
    pub effect: VariantEffect,
}

/// Per-gene evidence folded from the record stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneEvidence {
    pub gene: Gene,
    /// Distinct star alleles in first-seen order.
    pub star_alleles: Vec<String>,
    /// Distinct identifiers in first-seen order, never ".".
    pub rsids: Vec<String>,
    /// One entry per contributing record, duplicates kept.
    pub variants: Vec<DetectedVariant>,
}

impl GeneEvidence {
    pub fn new(gene: Gene) -> Self {
        Self {
            gene,
            star_alleles: Vec::new(),
            rsids: Vec::new(),
            variants: Vec::new(),
        }
    }

    pub(crate) fn record_allele(&mut self, allele: &str) {
        if allele.is_empty() || self.star_alleles.iter().any(|a| a == allele) {
            return;
        }
        self.star_alleles.push(allele.to_string());
    }

    pub(crate) fn record_rsid(&mut self, rsid: &str) {
        if rsid.is_empty() || rsid == "." || self.rsids.iter().any(|r| r == rsid) {
            return;
        }
        self.rsids.push(rsid.to_string());
    }

    pub(crate) fn record_variant(&mut self, variant: DetectedVariant) {
        self.variants.push(variant);
    }
}

pub type GeneEvidenceMap = BTreeMap<Gene, GeneEvidence>;
