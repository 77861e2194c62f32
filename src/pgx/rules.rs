//! Static CPIC-aligned risk table keyed by (drug, phenotype).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entities::drug::Drug;
use crate::pgx::phenotype::Phenotype;

use self::EvidenceLevel as E;
use self::RecommendationType as R;
use self::RiskLabel as L;
use self::Severity as S;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    Safe,
    #[serde(rename = "Adjust Dosage")]
    AdjustDosage,
    Toxic,
    Ineffective,
    Unknown,
}

impl RiskLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLabel::Safe => "Safe",
            RiskLabel::AdjustDosage => "Adjust Dosage",
            RiskLabel::Toxic => "Toxic",
            RiskLabel::Ineffective => "Ineffective",
            RiskLabel::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Low,
    Moderate,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Low => "low",
            Severity::Moderate => "moderate",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    UseAsDirected,
    AdjustDose,
    AvoidDrug,
    UseAlternative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceLevel {
    Strong,
    Moderate,
    Weak,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskMapping {
    pub risk: RiskLabel,
    pub severity: Severity,
    pub confidence: f64,
    pub recommendation: RecommendationType,
    pub action: &'static str,
    pub evidence: EvidenceLevel,
}

const fn rule(
    risk: RiskLabel,
    severity: Severity,
    confidence: f64,
    recommendation: RecommendationType,
    action: &'static str,
    evidence: EvidenceLevel,
) -> RiskMapping {
    RiskMapping {
        risk,
        severity,
        confidence,
        recommendation,
        action,
        evidence,
    }
}

pub static UNKNOWN_RISK: RiskMapping = rule(
    RiskLabel::Unknown,
    Severity::Moderate,
    0.0,
    RecommendationType::UseAsDirected,
    "Insufficient pharmacogenomic data to make a recommendation. Use clinical judgment and standard prescribing guidelines.",
    EvidenceLevel::Weak,
);

static RISK_RULES: [(Drug, Phenotype, RiskMapping); 30] = [
    (
        Drug::Codeine,
        Phenotype::Poor,
        rule(
            L::Toxic,
            S::Critical,
            0.95,
            R::AvoidDrug,
            "Avoid codeine. Use a non-opioid analgesic or a non-CYP2D6-metabolized opioid (e.g., morphine, oxycodone with caution). CYP2D6 PM cannot convert codeine to morphine effectively, but risk of toxicity from altered metabolic pathways.",
            E::Strong,
        ),
    ),
    (
        Drug::Codeine,
        Phenotype::Intermediate,
        rule(
            L::Ineffective,
            S::Moderate,
            0.85,
            R::UseAlternative,
            "Codeine may have reduced efficacy. Consider alternative analgesics.",
            E::Strong,
        ),
    ),
    (
        Drug::Codeine,
        Phenotype::Normal,
        rule(
            L::Safe,
            S::None,
            0.95,
            R::UseAsDirected,
            "Use codeine as directed per standard prescribing guidelines.",
            E::Strong,
        ),
    ),
    (
        Drug::Codeine,
        Phenotype::Rapid,
        rule(
            L::AdjustDosage,
            S::Moderate,
            0.8,
            R::AdjustDose,
            "Use codeine with caution at lower doses. Monitor for adverse effects.",
            E::Moderate,
        ),
    ),
    (
        Drug::Codeine,
        Phenotype::UltraRapid,
        rule(
            L::Toxic,
            S::Critical,
            0.95,
            R::AvoidDrug,
            "Avoid codeine. Ultra-rapid metabolism leads to dangerously high morphine levels. Use non-CYP2D6-metabolized analgesic.",
            E::Strong,
        ),
    ),
    (
        Drug::Warfarin,
        Phenotype::Poor,
        rule(
            L::Toxic,
            S::High,
            0.9,
            R::AdjustDose,
            "Reduce warfarin dose significantly (consider 50-70% reduction). CYP2C9 PM leads to decreased warfarin metabolism and elevated bleeding risk.",
            E::Strong,
        ),
    ),
    (
        Drug::Warfarin,
        Phenotype::Intermediate,
        rule(
            L::AdjustDosage,
            S::Moderate,
            0.85,
            R::AdjustDose,
            "Reduce warfarin dose by approximately 20-40%. Monitor INR closely.",
            E::Strong,
        ),
    ),
    (
        Drug::Warfarin,
        Phenotype::Normal,
        rule(
            L::Safe,
            S::None,
            0.9,
            R::UseAsDirected,
            "Use standard warfarin dosing with routine INR monitoring.",
            E::Strong,
        ),
    ),
    (
        Drug::Warfarin,
        Phenotype::Rapid,
        rule(
            L::Ineffective,
            S::Moderate,
            0.7,
            R::AdjustDose,
            "May require higher warfarin doses. Monitor INR and adjust accordingly.",
            E::Moderate,
        ),
    ),
    (
        Drug::Warfarin,
        Phenotype::UltraRapid,
        rule(
            L::Ineffective,
            S::Moderate,
            0.7,
            R::AdjustDose,
            "May require higher warfarin doses. Monitor INR closely.",
            E::Moderate,
        ),
    ),
    (
        Drug::Clopidogrel,
        Phenotype::Poor,
        rule(
            L::Ineffective,
            S::High,
            0.95,
            R::UseAlternative,
            "Avoid clopidogrel. Use prasugrel or ticagrelor instead. CYP2C19 PM cannot activate clopidogrel prodrug.",
            E::Strong,
        ),
    ),
    (
        Drug::Clopidogrel,
        Phenotype::Intermediate,
        rule(
            L::Ineffective,
            S::Moderate,
            0.85,
            R::UseAlternative,
            "Consider alternative antiplatelet therapy (prasugrel or ticagrelor). Reduced CYP2C19 activity decreases clopidogrel activation.",
            E::Strong,
        ),
    ),
    (
        Drug::Clopidogrel,
        Phenotype::Normal,
        rule(
            L::Safe,
            S::None,
            0.9,
            R::UseAsDirected,
            "Use clopidogrel as directed per standard guidelines.",
            E::Strong,
        ),
    ),
    (
        Drug::Clopidogrel,
        Phenotype::Rapid,
        rule(
            L::Safe,
            S::None,
            0.8,
            R::UseAsDirected,
            "Use clopidogrel as directed. Enhanced metabolism is not clinically concerning.",
            E::Moderate,
        ),
    ),
    (
        Drug::Clopidogrel,
        Phenotype::UltraRapid,
        rule(
            L::Safe,
            S::Low,
            0.75,
            R::UseAsDirected,
            "Use clopidogrel as directed. Monitor for increased bleeding risk.",
            E::Moderate,
        ),
    ),
    (
        Drug::Simvastatin,
        Phenotype::Poor,
        rule(
            L::Toxic,
            S::High,
            0.9,
            R::AdjustDose,
            "Use lower dose simvastatin (max 20 mg/day) or switch to an alternative statin (e.g., rosuvastatin, pravastatin). SLCO1B1 PM increases simvastatin exposure and myopathy risk.",
            E::Strong,
        ),
    ),
    (
        Drug::Simvastatin,
        Phenotype::Intermediate,
        rule(
            L::AdjustDosage,
            S::Moderate,
            0.85,
            R::AdjustDose,
            "Consider lower simvastatin dose or prescribe an alternative statin. Monitor for muscle-related symptoms.",
            E::Strong,
        ),
    ),
    (
        Drug::Simvastatin,
        Phenotype::Normal,
        rule(
            L::Safe,
            S::None,
            0.9,
            R::UseAsDirected,
            "Use simvastatin as directed per standard prescribing guidelines.",
            E::Strong,
        ),
    ),
    (
        Drug::Simvastatin,
        Phenotype::Rapid,
        rule(
            L::Safe,
            S::None,
            0.7,
            R::UseAsDirected,
            "Use simvastatin as directed.",
            E::Weak,
        ),
    ),
    (
        Drug::Simvastatin,
        Phenotype::UltraRapid,
        rule(
            L::Safe,
            S::None,
            0.7,
            R::UseAsDirected,
            "Use simvastatin as directed.",
            E::Weak,
        ),
    ),
    (
        Drug::Azathioprine,
        Phenotype::Poor,
        rule(
            L::Toxic,
            S::Critical,
            0.95,
            R::AvoidDrug,
            "Avoid azathioprine or reduce dose by 90%. TPMT PM leads to accumulation of cytotoxic thioguanine nucleotides causing severe myelosuppression.",
            E::Strong,
        ),
    ),
    (
        Drug::Azathioprine,
        Phenotype::Intermediate,
        rule(
            L::AdjustDosage,
            S::High,
            0.9,
            R::AdjustDose,
            "Reduce azathioprine dose by 30-70%. Monitor CBC weekly for first 8 weeks.",
            E::Strong,
        ),
    ),
    (
        Drug::Azathioprine,
        Phenotype::Normal,
        rule(
            L::Safe,
            S::None,
            0.9,
            R::UseAsDirected,
            "Use azathioprine as directed with standard monitoring.",
            E::Strong,
        ),
    ),
    (
        Drug::Azathioprine,
        Phenotype::Rapid,
        rule(
            L::Safe,
            S::None,
            0.7,
            R::UseAsDirected,
            "Use azathioprine as directed.",
            E::Weak,
        ),
    ),
    (
        Drug::Azathioprine,
        Phenotype::UltraRapid,
        rule(
            L::Ineffective,
            S::Moderate,
            0.7,
            R::AdjustDose,
            "May require higher doses. Monitor therapeutic response.",
            E::Weak,
        ),
    ),
    (
        Drug::Fluorouracil,
        Phenotype::Poor,
        rule(
            L::Toxic,
            S::Critical,
            0.95,
            R::AvoidDrug,
            "Avoid fluorouracil. DPYD PM leads to severely impaired drug clearance and life-threatening toxicity (mucositis, myelosuppression, neurotoxicity).",
            E::Strong,
        ),
    ),
    (
        Drug::Fluorouracil,
        Phenotype::Intermediate,
        rule(
            L::Toxic,
            S::High,
            0.9,
            R::AdjustDose,
            "Reduce fluorouracil dose by at least 50%. Monitor closely for toxicity signs.",
            E::Strong,
        ),
    ),
    (
        Drug::Fluorouracil,
        Phenotype::Normal,
        rule(
            L::Safe,
            S::None,
            0.9,
            R::UseAsDirected,
            "Use fluorouracil as directed per oncology guidelines.",
            E::Strong,
        ),
    ),
    (
        Drug::Fluorouracil,
        Phenotype::Rapid,
        rule(
            L::Safe,
            S::None,
            0.7,
            R::UseAsDirected,
            "Use fluorouracil as directed.",
            E::Weak,
        ),
    ),
    (
        Drug::Fluorouracil,
        Phenotype::UltraRapid,
        rule(
            L::Safe,
            S::None,
            0.65,
            R::UseAsDirected,
            "Use fluorouracil as directed. Monitor for reduced efficacy.",
            E::Weak,
        ),
    ),
];

/// Mapping for a drug/phenotype pair, or the shared unknown fallback.
pub fn risk_mapping(drug: Option<Drug>, phenotype: Phenotype) -> &'static RiskMapping {
    let Some(drug) = drug else {
        return &UNKNOWN_RISK;
    };
    if phenotype == Phenotype::Unknown {
        return &UNKNOWN_RISK;
    }
    RISK_RULES
        .iter()
        .find(|(d, p, _)| *d == drug && *p == phenotype)
        .map(|(_, _, mapping)| mapping)
        .unwrap_or(&UNKNOWN_RISK)
}
