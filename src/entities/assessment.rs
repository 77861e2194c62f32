use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;

use crate::entities::drug::{Drug, canonical_drug_name};
use crate::entities::gene::{DetectedVariant, GeneEvidence, GeneEvidenceMap};
use crate::entities::variant::ParsedVcf;
use crate::pgx::phenotype::{Phenotype, infer_phenotype, resolve_diplotype};
use crate::pgx::rules::{
    EvidenceLevel, RecommendationType, RiskLabel, Severity, risk_mapping,
};
use crate::transform::evidence::extract_gene_evidence;

pub const GUIDELINE_SOURCE: &str = "CPIC";
pub const UNKNOWN_GENE: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationConfidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_label: RiskLabel,
    pub confidence_score: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PharmacogenomicProfile {
    pub primary_gene: String,
    pub diplotype: String,
    pub phenotype: Phenotype,
    pub detected_variants: Vec<DetectedVariant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalRecommendation {
    pub recommendation_type: RecommendationType,
    pub recommended_action: String,
    pub guideline_source: String,
    pub evidence_level: EvidenceLevel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub summary: String,
    pub mechanism: String,
    pub clinical_impact: String,
    #[serde(default)]
    pub variant_citations: Vec<String>,
}

impl Explanation {
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.mechanism.is_empty() && self.clinical_impact.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub vcf_parsing_success: bool,
    pub variants_detected: bool,
    pub gene_coverage_complete: bool,
    pub annotation_confidence: AnnotationConfidence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub patient_id: String,
    pub drug: String,
    pub timestamp: String,
    pub risk_assessment: RiskAssessment,
    pub pharmacogenomic_profile: PharmacogenomicProfile,
    pub clinical_recommendation: ClinicalRecommendation,
    pub llm_generated_explanation: Explanation,
    pub quality_metrics: QualityMetrics,
}

impl AssessmentResult {
    /// Returns a copy carrying `explanation`; nothing else changes.
    pub fn with_explanation(self, explanation: Explanation) -> Self {
        Self {
            llm_generated_explanation: explanation,
            ..self
        }
    }
}

fn annotation_confidence(evidence: Option<&GeneEvidence>) -> AnnotationConfidence {
    match evidence {
        Some(e) if e.star_alleles.len() >= 2 && !e.rsids.is_empty() => AnnotationConfidence::High,
        Some(e) if !e.star_alleles.is_empty() => AnnotationConfidence::Medium,
        _ => AnnotationConfidence::Low,
    }
}

fn round_confidence(value: f64) -> f64 {
    ((value * 100.0).round() / 100.0).clamp(0.0, 1.0)
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| OffsetDateTime::now_utc().unix_timestamp().to_string())
}

fn compose(
    drug_name: &str,
    evidence: &GeneEvidenceMap,
    patient_id: &str,
    parse_success: bool,
) -> AssessmentResult {
    let drug_name = canonical_drug_name(drug_name);
    let drug = Drug::from_name(&drug_name);
    let gene = drug.map(Drug::gene);
    let gene_evidence = gene.and_then(|g| evidence.get(&g));

    let diplotype = resolve_diplotype(gene_evidence);
    let phenotype = infer_phenotype(&diplotype);
    let mapping = risk_mapping(drug, phenotype);
    debug!(
        drug = %drug_name,
        diplotype = %diplotype,
        phenotype = %phenotype,
        risk = %mapping.risk,
        "Assessed drug"
    );

    let variants = gene_evidence.map(|e| e.variants.clone()).unwrap_or_default();
    AssessmentResult {
        patient_id: patient_id.to_string(),
        drug: drug_name,
        timestamp: now_rfc3339(),
        risk_assessment: RiskAssessment {
            risk_label: mapping.risk,
            confidence_score: round_confidence(mapping.confidence),
            severity: mapping.severity,
        },
        quality_metrics: QualityMetrics {
            vcf_parsing_success: parse_success,
            variants_detected: !variants.is_empty(),
            gene_coverage_complete: gene_evidence.is_some_and(|e| e.star_alleles.len() >= 2),
            annotation_confidence: annotation_confidence(gene_evidence),
        },
        pharmacogenomic_profile: PharmacogenomicProfile {
            primary_gene: gene
                .map(|g| g.symbol().to_string())
                .unwrap_or_else(|| UNKNOWN_GENE.to_string()),
            diplotype,
            phenotype,
            detected_variants: variants,
        },
        clinical_recommendation: ClinicalRecommendation {
            recommendation_type: mapping.recommendation,
            recommended_action: mapping.action.to_string(),
            guideline_source: GUIDELINE_SOURCE.to_string(),
            evidence_level: mapping.evidence,
        },
        llm_generated_explanation: Explanation::default(),
    }
}

/// Composes the result for one drug. Unsupported drugs degrade to the unknown path.
pub fn assess_drug(drug_name: &str, evidence: &GeneEvidenceMap, patient_id: &str) -> AssessmentResult {
    compose(drug_name, evidence, patient_id, true)
}

/// Runs aggregation once and composes one result per requested drug, in request order.
pub fn assess_all<S: AsRef<str>>(
    parsed: &ParsedVcf,
    drugs: &[S],
    patient_id: &str,
) -> Vec<AssessmentResult> {
    let evidence = extract_gene_evidence(parsed);
    drugs
        .iter()
        .map(|drug| compose(drug.as_ref(), &evidence, patient_id, parsed.is_valid))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::gene::Gene;
    use crate::transform::vcf::parse_vcf;
    use crate::utils::samples::sample_content;

    fn evidence_for(name: &str) -> GeneEvidenceMap {
        let content = sample_content(name).expect("bundled sample");
        extract_gene_evidence(&parse_vcf(&content))
    }

    fn assess(sample: &str, drug: &str) -> AssessmentResult {
        assess_drug(drug, &evidence_for(sample), "TEST_001")
    }

    #[test]
    fn normal_sample_is_safe_for_every_drug() {
        let evidence = evidence_for("normal");
        for drug in Drug::ALL {
            let result = assess_drug(drug.name(), &evidence, "TEST_001");
            assert_eq!(result.risk_assessment.risk_label, RiskLabel::Safe, "{drug}");
            assert_eq!(result.pharmacogenomic_profile.phenotype, Phenotype::Normal);
            assert_eq!(result.pharmacogenomic_profile.diplotype, "*1/*1");
            assert!(result.risk_assessment.confidence_score > 0.8);
        }
    }

    #[test]
    fn poor_sample_codeine_is_critical_toxic() {
        let result = assess("poor", "CODEINE");
        assert_eq!(result.risk_assessment.risk_label, RiskLabel::Toxic);
        assert_eq!(result.risk_assessment.severity, Severity::Critical);
        assert_eq!(result.risk_assessment.confidence_score, 0.95);
        assert_eq!(result.pharmacogenomic_profile.diplotype, "*4/*4");
        assert_eq!(result.pharmacogenomic_profile.primary_gene, "CYP2D6");
        assert!(result.quality_metrics.variants_detected);
        assert!(!result.quality_metrics.gene_coverage_complete);
        assert_eq!(
            result.quality_metrics.annotation_confidence,
            AnnotationConfidence::Medium
        );
    }

    #[test]
    fn poor_sample_other_drugs() {
        assert_eq!(
            assess("poor", "WARFARIN").risk_assessment.risk_label,
            RiskLabel::Toxic
        );
        assert_eq!(
            assess("poor", "CLOPIDOGREL").risk_assessment.risk_label,
            RiskLabel::Ineffective
        );
        let fu = assess("poor", "FLUOROURACIL");
        assert_eq!(fu.risk_assessment.risk_label, RiskLabel::Toxic);
        assert_eq!(fu.risk_assessment.severity, Severity::Critical);
    }

    #[test]
    fn intermediate_sample_has_complete_high_confidence_coverage() {
        let codeine = assess("intermediate", "CODEINE");
        assert_eq!(codeine.risk_assessment.risk_label, RiskLabel::Ineffective);
        assert_eq!(codeine.pharmacogenomic_profile.diplotype, "*1/*4");
        assert!(codeine.quality_metrics.gene_coverage_complete);
        assert_eq!(
            codeine.quality_metrics.annotation_confidence,
            AnnotationConfidence::High
        );

        let warfarin = assess("intermediate", "WARFARIN");
        assert_eq!(warfarin.risk_assessment.risk_label, RiskLabel::AdjustDosage);
    }

    #[test]
    fn ultrarapid_codeine_is_critical_toxic() {
        let result = assess("ultrarapid", "codeine");
        assert_eq!(result.pharmacogenomic_profile.phenotype, Phenotype::UltraRapid);
        assert_eq!(result.risk_assessment.risk_label, RiskLabel::Toxic);
        assert_eq!(result.risk_assessment.severity, Severity::Critical);
    }

    #[test]
    fn mixed_sample_never_reports_zero_confidence() {
        let evidence = evidence_for("mixed");
        assert_eq!(
            assess_drug("CODEINE", &evidence, "P").risk_assessment.risk_label,
            RiskLabel::Safe
        );
        assert_eq!(
            assess_drug("WARFARIN", &evidence, "P").risk_assessment.risk_label,
            RiskLabel::Toxic
        );
        for drug in Drug::ALL {
            let result = assess_drug(drug.name(), &evidence, "P");
            assert!(result.risk_assessment.confidence_score > 0.0, "{drug}");
        }
    }

    #[test]
    fn mixed_case_drug_matches_upper_case() {
        let evidence = evidence_for("mixed");
        let lower = assess_drug("  cLoPiDoGrEl ", &evidence, "P");
        let upper = assess_drug("CLOPIDOGREL", &evidence, "P");
        assert_eq!(lower.drug, "CLOPIDOGREL");
        assert_eq!(lower.risk_assessment, upper.risk_assessment);
        assert_eq!(lower.pharmacogenomic_profile, upper.pharmacogenomic_profile);
        assert_eq!(lower.clinical_recommendation, upper.clinical_recommendation);
    }

    #[test]
    fn unsupported_drug_degrades_to_unknown() {
        let result = assess("normal", "Ibuprofen");
        assert_eq!(result.drug, "IBUPROFEN");
        assert_eq!(result.pharmacogenomic_profile.primary_gene, UNKNOWN_GENE);
        assert_eq!(result.pharmacogenomic_profile.diplotype, "*?/*?");
        assert_eq!(result.pharmacogenomic_profile.phenotype, Phenotype::Unknown);
        assert_eq!(result.risk_assessment.risk_label, RiskLabel::Unknown);
        assert_eq!(result.risk_assessment.confidence_score, 0.0);
        assert!(!result.quality_metrics.variants_detected);
        assert_eq!(
            result.quality_metrics.annotation_confidence,
            AnnotationConfidence::Low
        );
    }

    #[test]
    fn missing_gene_evidence_uses_fallback() {
        let mut evidence = evidence_for("normal");
        evidence.remove(&Gene::Dpyd);
        let result = assess_drug("FLUOROURACIL", &evidence, "P");
        assert_eq!(result.pharmacogenomic_profile.primary_gene, "DPYD");
        assert_eq!(result.risk_assessment.risk_label, RiskLabel::Unknown);
        assert_eq!(result.risk_assessment.severity, Severity::Moderate);
        assert_eq!(
            result.clinical_recommendation.recommendation_type,
            RecommendationType::UseAsDirected
        );
    }

    #[test]
    fn unrecognized_gene_symbol_does_not_affect_results() {
        let base = sample_content("normal").expect("sample");
        let extra = format!(
            "{}\nchr17\t43044295\trs80357906\tG\tA\t100\tPASS\tGENE=BRCA1;STAR=*4;RS=rs80357906\tGT\t1/1\n",
            base.trim_end()
        );
        let with_extra = extract_gene_evidence(&parse_vcf(&extra));
        let without = evidence_for("normal");
        assert_eq!(with_extra, without);
        for drug in Drug::ALL {
            let a = assess_drug(drug.name(), &with_extra, "P");
            let b = assess_drug(drug.name(), &without, "P");
            assert_eq!(a.risk_assessment, b.risk_assessment);
        }
    }

    #[test]
    fn assess_all_is_idempotent_apart_from_timestamp() {
        let parsed = parse_vcf(&sample_content("mixed").expect("sample"));
        let drugs = ["codeine", "WARFARIN", "Clopidogrel"];
        let first = assess_all(&parsed, &drugs, "P");
        let second = assess_all(&parsed, &drugs, "P");
        assert_eq!(first.len(), 3);
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.drug, b.drug);
            assert_eq!(a.risk_assessment, b.risk_assessment);
            assert_eq!(a.pharmacogenomic_profile, b.pharmacogenomic_profile);
            assert!(a.quality_metrics.vcf_parsing_success);
        }
    }

    #[test]
    fn assess_all_reports_parse_failure() {
        let parsed = parse_vcf("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\nchr1\t1\trs1\tA\tT\t.\tPASS\tGENE=CYP2D6;STAR=*1");
        let results = assess_all(&parsed, &["CODEINE"], "P");
        assert!(!results[0].quality_metrics.vcf_parsing_success);
        assert_eq!(results[0].pharmacogenomic_profile.diplotype, "*1/*1");
    }

    #[test]
    fn explanation_replacement_keeps_classification() {
        let result = assess("normal", "CODEINE");
        assert!(result.llm_generated_explanation.is_empty());
        let updated = result.clone().with_explanation(Explanation {
            summary: "s".into(),
            mechanism: "m".into(),
            clinical_impact: "c".into(),
            variant_citations: vec!["rs16947".into()],
        });
        assert_eq!(updated.risk_assessment, result.risk_assessment);
        assert_eq!(updated.timestamp, result.timestamp);
        assert_eq!(updated.llm_generated_explanation.summary, "s");
    }

    #[test]
    fn result_serializes_expected_shape() {
        let json = serde_json::to_value(assess("poor", "CODEINE")).expect("json");
        assert_eq!(json["drug"], "CODEINE");
        assert_eq!(json["risk_assessment"]["risk_label"], "Toxic");
        assert_eq!(json["risk_assessment"]["severity"], "critical");
        assert_eq!(json["pharmacogenomic_profile"]["phenotype"], "PM");
        assert_eq!(json["clinical_recommendation"]["guideline_source"], "CPIC");
        assert_eq!(json["clinical_recommendation"]["recommendation_type"], "avoid_drug");
        assert_eq!(
            json["pharmacogenomic_profile"]["detected_variants"][0]["zygosity"],
            "homozygous"
        );
        assert_eq!(json["quality_metrics"]["annotation_confidence"], "medium");
        assert!(json["timestamp"].as_str().is_some_and(|t| t.contains('T')));
    }
}
