//! Explanation step: optional gateway call with a deterministic local fallback.

use std::time::Duration;

use tracing::{debug, warn};

use crate::entities::assessment::{AssessmentResult, Explanation};
use crate::sources::explain::{DrugExplanation, ExplanationProvider};

pub(crate) const DEFAULT_EXPLAIN_TIMEOUT: Duration = Duration::from_secs(45);
const EXPLAIN_TIMEOUT_ENV: &str = "PGXRISK_EXPLAIN_TIMEOUT_SECS";

/// Deadline for the whole explanation call, from `PGXRISK_EXPLAIN_TIMEOUT_SECS`.
pub(crate) fn explain_timeout() -> Duration {
    parse_timeout_secs(crate::sources::env_value(EXPLAIN_TIMEOUT_ENV).as_deref())
}

fn parse_timeout_secs(raw: Option<&str>) -> Duration {
    let Some(raw) = raw else {
        return DEFAULT_EXPLAIN_TIMEOUT;
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Duration::from_secs(secs),
        _ => {
            warn!(value = raw, "Ignoring invalid {EXPLAIN_TIMEOUT_ENV}");
            DEFAULT_EXPLAIN_TIMEOUT
        }
    }
}

fn fallback_citations(result: &AssessmentResult) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for variant in &result.pharmacogenomic_profile.detected_variants {
        if !variant.rsid.is_empty() && !out.contains(&variant.rsid) {
            out.push(variant.rsid.clone());
        }
    }
    out
}

/// Builds an explanation purely from fields already present on the result.
pub fn fallback_explanation(result: &AssessmentResult) -> Explanation {
    let profile = &result.pharmacogenomic_profile;
    let gene = &profile.primary_gene;
    let diplotype = &profile.diplotype;
    let phenotype = profile.phenotype;
    let drug = &result.drug;

    Explanation {
        summary: format!(
            "Based on the patient's {gene} {diplotype} genotype ({phenotype} phenotype), the risk assessment for {drug} is: {}.",
            result.risk_assessment.risk_label
        ),
        mechanism: format!(
            "The {gene} enzyme is involved in the metabolism of {drug}. The {diplotype} diplotype results in a {phenotype} metabolizer phenotype, which can alter drug efficacy and safety."
        ),
        clinical_impact: result.clinical_recommendation.recommended_action.clone(),
        variant_citations: fallback_citations(result),
    }
}

pub fn with_fallback_explanations(results: Vec<AssessmentResult>) -> Vec<AssessmentResult> {
    results
        .into_iter()
        .map(|result| {
            let explanation = fallback_explanation(&result);
            result.with_explanation(explanation)
        })
        .collect()
}

/// Replaces each result's explanation with the gateway entry for the same drug.
///
/// Unmatched or empty entries get the local fallback. Empty citations keep the fallback citations.
pub fn merge_explanations(
    results: Vec<AssessmentResult>,
    explanations: Vec<DrugExplanation>,
) -> Vec<AssessmentResult> {
    results
        .into_iter()
        .map(|result| {
            let fallback = fallback_explanation(&result);
            let matched = explanations
                .iter()
                .find(|entry| entry.drug.trim().eq_ignore_ascii_case(&result.drug))
                .map(|entry| entry.explanation.clone())
                .filter(|explanation| !explanation.is_empty());

            let explanation = match matched {
                Some(mut explanation) => {
                    explanation
                        .variant_citations
                        .retain(|citation| !citation.trim().is_empty());
                    if explanation.variant_citations.is_empty() {
                        explanation.variant_citations = fallback.variant_citations;
                    }
                    explanation
                }
                None => {
                    debug!(drug = %result.drug, "No gateway explanation for drug, using fallback");
                    fallback
                }
            };
            result.with_explanation(explanation)
        })
        .collect()
}

/// Runs the provider under `timeout`. Any failure leaves every result with a local explanation.
pub async fn explain_results(
    provider: Option<&dyn ExplanationProvider>,
    results: Vec<AssessmentResult>,
    timeout: Duration,
) -> Vec<AssessmentResult> {
    let Some(provider) = provider else {
        return with_fallback_explanations(results);
    };
    if results.is_empty() {
        return results;
    }

    match tokio::time::timeout(timeout, provider.explain(&results)).await {
        Ok(Ok(explanations)) => merge_explanations(results, explanations),
        Ok(Err(err)) => {
            warn!(error = %err, "Explanation request failed, using local explanations");
            with_fallback_explanations(results)
        }
        Err(_) => {
            warn!(
                timeout_secs = timeout.as_secs(),
                "Explanation request timed out, using local explanations"
            );
            with_fallback_explanations(results)
        }
    }
}
