use tracing::debug;

use crate::entities::gene::{
    DetectedVariant, Gene, GeneEvidence, GeneEvidenceMap, VariantEffect, Zygosity,
};
use crate::entities::variant::{ParsedVcf, VariantRecord};
use crate::pgx::alleles::{UNKNOWN_ALLELE, allele_effect};

/// Homozygous only when both called alleles are present, equal, and non-reference.
pub(crate) fn infer_zygosity(genotype: Option<&str>) -> Zygosity {
    let Some(genotype) = genotype else {
        return Zygosity::Heterozygous;
    };
    let alleles: Vec<&str> = genotype.trim().split(['/', '|']).collect();
    match alleles.as_slice() {
        [a, b] if a == b && !a.is_empty() && *a != "." && *a != "0" => Zygosity::Homozygous,
        _ => Zygosity::Heterozygous,
    }
}

pub(crate) fn normalize_rsid(raw: &str) -> String {
    if raw.starts_with("rs") {
        raw.to_string()
    } else {
        format!("rs{raw}")
    }
}

fn detected_variant(record: &VariantRecord) -> DetectedVariant {
    let star = record.star_allele();
    DetectedVariant {
        rsid: normalize_rsid(record.rsid().unwrap_or_default()),
        star_allele: star.unwrap_or(UNKNOWN_ALLELE).to_string(),
        zygosity: infer_zygosity(record.genotype.as_deref()),
        effect: star.map(allele_effect).unwrap_or(VariantEffect::Unknown),
    }
}

/// Folds parsed records into per-gene evidence, ignoring genes outside the supported set.
pub fn extract_gene_evidence(parsed: &ParsedVcf) -> GeneEvidenceMap {
    let mut out = GeneEvidenceMap::new();

    for record in &parsed.records {
        let Some(gene) = record.gene_symbol().as_deref().and_then(Gene::from_symbol) else {
            continue;
        };

        let evidence = out.entry(gene).or_insert_with(|| GeneEvidence::new(gene));
        if let Some(star) = record.star_allele() {
            evidence.record_allele(star);
        }
        if let Some(rsid) = record.rsid() {
            evidence.record_rsid(rsid);
        }
        evidence.record_variant(detected_variant(record));
    }

    debug!(
        genes = out.len(),
        records = parsed.records.len(),
        "Extracted gene evidence"
    );
    out
}
