use std::borrow::Cow;

use rust_embed::RustEmbed;

use crate::error::PgxError;

#[derive(RustEmbed)]
#[folder = "samples/"]
struct EmbeddedSamples;

#[derive(Debug, Clone, serde::Serialize)]
pub struct SampleInfo {
    pub name: &'static str,
    pub title: &'static str,
    pub expected: &'static str,
}

const SAMPLES: &[SampleInfo] = &[
    SampleInfo {
        name: "normal",
        title: "Normal Metabolizer",
        expected: "All genes *1/*1. Every drug: Safe.",
    },
    SampleInfo {
        name: "poor",
        title: "Poor Metabolizer",
        expected: "Homozygous loss-of-function. Codeine, Warfarin, Simvastatin, Azathioprine, Fluorouracil: Toxic; Clopidogrel: Ineffective.",
    },
    SampleInfo {
        name: "intermediate",
        title: "Intermediate Metabolizer",
        expected: "Heterozygous *1/*loss. Codeine: Ineffective; Warfarin: Adjust Dosage; Clopidogrel: Ineffective.",
    },
    SampleInfo {
        name: "ultrarapid",
        title: "Ultra-rapid Metabolizer",
        expected: "Gain-of-function *17/*17 for CYP2D6, CYP2C9, CYP2C19. Codeine: Toxic (critical).",
    },
    SampleInfo {
        name: "mixed",
        title: "Mixed Profile",
        expected: "Per-gene differences. Codeine: Safe; Warfarin: Toxic.",
    },
];

pub fn list_samples() -> &'static [SampleInfo] {
    SAMPLES
}

/// Returns the bundled VCF text for `name` (with or without the `.vcf` suffix).
pub fn sample_content(name: &str) -> Result<String, PgxError> {
    let key = name.trim().to_ascii_lowercase();
    let key = key.strip_suffix(".vcf").unwrap_or(&key);
    let Some(file) = EmbeddedSamples::get(&format!("{key}.vcf")) else {
        return Err(PgxError::NotFound {
            entity: "sample".into(),
            id: name.to_string(),
            suggestion: "Try: pgxrisk sample list".into(),
        });
    };

    let bytes: Cow<'static, [u8]> = file.data;
    String::from_utf8(bytes.into_owned())
        .map_err(|_| PgxError::InvalidArgument("Embedded sample file is not valid UTF-8".into()))
}
