//! Transforms from raw VCF text into typed records and per-gene evidence.

pub(crate) mod evidence;
pub(crate) mod vcf;
