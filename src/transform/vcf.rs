use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::entities::variant::{ParsedVcf, VariantRecord};

const META_PREFIX: &str = "##";
const COLUMN_HEADER_PREFIX: &str = "#CHROM";
const MIN_COLUMNS: usize = 8;
const SAMPLE_COLUMNS: usize = 10;
const GENOTYPE_KEY: &str = "GT";
const PREVIEW_CHARS: usize = 60;

fn file_format_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^##fileformat=(VCFv?[0-9][0-9A-Za-z.]*)").expect("valid regex")
    })
}

fn preview(line: &str) -> String {
    let mut out: String = line.chars().take(PREVIEW_CHARS).collect();
    out.push_str("...");
    out
}

fn parse_info(raw: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    let raw = raw.trim();
    if raw.is_empty() || raw == "." {
        return out;
    }

    for pair in raw.split(';').filter(|p| !p.is_empty()) {
        match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                out.insert(key.to_ascii_uppercase(), value.to_string());
            }
            _ => {
                out.insert(pair.to_ascii_uppercase(), "true".to_string());
            }
        }
    }
    out
}

fn parse_genotype(format: &str, sample: &str) -> Option<String> {
    let idx = format.split(':').position(|key| key == GENOTYPE_KEY)?;
    sample.split(':').nth(idx).map(str::to_string)
}

fn parse_data_line(line: &str) -> Result<VariantRecord, String> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < MIN_COLUMNS {
        return Err(format!(
            "Malformed line (fewer than {MIN_COLUMNS} fields): {}",
            preview(line)
        ));
    }

    let pos = fields[1].trim().parse::<u64>().map_err(|_| {
        format!(
            "Malformed line (POS '{}' is not a non-negative integer): {}",
            fields[1],
            preview(line)
        )
    })?;

    let genotype = if fields.len() >= SAMPLE_COLUMNS {
        parse_genotype(fields[8], fields[9])
    } else {
        None
    };

    Ok(VariantRecord {
        chrom: fields[0].to_string(),
        pos,
        id: fields[2].to_string(),
        ref_allele: fields[3].to_string(),
        alt_allele: fields[4].to_string(),
        qual: fields[5].to_string(),
        filter: fields[6].to_string(),
        info: parse_info(fields[7]),
        genotype,
    })
}

/// Parses annotated VCF text. Never fails: structural problems land in `errors`.
pub fn parse_vcf(content: &str) -> ParsedVcf {
    let mut parsed = ParsedVcf::default();
    let mut body_started = false;

    let lines = content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty());

    for line in lines {
        if line.starts_with(META_PREFIX) {
            if parsed.file_format.is_none()
                && let Some(caps) = file_format_re().captures(line)
            {
                parsed.file_format = Some(caps[1].to_string());
            }
            parsed.header.push(line.to_string());
            continue;
        }

        if line.starts_with(COLUMN_HEADER_PREFIX) {
            body_started = true;
            continue;
        }

        if !body_started {
            continue;
        }

        match parse_data_line(line) {
            Ok(record) => parsed.records.push(record),
            Err(message) => {
                warn!(error = %message, "Skipping malformed VCF line");
                parsed.errors.push(message);
            }
        }
    }

    if parsed.file_format.is_none() {
        parsed
            .errors
            .push("Missing ##fileformat header. Expected VCF v4.2 format.".to_string());
    }
    if !body_started {
        parsed
            .errors
            .push("Missing #CHROM header line.".to_string());
    }

    parsed.is_valid = parsed.errors.is_empty() && !parsed.records.is_empty();
    debug!(
        records = parsed.records.len(),
        errors = parsed.errors.len(),
        valid = parsed.is_valid,
        "Parsed VCF"
    );
    parsed
}
