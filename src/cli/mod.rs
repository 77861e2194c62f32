//! Command-line surface for the `pgxrisk` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::entities::assessment::{AssessmentResult, assess_all};
use crate::entities::drug::{canonical_drug_name, supported_drugs};
use crate::entities::explanation::{explain_results, explain_timeout};
use crate::error::PgxError;
use crate::pgx::phenotype::{activity_score, infer_phenotype};
use crate::render::json::to_pretty;
use crate::render::markdown::{assessment_markdown, drugs_markdown, phenotype_markdown};
use crate::sources::explain::{ExplainClient, ExplanationProvider};
use crate::transform::vcf::parse_vcf;
use crate::utils::file::read_vcf_file;
use crate::utils::samples::sample_content;

pub mod sample;

const PATIENT_ID_PREFIX: &str = "PATIENT_";

#[derive(Parser, Debug)]
#[command(
    name = "pgxrisk",
    version,
    about = "Pharmacogenomic risk assessment from star-allele annotated VCF files"
)]
pub struct Cli {
    /// Output JSON instead of Markdown
    #[arg(short = 'j', long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Assess drug risk for a patient VCF file
    Analyze {
        /// Path to a .vcf file (max 5 MB)
        #[arg(required_unless_present = "sample", conflicts_with = "sample")]
        file: Option<PathBuf>,

        /// Analyze a bundled sample instead of a file
        #[arg(long)]
        sample: Option<String>,

        /// Drug to assess (repeatable or comma-separated)
        #[arg(short = 'd', long = "drug", value_delimiter = ',', required = true)]
        drugs: Vec<String>,

        /// Patient identifier (default: generated from the current time)
        #[arg(long)]
        patient_id: Option<String>,

        /// Skip the explanation step
        #[arg(long)]
        no_explain: bool,
    },
    /// List supported drugs and their genes
    Drugs,
    /// Infer the metabolizer phenotype for a diplotype (e.g. "*1/*4")
    Phenotype {
        diplotype: String,
    },
    /// Bundled sample VCF files
    Sample {
        #[command(subcommand)]
        cmd: sample::SampleCommand,
    },
}

#[derive(Debug, Serialize)]
struct AnalysisReport<'a> {
    parse_errors: &'a [String],
    results: &'a [AssessmentResult],
}

#[derive(Debug, Serialize)]
struct PhenotypeReport<'a> {
    diplotype: &'a str,
    phenotype: &'static str,
    label: &'static str,
    activity_score: Option<f64>,
}

fn to_base36_upper(mut value: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

fn default_patient_id() -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let millis = u128::try_from(millis).unwrap_or_default();
    format!("{PATIENT_ID_PREFIX}{}", to_base36_upper(millis))
}

/// Canonical names in request order, blanks and repeats dropped.
fn requested_drugs(raw: &[String]) -> Result<Vec<String>, PgxError> {
    let mut out: Vec<String> = Vec::new();
    for name in raw {
        let name = canonical_drug_name(name);
        if name.is_empty() || out.contains(&name) {
            continue;
        }
        out.push(name);
    }
    if out.is_empty() {
        return Err(PgxError::InvalidArgument(
            "At least one drug is required. Try: pgxrisk drugs".into(),
        ));
    }
    Ok(out)
}

/// A client that cannot be built degrades to local explanations.
fn optional_explain_client(
    client: Result<Option<ExplainClient>, PgxError>,
) -> Option<ExplainClient> {
    client.unwrap_or_else(|err| {
        warn!(error = %err, "Explanation client unavailable, using local explanations");
        None
    })
}

async fn load_input(
    file: Option<PathBuf>,
    sample: Option<String>,
) -> Result<(String, String), PgxError> {
    match (file, sample) {
        (Some(path), None) => {
            let content = read_vcf_file(&path).await?;
            Ok((path.display().to_string(), content))
        }
        (None, Some(name)) => {
            let content = sample_content(&name)?;
            Ok((format!("sample '{}'", name.trim()), content))
        }
        _ => Err(PgxError::InvalidArgument(
            "Provide either a VCF file path or --sample <NAME>".into(),
        )),
    }
}

async fn run_analyze(
    file: Option<PathBuf>,
    sample: Option<String>,
    drugs: Vec<String>,
    patient_id: Option<String>,
    no_explain: bool,
    json_output: bool,
) -> anyhow::Result<String> {
    let drugs = requested_drugs(&drugs)?;
    let (label, content) = load_input(file, sample).await?;

    let parsed = parse_vcf(&content);
    if !parsed.is_valid && !parsed.is_partially_usable() {
        let details = if parsed.errors.is_empty() {
            "no variant records found".to_string()
        } else {
            parsed.errors.join("; ")
        };
        return Err(
            PgxError::InvalidArgument(format!("{label} is not a usable VCF: {details}")).into(),
        );
    }
    if !parsed.errors.is_empty() {
        warn!(
            source = %label,
            errors = parsed.errors.len(),
            records = parsed.records.len(),
            "Continuing with a partially usable VCF"
        );
    }

    let patient_id = patient_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(default_patient_id);
    debug!(patient_id = %patient_id, drugs = drugs.len(), "Running assessment");

    let mut results = assess_all(&parsed, &drugs, &patient_id);
    if !no_explain {
        let client = optional_explain_client(ExplainClient::from_env());
        let provider = client.as_ref().map(|c| c as &dyn ExplanationProvider);
        results = explain_results(provider, results, explain_timeout()).await;
    }

    if json_output {
        Ok(to_pretty(&AnalysisReport {
            parse_errors: &parsed.errors,
            results: &results,
        })?)
    } else {
        Ok(assessment_markdown(&patient_id, &parsed.errors, &results)?)
    }
}

fn run_phenotype(diplotype: &str, json_output: bool) -> anyhow::Result<String> {
    if diplotype.trim().is_empty() {
        return Err(
            PgxError::InvalidArgument("Diplotype is required (e.g. \"*1/*4\")".into()).into(),
        );
    }
    if json_output {
        let phenotype = infer_phenotype(diplotype);
        Ok(to_pretty(&PhenotypeReport {
            diplotype: diplotype.trim(),
            phenotype: phenotype.code(),
            label: phenotype.label(),
            activity_score: activity_score(diplotype),
        })?)
    } else {
        Ok(phenotype_markdown(diplotype)?)
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<String> {
    let json_output = cli.json;
    match cli.command {
        Commands::Analyze {
            file,
            sample,
            drugs,
            patient_id,
            no_explain,
        } => run_analyze(file, sample, drugs, patient_id, no_explain, json_output).await,
        Commands::Drugs => {
            let drugs = supported_drugs();
            if json_output {
                Ok(to_pretty(&drugs)?)
            } else {
                Ok(drugs_markdown(&drugs)?)
            }
        }
        Commands::Phenotype { diplotype } => run_phenotype(&diplotype, json_output),
        Commands::Sample { cmd } => sample::run(cmd, json_output),
    }
}
