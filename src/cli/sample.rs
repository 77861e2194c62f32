use clap::Subcommand;
use serde::Serialize;

use crate::render::json::to_pretty;
use crate::render::markdown::samples_markdown;
use crate::utils::samples::{list_samples, sample_content};

#[derive(Subcommand, Debug)]
pub enum SampleCommand {
    /// List the bundled sample VCF files
    List,
    /// Print a bundled sample VCF file
    Show {
        /// Sample name (e.g. normal, poor, intermediate, ultrarapid, mixed)
        name: String,
    },
}

#[derive(Serialize)]
struct SampleFile<'a> {
    name: &'a str,
    content: String,
}

pub fn run(command: SampleCommand, json_output: bool) -> anyhow::Result<String> {
    match command {
        SampleCommand::List => {
            if json_output {
                Ok(to_pretty(&list_samples())?)
            } else {
                Ok(samples_markdown(list_samples())?)
            }
        }
        SampleCommand::Show { name } => {
            let content = sample_content(&name)?;
            if json_output {
                Ok(to_pretty(&SampleFile {
                    name: name.trim(),
                    content,
                })?)
            } else {
                Ok(content.trim_end().to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PgxError;

    #[test]
    fn list_renders_all_samples_as_json() {
        let json = run(SampleCommand::List, true).expect("list");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value.as_array().map(Vec::len), Some(5));
    }

    #[test]
    fn show_prints_raw_vcf() {
        let out = run(
            SampleCommand::Show {
                name: "Mixed".into(),
            },
            false,
        )
        .expect("show");
        assert!(out.starts_with("##fileformat=VCFv4.2"));
        assert!(out.contains("GENE=CYP2D6"));
    }

    #[test]
    fn show_unknown_sample_is_not_found() {
        let err = run(
            SampleCommand::Show {
                name: "exotic".into(),
            },
            false,
        )
        .expect_err("unknown sample");
        assert!(matches!(
            err.downcast_ref::<PgxError>(),
            Some(PgxError::NotFound { .. })
        ));
    }
}
