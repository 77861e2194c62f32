use std::sync::OnceLock;

use minijinja::{Environment, context};

use crate::entities::assessment::AssessmentResult;
use crate::entities::drug::SupportedDrug;
use crate::error::PgxError;
use crate::pgx::phenotype::{Phenotype, activity_score, infer_phenotype};
use crate::utils::samples::SampleInfo;

static ENV: OnceLock<Environment<'static>> = OnceLock::new();

fn env() -> Result<&'static Environment<'static>, PgxError> {
    if let Some(env) = ENV.get() {
        return Ok(env);
    }

    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_filter("confidence", |v: f64| -> String { format!("{v:.2}") });
    env.add_filter("score", |v: f64| -> String { format!("{v:.1}") });
    env.add_filter("yesno", |v: bool| -> &'static str { if v { "yes" } else { "no" } });
    env.add_filter("humanize", |s: String| -> String { s.replace('_', " ") });
    env.add_filter("phenotype_label", |code: String| -> &'static str {
        Phenotype::from_code(&code).label()
    });

    env.add_template(
        "assessment.md.j2",
        include_str!("../../templates/assessment.md.j2"),
    )?;
    env.add_template("drugs.md.j2", include_str!("../../templates/drugs.md.j2"))?;
    env.add_template("samples.md.j2", include_str!("../../templates/samples.md.j2"))?;
    env.add_template(
        "phenotype.md.j2",
        include_str!("../../templates/phenotype.md.j2"),
    )?;

    let _ = ENV.set(env);
    Ok(ENV
        .get()
        .expect("ENV should be initialized by the time this is reached"))
}

pub fn assessment_markdown(
    patient_id: &str,
    parse_errors: &[String],
    results: &[AssessmentResult],
) -> Result<String, PgxError> {
    let tmpl = env()?.get_template("assessment.md.j2")?;
    Ok(tmpl.render(context! {
        patient_id => patient_id,
        parse_errors => parse_errors,
        results => results,
    })?)
}

pub fn drugs_markdown(drugs: &[SupportedDrug]) -> Result<String, PgxError> {
    let tmpl = env()?.get_template("drugs.md.j2")?;
    Ok(tmpl.render(context! { drugs => drugs })?)
}

pub fn samples_markdown(samples: &[SampleInfo]) -> Result<String, PgxError> {
    let tmpl = env()?.get_template("samples.md.j2")?;
    Ok(tmpl.render(context! { samples => samples })?)
}

pub fn phenotype_markdown(diplotype: &str) -> Result<String, PgxError> {
    let tmpl = env()?.get_template("phenotype.md.j2")?;
    let phenotype = infer_phenotype(diplotype);
    Ok(tmpl.render(context! {
        diplotype => diplotype.trim(),
        code => phenotype.code(),
        label => phenotype.label(),
        activity_score => activity_score(diplotype),
    })?)
}
