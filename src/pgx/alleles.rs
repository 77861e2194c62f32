use crate::entities::gene::VariantEffect;

pub const REFERENCE_ALLELE: &str = "*1";
/// Stand-in when a record carries no star allele.
pub const UNKNOWN_ALLELE: &str = "*?";

const LOSS_OF_FUNCTION: &[&str] = &["*3", "*4", "*5", "*6", "*7"];
const REDUCED_FUNCTION: &[&str] = &["*2", "*8", "*9", "*10", "*41", "*1B", "*2A"];
const GAIN_OF_FUNCTION: &[&str] = &["*17", "*xN"];

/// Functional effect of a star allele. The reference allele has no effect annotation.
pub fn allele_effect(star: &str) -> VariantEffect {
    let star = star.trim();
    if LOSS_OF_FUNCTION.contains(&star) {
        VariantEffect::LossOfFunction
    } else if REDUCED_FUNCTION.contains(&star) {
        VariantEffect::ReducedFunction
    } else if GAIN_OF_FUNCTION.contains(&star) {
        VariantEffect::GainOfFunction
    } else {
        VariantEffect::Unknown
    }
}

/// Activity value of one allele; `None` for anything outside the table.
pub fn allele_score(star: &str) -> Option<f64> {
    let star = star.trim();
    match allele_effect(star) {
        VariantEffect::LossOfFunction => Some(0.0),
        VariantEffect::ReducedFunction => Some(0.5),
        VariantEffect::GainOfFunction => Some(2.0),
        VariantEffect::Unknown if star == REFERENCE_ALLELE => Some(1.0),
        VariantEffect::Unknown => None,
    }
}
