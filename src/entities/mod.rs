//! Domain records and the per-drug assessment workflow used by the CLI.

pub(crate) mod assessment;
pub(crate) mod drug;
pub(crate) mod explanation;
pub(crate) mod gene;
pub(crate) mod variant;
