//! Output formatting (markdown templates and JSON).

pub(crate) mod json;
pub(crate) mod markdown;
