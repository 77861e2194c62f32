//! Internal utility helpers for input files and bundled samples.

pub(crate) mod file;
pub(crate) mod samples;
