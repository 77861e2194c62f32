//! Genotype interpretation: allele tables, phenotype inference, and the drug risk rule table.

pub(crate) mod alleles;
pub(crate) mod phenotype;
pub(crate) mod rules;
