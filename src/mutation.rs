use serde::Deserialize;

use crate::error::ContextError;
use crate::Base;

/// A single nucleotide variant as it appears in a MAF-like mutation table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PointMutation {
    #[serde(rename = "Chromosome")]
    pub chromosome: String,
    #[serde(rename = "Start_Position")]
    pub position: usize, // 1-based
    #[serde(rename = "Reference_Allele")]
    pub reference: String,
    #[serde(rename = "Tumor_Seq_Allele2")]
    pub alternative: String,
}

impl PointMutation {
    pub fn new(chromosome: &str, position: usize, reference: char, alternative: char) -> Self {
        Self {
            chromosome: chromosome.to_string(),
            position,
            reference: reference.to_string(),
            alternative: alternative.to_string(),
        }
    }

    pub fn reference_base(&self) -> Result<Base, ContextError> {
        parse_allele(&self.reference)
    }

    pub fn alternative_base(&self) -> Result<Base, ContextError> {
        parse_allele(&self.alternative)
    }
}

/// Alleles of a point mutation need to be exactly one of A, C, G or T
fn parse_allele(allele: &str) -> Result<Base, ContextError> {
    let mut chars = allele.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Base::parse(c),
        _ => Err(ContextError::UnknownBase(allele.to_string())),
    }
}
