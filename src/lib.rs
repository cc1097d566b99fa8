mod annotation;
pub mod context;
mod diversity;
pub mod error;
pub mod genome;
pub mod interval;
mod mutation;
pub mod shape;
pub mod signatures;
pub mod table;

use std::path::Path;

use log::info;

use crate::error::{ContextError, MutshapeError};
pub use crate::annotation::{
    add_contexts, add_contexts_to_table, annotate_mutations, AnnotationSummary, MutationAnnotation,
};
pub use crate::context::{apply_mutation, derive_context, extract_window, TrinucleotideContext};
pub use crate::diversity::{add_shannon_index, shannon_index};
pub use crate::genome::{ReferenceGenome, SequenceSource};
pub use crate::interval::Interval;
pub use crate::mutation::PointMutation;
pub use crate::table::Table;

pub const DEFAULT_FLANK_SIZE: usize = 10;

pub const CHROMOSOME: &str = "Chromosome";
pub const START_POSITION: &str = "Start_Position";
pub const END_POSITION: &str = "End_Position";
pub const REFERENCE_ALLELE: &str = "Reference_Allele";
pub const TUMOR_ALLELE: &str = "Tumor_Seq_Allele2";
pub const VARIANT_TYPE: &str = "Variant_Type";
pub const REF_FLANKING_SEQUENCE: &str = "Ref_Flanking_Sequence";
pub const MUT_FLANKING_SEQUENCE: &str = "Mut_Flanking_Sequence";

/// Drop every row of a mutation table that is not a single nucleotide polymorphism
///
/// The table is rewritten in place. Returns the number of rows that were kept.
pub fn filter_snps<P: AsRef<Path>>(path: P) -> Result<usize, MutshapeError> {
    let path = path.as_ref();
    let mut table = Table::read(path)?;
    let variant_type = table.require_column(VARIANT_TYPE)?;
    let before = table.len();
    table.retain(|row| row.get(variant_type).map(|t| t == "SNP").unwrap_or(false));
    table.write(path)?;
    info!(
        "Kept {} of {} rows as SNPs in {}",
        table.len(),
        before,
        path.display()
    );
    Ok(table.len())
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Base {
    A,
    C,
    G,
    T,
}

impl Base {
    pub fn name(&self) -> char {
        match self {
            Base::A => 'A',
            Base::C => 'C',
            Base::G => 'G',
            Base::T => 'T',
        }
    }

    /// Parse an allele. Lower case letters are accepted, everything else but A, C, G and T is not.
    pub fn parse(c: char) -> Result<Self, ContextError> {
        match c {
            'A' | 'a' => Ok(Self::A),
            'C' | 'c' => Ok(Self::C),
            'G' | 'g' => Ok(Self::G),
            'T' | 't' => Ok(Self::T),
            _ => Err(ContextError::UnknownBase(c.to_string())),
        }
    }

    pub fn complement(&self) -> Self {
        match self {
            Base::A => Base::T,
            Base::C => Base::G,
            Base::G => Base::C,
            Base::T => Base::A,
        }
    }

    pub fn is_purine(&self) -> bool {
        matches!(self, Base::A | Base::G)
    }
}

impl std::fmt::Display for Base {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_base() {
        assert_eq!(Base::parse('g'), Ok(Base::G));
        assert_eq!(Base::parse('T'), Ok(Base::T));
        assert!(Base::parse('N').is_err());
        assert!(Base::parse('-').is_err());
        for base in &[Base::A, Base::C, Base::G, Base::T] {
            assert_eq!(base.complement().complement(), *base);
            assert_ne!(base.is_purine(), base.complement().is_purine());
        }
        assert_eq!(Base::C.to_string(), "C");
    }

    #[test]
    fn test_filter_snps() {
        let mut file = NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(file, "Hugo_Symbol,Variant_Type").unwrap();
        writeln!(file, "TP53,SNP").unwrap();
        writeln!(file, "EGFR,DEL").unwrap();
        writeln!(file, "KRAS,SNP").unwrap();
        writeln!(file, "BRAF,DNP").unwrap();
        file.flush().unwrap();

        assert_eq!(filter_snps(file.path()).unwrap(), 2);
        let table = Table::read(file.path()).unwrap();
        assert_eq!(table.column("Hugo_Symbol").unwrap(), vec!["TP53", "KRAS"]);
    }

    #[test]
    fn test_filter_snps_without_variant_type() {
        let mut file = NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(file, "Hugo_Symbol").unwrap();
        writeln!(file, "TP53").unwrap();
        file.flush().unwrap();
        assert!(filter_snps(file.path()).is_err());
    }
}
