use std::collections::HashMap;
use std::path::Path;

use log::info;
use needletail::parse_fastx_file;
use twobit::TwoBitFile;

use crate::error::{ContextError, FileError};
use crate::interval::Interval;

/// Random access to the bases of a reference genome
///
/// Implementations must be safe to share between threads because every
/// mutation of a cohort is looked up independently.
pub trait SequenceSource: Sync {
    fn has_chromosome(&self, name: &str) -> bool;

    /// Return the bases in `range` (zero-based, half-open) with their case preserved.
    ///
    /// Ranges that reach beyond the end of the chromosome are truncated
    /// instead of failing. Callers need to check the length of the result.
    fn sequence(&self, chromosome: &str, range: Interval) -> Result<String, ContextError>;
}

/// A reference genome that is held completely in memory
#[derive(Debug, Default)]
pub struct ReferenceGenome {
    chromosomes: HashMap<String, Vec<u8>>,
}

impl ReferenceGenome {
    /// Load a genome from a `.2bit` file or from a (gzipped) FASTA file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FileError> {
        let path = path.as_ref();
        let is_twobit = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("2bit"))
            .unwrap_or(false);
        let genome = if is_twobit {
            Self::from_twobit(path)?
        } else {
            Self::from_fasta(path)?
        };
        info!(
            "Loaded {} sequences from reference genome {}",
            genome.chromosomes.len(),
            path.display()
        );
        Ok(genome)
    }

    pub fn from_twobit<P: AsRef<Path>>(path: P) -> Result<Self, FileError> {
        let path = path.as_ref();
        let mut twobit = TwoBitFile::open_and_read(path)
            .map_err(|e| FileError::genome(Some(path), e.to_string()))?
            .enable_softmask(true);

        let mut chromosomes = HashMap::new();
        for name in twobit.chrom_names() {
            let seq = twobit
                .read_sequence(&name, ..)
                .map_err(|e| FileError::genome(Some(path), e.to_string()))?;
            chromosomes.insert(name, seq.into_bytes());
        }
        Ok(Self { chromosomes })
    }

    /// Sequences are named after the first word of their FASTA header
    pub fn from_fasta<P: AsRef<Path>>(path: P) -> Result<Self, FileError> {
        let path = path.as_ref();
        let mut reader =
            parse_fastx_file(path).map_err(|e| FileError::genome(Some(path), e.to_string()))?;

        let mut chromosomes = HashMap::new();
        while let Some(record) = reader.next() {
            let record = record.map_err(|e| FileError::genome(Some(path), e.to_string()))?;
            let header = String::from_utf8_lossy(record.id());
            let name = header.split_whitespace().next().unwrap_or("").to_string();
            chromosomes.insert(name, record.seq().into_owned());
        }
        Ok(Self { chromosomes })
    }

    pub fn from_sequences<'a, I>(sequences: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let chromosomes = sequences
            .into_iter()
            .map(|(name, seq)| (name.to_string(), seq.as_bytes().to_vec()))
            .collect();
        Self { chromosomes }
    }

    pub fn chromosome_length(&self, name: &str) -> Option<usize> {
        self.chromosomes.get(name).map(|seq| seq.len())
    }

    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }
}

impl SequenceSource for ReferenceGenome {
    fn has_chromosome(&self, name: &str) -> bool {
        self.chromosomes.contains_key(name)
    }

    fn sequence(&self, chromosome: &str, range: Interval) -> Result<String, ContextError> {
        let seq = self
            .chromosomes
            .get(chromosome)
            .ok_or_else(|| ContextError::NotFound(chromosome.to_string()))?;
        let range = range.clamp(seq.len());
        Ok(String::from_utf8_lossy(&seq[range.start..range.stop]).into_owned())
    }
}
