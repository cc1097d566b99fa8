use std::fmt;

use crate::error::ContextError;
use crate::genome::SequenceSource;
use crate::interval::Interval;
use crate::mutation::PointMutation;
use crate::Base;

/// Watson-Crick complement of a reference genome base
///
/// Soft-masked (lower case) bases keep their case. Anything that is not
/// A, C, G or T has no complement.
pub fn complement(nuc: char) -> Result<char, ContextError> {
    match nuc {
        'A' => Ok('T'),
        'C' => Ok('G'),
        'G' => Ok('C'),
        'T' => Ok('A'),
        'a' => Ok('t'),
        'c' => Ok('g'),
        'g' => Ok('c'),
        't' => Ok('a'),
        _ => Err(ContextError::UnknownBase(nuc.to_string())),
    }
}

/// Fetch the reference bases `flank_size` positions up- and downstream of `position` (1-based)
///
/// The result is returned as stored in the genome. It is shorter than
/// `2 * flank_size + 1` if the window runs over either end of the chromosome.
pub fn extract_window<G: SequenceSource + ?Sized>(
    genome: &G,
    chromosome: &str,
    position: usize,
    flank_size: usize,
) -> Result<String, ContextError> {
    if !genome.has_chromosome(chromosome) {
        return Err(ContextError::NotFound(chromosome.to_string()));
    }
    genome.sequence(chromosome, Interval::around(position, flank_size))
}

/// Like `extract_window`, but incomplete windows are rejected
pub fn flanking_sequence<G: SequenceSource + ?Sized>(
    genome: &G,
    chromosome: &str,
    position: usize,
    flank_size: usize,
) -> Result<String, ContextError> {
    let window = extract_window(genome, chromosome, position, flank_size)?;
    check_window_length(&window, flank_size)?;
    Ok(window)
}

fn check_window_length(window: &str, flank_size: usize) -> Result<(), ContextError> {
    let expected = 2 * flank_size + 1;
    let observed = window.chars().count();
    if observed == expected {
        Ok(())
    } else {
        Err(ContextError::Invalid { expected, observed })
    }
}

/// Replace the center base of a flanking sequence window with `mutant`
pub fn apply_mutation(window: &str, mutant: char, flank_size: usize) -> Result<String, ContextError> {
    check_window_length(window, flank_size)?;
    Ok(window
        .chars()
        .enumerate()
        .map(|(i, c)| if i == flank_size { mutant } else { c })
        .collect())
}

/// The mutated base together with one base of sequence context on either side
///
/// Contexts are reported relative to a pyrimidine reference base. Mutations of
/// a purine are reported on the reverse strand, which is what
/// `reverse_complement` records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrinucleotideContext {
    pub upstream: char,
    pub reference: Base,
    pub alternative: Base,
    pub downstream: char,
    pub reverse_complement: bool,
}

impl TrinucleotideContext {
    /// Build a context from the forward strand bases around a mutation
    pub fn from_forward_strand(
        upstream: char,
        reference: Base,
        alternative: Base,
        downstream: char,
    ) -> Result<Self, ContextError> {
        let forward = Self {
            upstream,
            reference,
            alternative,
            downstream,
            reverse_complement: false,
        };
        if reference.is_purine() {
            forward.flip_strand()
        } else {
            Ok(forward)
        }
    }

    /// The same context read from the opposite strand
    ///
    /// Reading the other strand reverses the order of the flanking bases as
    /// well as complementing them: the downstream base becomes the upstream one.
    pub fn flip_strand(&self) -> Result<Self, ContextError> {
        Ok(Self {
            upstream: complement(self.downstream)?,
            reference: self.reference.complement(),
            alternative: self.alternative.complement(),
            downstream: complement(self.upstream)?,
            reverse_complement: !self.reverse_complement,
        })
    }
}

impl fmt::Display for TrinucleotideContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}>{}]{}",
            self.upstream,
            self.reference.name(),
            self.alternative.name(),
            self.downstream
        )
    }
}

/// Determine the pyrimidine-centered trinucleotide context of a point mutation
///
/// The alleles of the mutation take precedence over the reference base at the
/// mutated position. Only the two neighbouring bases are taken from the genome.
pub fn derive_context<G: SequenceSource + ?Sized>(
    genome: &G,
    mutation: &PointMutation,
) -> Result<TrinucleotideContext, ContextError> {
    let reference = mutation.reference_base()?;
    let alternative = mutation.alternative_base()?;

    let window = extract_window(genome, &mutation.chromosome, mutation.position, 1)?;
    check_window_length(&window, 1)?;
    let bases: Vec<char> = window.chars().collect();

    TrinucleotideContext::from_forward_strand(bases[0], reference, alternative, bases[2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::ReferenceGenome;

    // position 100 of chr1 is the G in "AGT"
    fn genome() -> ReferenceGenome {
        let chr1 = format!("{}AGT{}", "C".repeat(98), "acgtacgtac");
        ReferenceGenome::from_sequences(vec![
            ("chr1", chr1.as_str()),
            ("chr2", "GCAttGA"),
        ])
    }

    #[test]
    fn test_complement() {
        for nuc in "ACGTacgt".chars() {
            assert_eq!(complement(complement(nuc).unwrap()).unwrap(), nuc);
        }
        assert_eq!(complement('a'), Ok('t'));
        assert_eq!(
            complement('N'),
            Err(ContextError::UnknownBase("N".to_string()))
        );
    }

    #[test]
    fn test_extract_window() {
        let genome = genome();
        assert_eq!(extract_window(&genome, "chr1", 100, 1).unwrap(), "AGT");
        assert_eq!(extract_window(&genome, "chr1", 100, 0).unwrap(), "G");
        assert_eq!(
            extract_window(&genome, "chr1", 100, 10).unwrap(),
            "CCCCCCCCCAGTacgtacgta"
        );
        // case is preserved, the end of the chromosome truncates
        assert_eq!(extract_window(&genome, "chr2", 6, 2).unwrap(), "ttGA");
        assert_eq!(
            extract_window(&genome, "chrUn", 6, 2),
            Err(ContextError::NotFound("chrUn".to_string()))
        );
    }

    #[test]
    fn test_flanking_sequence_near_chromosome_ends() {
        let genome = genome();
        assert_eq!(flanking_sequence(&genome, "chr2", 4, 3).unwrap(), "GCAttGA");
        assert_eq!(
            flanking_sequence(&genome, "chr2", 6, 2),
            Err(ContextError::Invalid {
                expected: 5,
                observed: 4
            })
        );
        assert_eq!(
            flanking_sequence(&genome, "chr2", 1, 2),
            Err(ContextError::Invalid {
                expected: 5,
                observed: 3
            })
        );
    }

    #[test]
    fn test_apply_mutation() {
        let window = "ACGTACGTACG";
        let mutated = apply_mutation(window, 'T', 5).unwrap();
        assert_eq!(mutated, "ACGTATGTACG");
        assert_eq!(mutated.len(), window.len());
        let differences = window
            .chars()
            .zip(mutated.chars())
            .filter(|(a, b)| a != b)
            .count();
        assert_eq!(differences, 1);

        // mutating to the reference base changes nothing
        assert_eq!(apply_mutation("AAA", 'A', 1).unwrap(), "AAA");

        assert_eq!(
            apply_mutation("ACGTA", 'T', 5),
            Err(ContextError::Invalid {
                expected: 11,
                observed: 5
            })
        );
        assert!(apply_mutation("", 'T', 0).is_err());
    }

    #[test]
    fn test_purine_reference_is_reverse_complemented() {
        let genome = genome();
        let mutation = PointMutation::new("chr1", 100, 'G', 'A');
        let context = derive_context(&genome, &mutation).unwrap();
        assert_eq!(context.to_string(), "A[C>T]T");
        assert!(context.reverse_complement);
        assert_eq!(context.upstream, 'A'); // complement of the forward downstream T
        assert_eq!(context.downstream, 'T'); // complement of the forward upstream A
    }

    #[test]
    fn test_pyrimidine_reference_stays_on_forward_strand() {
        let genome = ReferenceGenome::from_sequences(vec![("chr3", "TTGCATT")]);
        let mutation = PointMutation::new("chr3", 4, 'C', 'T');
        let context = derive_context(&genome, &mutation).unwrap();
        assert_eq!(context.to_string(), "G[C>T]A");
        assert!(!context.reverse_complement);

        let mutation = PointMutation::new("chr3", 5, 'T', 'G');
        let context = derive_context(&genome, &mutation).unwrap();
        assert_eq!(context.to_string(), "C[T>G]T");
        assert!(!context.reverse_complement);
    }

    #[test]
    fn test_every_substitution_is_pyrimidine_centered() {
        let genome = genome();
        for reference in &[Base::A, Base::C, Base::G, Base::T] {
            for alternative in &[Base::A, Base::C, Base::G, Base::T] {
                if reference == alternative {
                    continue;
                }
                let mutation =
                    PointMutation::new("chr1", 100, reference.name(), alternative.name());
                let context = derive_context(&genome, &mutation).unwrap();
                assert!(!context.reference.is_purine());
                assert_eq!(context.reverse_complement, reference.is_purine());
                // A_T reads the same on both strands
                assert_eq!((context.upstream, context.downstream), ('A', 'T'));
                if context.reverse_complement {
                    assert_eq!(context.reference, reference.complement());
                    assert_eq!(context.alternative, alternative.complement());
                } else {
                    assert_eq!(context.reference, *reference);
                    assert_eq!(context.alternative, *alternative);
                }
            }
        }
    }

    #[test]
    fn test_flip_strand_round_trip() {
        let forward =
            TrinucleotideContext::from_forward_strand('c', Base::A, Base::G, 'T').unwrap();
        assert_eq!(forward.to_string(), "A[T>C]g");
        assert!(forward.reverse_complement);

        let back = forward.flip_strand().unwrap();
        assert_eq!(back.upstream, 'c');
        assert_eq!(back.downstream, 'T');
        assert_eq!(back.reference, Base::A);
        assert_eq!(back.alternative, Base::G);
        assert!(!back.reverse_complement);
    }

    #[test]
    fn test_context_failures() {
        let genome = genome();
        let unknown = PointMutation::new("chr1", 100, 'N', 'A');
        assert_eq!(
            derive_context(&genome, &unknown),
            Err(ContextError::UnknownBase("N".to_string()))
        );

        let missing = PointMutation::new("chrM", 100, 'C', 'A');
        assert_eq!(
            derive_context(&genome, &missing),
            Err(ContextError::NotFound("chrM".to_string()))
        );

        let at_start = PointMutation::new("chr2", 1, 'G', 'A');
        assert_eq!(
            derive_context(&genome, &at_start),
            Err(ContextError::Invalid {
                expected: 3,
                observed: 2
            })
        );

        // a gap next to a purine has no complement
        let gap = ReferenceGenome::from_sequences(vec![("chr4", "NGT")]);
        let mutation = PointMutation::new("chr4", 2, 'G', 'T');
        assert_eq!(
            derive_context(&gap, &mutation),
            Err(ContextError::UnknownBase("N".to_string()))
        );
    }
}
