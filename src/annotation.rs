use std::collections::BTreeMap;
use std::path::Path;

use log::{info, warn};
use rayon::prelude::*;

use crate::context::{apply_mutation, derive_context, flanking_sequence, TrinucleotideContext};
use crate::error::{ContextError, MutshapeError};
use crate::genome::{ReferenceGenome, SequenceSource};
use crate::mutation::PointMutation;
use crate::table::Table;
use crate::{
    CHROMOSOME, MUT_FLANKING_SEQUENCE, REFERENCE_ALLELE, REF_FLANKING_SEQUENCE, START_POSITION,
    TUMOR_ALLELE,
};

const UPSTREAM_POSITION: &str = "Upstream_Position";
const DOWNSTREAM_POSITION: &str = "Downstream_Position";
const TRINUCLEOTIDE_CONTEXT: &str = "Trinucleotide_Context";
const REVERSE_COMPLEMENT: &str = "Reverse_Complement";

/// Sequence annotation of a single point mutation
///
/// The flanking sequences and the context are looked up independently. One of
/// them failing does not void the others.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationAnnotation {
    pub ref_flanking_sequence: Result<String, ContextError>,
    pub mut_flanking_sequence: Result<String, ContextError>,
    pub context: Result<TrinucleotideContext, ContextError>,
}

impl MutationAnnotation {
    pub fn annotate<G: SequenceSource + ?Sized>(
        genome: &G,
        mutation: &PointMutation,
        flank_size: usize,
    ) -> Self {
        let ref_flanking_sequence =
            flanking_sequence(genome, &mutation.chromosome, mutation.position, flank_size);
        let mut_flanking_sequence = match &ref_flanking_sequence {
            Ok(window) => mutation
                .alternative_base()
                .and_then(|alt| apply_mutation(window, alt.name(), flank_size)),
            Err(e) => Err(e.clone()),
        };
        Self {
            ref_flanking_sequence,
            mut_flanking_sequence,
            context: derive_context(genome, mutation),
        }
    }

    fn errors(&self) -> impl Iterator<Item = &ContextError> {
        // a failed reference window always fails the mutated one as well, count it once
        let mutated = match (&self.ref_flanking_sequence, &self.mut_flanking_sequence) {
            (Ok(_), Err(e)) => Some(e),
            _ => None,
        };
        self.ref_flanking_sequence
            .as_ref()
            .err()
            .into_iter()
            .chain(mutated)
            .chain(self.context.as_ref().err())
    }
}

/// Counts of the rows that could not be (fully) annotated
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AnnotationSummary {
    pub rows: usize,
    pub failed_rows: usize,
    pub failures: BTreeMap<&'static str, usize>,
}

impl AnnotationSummary {
    fn from_annotations(mutations: &[PointMutation], annotations: &[MutationAnnotation]) -> Self {
        let mut summary = Self {
            rows: annotations.len(),
            ..Self::default()
        };
        for (mutation, annotation) in mutations.iter().zip(annotations) {
            let mut failed = false;
            for error in annotation.errors() {
                warn!(
                    "{}:{} {}>{}: {}",
                    mutation.chromosome,
                    mutation.position,
                    mutation.reference,
                    mutation.alternative,
                    error
                );
                *summary.failures.entry(error.kind()).or_insert(0) += 1;
                failed = true;
            }
            if failed {
                summary.failed_rows += 1;
            }
        }
        summary
    }
}

/// Annotate every mutation independently. The result has the same order as the input.
pub fn annotate_mutations<G: SequenceSource + ?Sized>(
    genome: &G,
    mutations: &[PointMutation],
    flank_size: usize,
) -> Vec<MutationAnnotation> {
    mutations
        .par_iter()
        .map(|mutation| MutationAnnotation::annotate(genome, mutation, flank_size))
        .collect()
}

/// Add flanking positions, flanking sequences and trinucleotide contexts to a mutation table
pub fn add_contexts_to_table<G: SequenceSource + ?Sized>(
    table: &mut Table,
    genome: &G,
    flank_size: usize,
) -> Result<AnnotationSummary, MutshapeError> {
    let mutations: Vec<PointMutation> = table.records()?;
    let positions: Vec<usize> = mutations.iter().map(|m| m.position).collect();

    table.set_column(
        DOWNSTREAM_POSITION,
        positions.iter().map(|p| Some((p + flank_size).to_string())),
    );
    table.set_column(
        UPSTREAM_POSITION,
        positions
            .iter()
            .map(|p| Some((*p as i64 - flank_size as i64).to_string())),
    );

    let annotations = annotate_mutations(genome, &mutations, flank_size);

    table.set_column(
        REF_FLANKING_SEQUENCE,
        annotations
            .iter()
            .map(|a| a.ref_flanking_sequence.as_ref().ok().cloned()),
    );
    table.set_column(
        MUT_FLANKING_SEQUENCE,
        annotations
            .iter()
            .map(|a| a.mut_flanking_sequence.as_ref().ok().cloned()),
    );
    table.set_column(
        TRINUCLEOTIDE_CONTEXT,
        annotations
            .iter()
            .map(|a| a.context.as_ref().ok().map(|c| c.to_string())),
    );
    table.set_column(
        REVERSE_COMPLEMENT,
        annotations.iter().map(|a| {
            a.context.as_ref().ok().map(|c| {
                if c.reverse_complement {
                    "True"
                } else {
                    "False"
                }
            })
        }),
    );

    Ok(AnnotationSummary::from_annotations(&mutations, &annotations))
}

/// Annotate the mutation table at `input` in place, using the genome at `reference`
pub fn add_contexts<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    reference: Q,
    flank_size: usize,
) -> Result<AnnotationSummary, MutshapeError> {
    let input = input.as_ref();
    let genome = ReferenceGenome::open(reference)?;
    let mut table = Table::read(input)?;
    for column in &[CHROMOSOME, START_POSITION, REFERENCE_ALLELE, TUMOR_ALLELE] {
        table.require_column(column)?;
    }

    let summary = add_contexts_to_table(&mut table, &genome, flank_size)?;
    table.write(input)?;

    info!(
        "Annotated {} mutations in {} ({} rows incomplete: {:?})",
        summary.rows,
        input.display(),
        summary.failed_rows,
        summary.failures
    );
    Ok(summary)
}
