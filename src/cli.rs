use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::info;
use thiserror::Error;

use mutshape::shape::{self, SequenceKind};
use mutshape::signatures;
use mutshape::DEFAULT_FLANK_SIZE;

#[derive(Debug, Parser)]
#[command(
    name = "mutshape",
    version,
    about = "Annotate somatic point mutations with sequence context, signatures and DNA shape"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add flanking sequences and trinucleotide contexts to a mutation table (in place)
    Contexts(ContextsArgs),
    /// Keep only the SNP rows of a mutation table (in place)
    FilterSnps {
        #[arg(value_name = "CSV", help = "Mutation table")]
        csv: PathBuf,
    },
    /// Import per-mutation signature probabilities into the matching sample table
    AssignSignatures {
        #[arg(value_name = "TXT", help = "Tab-separated signature probabilities of one sample")]
        probabilities: PathBuf,
        #[arg(value_name = "CSV_DIR", help = "Directory with one mutation table per sample")]
        csv_dir: PathBuf,
    },
    /// Map assigned signatures to their aetiology group (in place)
    SignatureGroups {
        #[arg(value_name = "CSV", help = "Mutation table with a Signature column")]
        csv: PathBuf,
    },
    /// Add the Shannon diversity of signature activities to a copy of the table
    Shannon {
        #[arg(value_name = "CSV", help = "Signature activities, one sample per row")]
        csv: PathBuf,
    },
    /// Write one flanking sequence per line for the shape predictor
    ExportSequences {
        #[arg(value_name = "CSV", help = "Annotated mutation table")]
        csv: PathBuf,
        #[arg(value_name = "OUT_DIR", help = "Output directory")]
        output_dir: PathBuf,
        #[arg(value_name = "TYPE", help = "Which sequence to export: ref or mut")]
        kind: SequenceKind,
    },
    /// Add shape predictions of mutated and reference sequences to a mutation table (in place)
    ShapeFeatures {
        #[arg(value_name = "CSV", help = "Annotated mutation table")]
        csv: PathBuf,
        #[arg(value_name = "MUT_FILE", help = "Shape values of the mutated sequences")]
        mutated: PathBuf,
        #[arg(value_name = "REF_FILE", help = "Shape values of the reference sequences")]
        reference: PathBuf,
    },
}

#[derive(Debug, clap::Args)]
pub struct ContextsArgs {
    #[arg(value_name = "CSV", help = "Mutation table")]
    pub csv: PathBuf,

    #[arg(value_name = "GENOME", help = "Reference genome in .2bit or FASTA format")]
    pub genome: PathBuf,

    #[arg(
        short = 'f',
        long = "flank-size",
        value_name = "BASES",
        help = "Number of bases on either side of the mutation",
        default_value_t = DEFAULT_FLANK_SIZE
    )]
    pub flank_size: usize,

    #[arg(
        short = 't',
        long = "threads",
        help = "Number of threads",
        value_name = "THREADS",
        default_value_t = num_cpus::get()
    )]
    pub threads: usize,
}

pub trait ArgCheck {
    fn check(&self) -> Result<(), CliError> {
        for file in self.get_files() {
            validate_file(file)?;
        }
        for dir in self.get_dirs() {
            validate_dir(dir)?;
        }
        Ok(())
    }

    fn get_files(&self) -> Vec<&PathBuf>;
    fn get_dirs(&self) -> Vec<&PathBuf>;
}

impl ArgCheck for Command {
    fn get_files(&self) -> Vec<&PathBuf> {
        match self {
            Command::Contexts(args) => vec![&args.csv, &args.genome],
            Command::FilterSnps { csv }
            | Command::SignatureGroups { csv }
            | Command::Shannon { csv }
            | Command::ExportSequences { csv, .. } => vec![csv],
            Command::AssignSignatures { probabilities, .. } => vec![probabilities],
            Command::ShapeFeatures {
                csv,
                mutated,
                reference,
            } => vec![csv, mutated, reference],
        }
    }

    fn get_dirs(&self) -> Vec<&PathBuf> {
        match self {
            Command::AssignSignatures { csv_dir, .. } => vec![csv_dir],
            Command::ExportSequences { output_dir, .. } => vec![output_dir],
            _ => vec![],
        }
    }
}

impl Command {
    pub fn run(self) -> anyhow::Result<()> {
        match self {
            Command::Contexts(args) => {
                if args.threads == 0 {
                    return Err(CliError::InvalidInput("--threads must be at least 1".into()).into());
                }
                rayon::ThreadPoolBuilder::new()
                    .num_threads(args.threads)
                    .build_global()?;
                mutshape::add_contexts(&args.csv, &args.genome, args.flank_size)?;
            }
            Command::FilterSnps { csv } => {
                mutshape::filter_snps(&csv)?;
            }
            Command::AssignSignatures {
                probabilities,
                csv_dir,
            } => {
                if let Some(import) = signatures::assign_signatures(&probabilities, &csv_dir)? {
                    info!(
                        "Sample {}: {} mutations assigned, {} without a match",
                        import.sample, import.matched, import.unmatched
                    );
                }
            }
            Command::SignatureGroups { csv } => {
                signatures::add_signature_groups(&csv)?;
            }
            Command::Shannon { csv } => {
                mutshape::add_shannon_index(&csv)?;
            }
            Command::ExportSequences {
                csv,
                output_dir,
                kind,
            } => {
                shape::write_flanking_sequences(&csv, &output_dir, kind)?;
            }
            Command::ShapeFeatures {
                csv,
                mutated,
                reference,
            } => {
                shape::process_shape_features(&csv, &mutated, &reference)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

fn validate_file(path: &PathBuf) -> Result<(), CliError> {
    if !path.exists() {
        let err = format!("File {} does not exist", path.display());
        return Err(CliError::InvalidInput(err));
    }
    if !path.is_file() {
        let err = format!("{} is not a file", path.display());
        return Err(CliError::InvalidInput(err));
    }
    Ok(())
}

fn validate_dir(path: &PathBuf) -> Result<(), CliError> {
    if !path.is_dir() {
        let err = format!("Directory {} does not exist", path.display());
        return Err(CliError::InvalidInput(err));
    }
    Ok(())
}
