use std::path::{Path, PathBuf};

use log::info;

use crate::error::MutshapeError;
use crate::table::Table;

const SHANNON_INDEX: &str = "Shannon_Index";

/// Shannon diversity of a set of signature weights
///
/// Missing weights are skipped. Only strictly positive proportions contribute,
/// so a sample without any weight has a diversity of zero.
pub fn shannon_index(weights: &[Option<f64>]) -> f64 {
    let total: f64 = weights.iter().flatten().sum();
    let entropy: f64 = weights
        .iter()
        .flatten()
        .map(|w| w / total)
        .filter(|p| *p > 0.0 && p.is_finite())
        .map(|p| p * p.ln())
        .sum();
    if entropy == 0.0 {
        0.0 // avoid reporting -0
    } else {
        -entropy
    }
}

/// Write a copy of the signature activity table with an added `Shannon_Index` column
///
/// The first column holds the sample name, every other column is a signature.
/// The result goes to `<input stem>_shannon.csv` next to the input.
pub fn add_shannon_index<P: AsRef<Path>>(input: P) -> Result<PathBuf, MutshapeError> {
    let input = input.as_ref();
    let mut table = Table::read(input)?;
    let signatures = table.headers().len().saturating_sub(1);
    info!(
        "Identified signature columns: {:?}",
        table.headers().iter().skip(1).collect::<Vec<_>>()
    );

    let indices: Vec<Option<String>> = table
        .rows()
        .iter()
        .map(|row| {
            let weights: Vec<Option<f64>> = (1..=signatures)
                .map(|i| {
                    row.get(i)
                        .and_then(|cell| cell.trim().parse::<f64>().ok())
                        .filter(|w| !w.is_nan())
                })
                .collect();
            Some(shannon_index(&weights).to_string())
        })
        .collect();
    table.set_column(SHANNON_INDEX, indices);

    let output = shannon_output_path(input);
    table.write(&output)?;
    info!("Updated CSV saved to {}", output.display());
    Ok(output)
}

fn shannon_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{}_shannon.csv", stem))
}
