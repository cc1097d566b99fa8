use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use tabfile::Tabfile;

use crate::error::{FileError, MutshapeError, ParseError};
use crate::table::Table;
use crate::{CHROMOSOME, END_POSITION, START_POSITION};

pub const SIGNATURE: &str = "Signature";
pub const SIGNATURE_GROUP: &str = "Signature_Group";
pub const NO_SIGNATURE: &str = "No Signature Found";
pub const UNKNOWN_GROUP: &str = "Unknown";

/// COSMIC single base substitution signatures, grouped by their proposed aetiology
pub const SIGNATURE_GROUPS: &[(&str, &[&str])] = &[
    ("Clock", &["SBS1", "SBS5"]),
    ("APOBEC", &["SBS2", "SBS13"]),
    ("HR_Deficiency", &["SBS3"]),
    ("Tobacco", &["SBS4", "SBS29", "SBS92"]),
    (
        "MMR_Deficiency",
        &["SBS6", "SBS14", "SBS15", "SBS20", "SBS21", "SBS26", "SBS44"],
    ),
    ("UV", &["SBS7a", "SBS7b", "SBS7c", "SBS7d", "SBS38"]),
    (
        "Unknown",
        &[
            "SBS8", "SBS12", "SBS16", "SBS17a", "SBS17b", "SBS19", "SBS23", "SBS28", "SBS33",
            "SBS34", "SBS37", "SBS39", "SBS40a", "SBS40b", "SBS40c", "SBS41", "SBS89", "SBS91",
            "SBS93", "SBS94", "SBS96", "SBS97", "SBS98",
        ],
    ),
    ("Lymphoid", &["SBS9", "SBS84", "SBS85"]),
    ("POL_Deficiency", &["SBS10a", "SBS10b", "SBS10c", "SBS10d"]),
    (
        "Chemotherapy_Treatment",
        &[
            "SBS11", "SBS25", "SBS31", "SBS32", "SBS35", "SBS86", "SBS87", "SBS90", "SBS99",
        ],
    ),
    ("ROS", &["SBS18"]),
    ("AA", &["SBS22a", "SBS22b"]),
    ("Aflatoxin", &["SBS24"]),
    ("BER_Deficiency", &["SBS30", "SBS36"]),
    ("Haloalkane", &["SBS42"]),
    ("Colbactin", &["SBS88"]),
    (
        "Possible_Seq_Artifact",
        &[
            "SBS27", "SBS43", "SBS45", "SBS46", "SBS47", "SBS48", "SBS49", "SBS50", "SBS51",
            "SBS52", "SBS53", "SBS54", "SBS55", "SBS56", "SBS57", "SBS58", "SBS59", "SBS60",
            "SBS95",
        ],
    ),
];

/// The process group of a signature, or `Unknown` for anything not in `SIGNATURE_GROUPS`
pub fn signature_group(signature: &str) -> &'static str {
    SIGNATURE_GROUPS
        .iter()
        .find(|(_, signatures)| signatures.contains(&signature))
        .map(|(group, _)| *group)
        .unwrap_or(UNKNOWN_GROUP)
}

/// Add a `Signature_Group` column to the table at `path`, based on its `Signature` column
pub fn add_signature_groups<P: AsRef<Path>>(path: P) -> Result<(), MutshapeError> {
    let path = path.as_ref();
    let mut table = Table::read(path)?;
    let groups: Vec<Option<&'static str>> = table
        .column(SIGNATURE)?
        .into_iter()
        .map(|signature| Some(signature_group(signature)))
        .collect();
    table.set_column(SIGNATURE_GROUP, groups);
    table.write(path)?;
    info!("Added signature groups to {}", path.display());
    Ok(())
}

/// Chromosome names of the signature assignment output lack the `chr` prefix
pub fn format_chromosome(chromosome: &str) -> String {
    if !chromosome.is_empty() && chromosome.chars().all(|c| c.is_numeric()) {
        format!("chr{}", chromosome)
    } else {
        format!("chr{}", chromosome.to_uppercase())
    }
}

/// The sample name is the last `_`-separated part of a probability file's name
pub fn sample_name<P: AsRef<Path>>(path: P) -> String {
    let file_name = path
        .as_ref()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    file_name
        .split('_')
        .last()
        .unwrap_or("")
        .replace(".txt", "")
}

/// The most probable signature of a single mutation
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureCall {
    pub chromosome: String, // already formatted
    pub position: usize,
    pub signature: String,
}

/// Pick the signature with the highest probability
///
/// Cells that are not numbers are ignored. The first signature wins a tie.
pub fn best_signature<'a>(signatures: &[&'a str], values: &[&str]) -> Option<&'a str> {
    let mut best: Option<(&str, f64)> = None;
    for (signature, value) in signatures.iter().zip(values) {
        let value = match value.trim().parse::<f64>() {
            Ok(v) if !v.is_nan() => v,
            _ => continue,
        };
        match best {
            Some((_, max)) if max >= value => {}
            _ => best = Some((*signature, value)),
        }
    }
    best.map(|(signature, _)| signature)
}

/// Read the per-mutation signature probabilities of one sample
///
/// The file is tab-separated with a header line. It needs a `Chr` and a `Pos`
/// column. Every column starting with `SBS` is considered a signature.
pub fn read_signature_probabilities<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<SignatureCall>, FileError> {
    let path = path.as_ref();
    let tabfile = match Tabfile::open(path) {
        Ok(tf) => tf.comment_character('#'),
        Err(e) => return Err(FileError::io(Some(path), e)),
    };

    let mut records = tabfile.into_iter();
    let header = match records.next() {
        Some(Ok(record)) => record,
        Some(Err(e)) => return Err(FileError::io(Some(path), e)),
        None => return Ok(Vec::new()),
    };
    let columns = header.fields();
    let find = |name: &'static str| {
        columns.iter().position(|c| *c == name).ok_or_else(|| {
            let err = ParseError::file(
                path.to_path_buf(),
                header.line_number(),
                name,
                header.line().to_string(),
            );
            FileError::parse(Some(path), err)
        })
    };
    let chr_idx = find("Chr")?;
    let pos_idx = find("Pos")?;
    let signature_columns: Vec<(usize, &str)> = columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.starts_with("SBS"))
        .map(|(i, c)| (i, *c))
        .collect();
    let names: Vec<&str> = signature_columns.iter().map(|(_, name)| *name).collect();

    let mut result = Vec::new();
    for record_result in records {
        let record = match record_result {
            Ok(record) => record,
            Err(e) => return Err(FileError::io(Some(path), e)),
        };
        let tokens = record.fields();

        let position = tokens
            .get(pos_idx)
            .and_then(|p| p.trim().parse::<usize>().ok())
            .ok_or_else(|| {
                let err = ParseError::file(
                    path.to_path_buf(),
                    record.line_number(),
                    "a genomic position",
                    record.line().to_string(),
                );
                FileError::parse(Some(path), err)
            })?;
        let chromosome = format_chromosome(tokens.get(chr_idx).copied().unwrap_or(""));
        let values: Vec<&str> = signature_columns
            .iter()
            .map(|(i, _)| tokens.get(*i).copied().unwrap_or(""))
            .collect();
        let signature = best_signature(&names, &values)
            .unwrap_or(NO_SIGNATURE)
            .to_string();

        result.push(SignatureCall {
            chromosome,
            position,
            signature,
        });
    }
    Ok(result)
}

/// Outcome of importing the signature calls of one sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureImport {
    pub sample: String,
    pub table: PathBuf,
    pub matched: usize,
    pub unmatched: usize,
}

/// Write the most probable signature of every mutation into the `Signature`
/// column of the sample's table
///
/// Mutations are matched on chromosome and on both start and end position.
pub fn assign_signatures_to_table(table: &mut Table, calls: &[SignatureCall]) -> Result<(usize, usize), MutshapeError> {
    let chromosome = table.require_column(CHROMOSOME)?;
    let start = table.require_column(START_POSITION)?;
    let end = table.require_column(END_POSITION)?;

    let mut index: HashMap<(String, usize), Vec<usize>> = HashMap::new();
    for row in 0..table.len() {
        let start_pos = table.cell(row, start).trim().parse::<usize>();
        let end_pos = table.cell(row, end).trim().parse::<usize>();
        if let (Ok(s), Ok(e)) = (start_pos, end_pos) {
            if s == e {
                index
                    .entry((table.cell(row, chromosome).to_string(), s))
                    .or_default()
                    .push(row);
            }
        }
    }

    let signature = table.ensure_column(SIGNATURE);
    let mut matched = 0;
    let mut unmatched = 0;
    for call in calls {
        match index.get(&(call.chromosome.clone(), call.position)) {
            Some(rows) => {
                for row in rows {
                    table.set_cell(*row, signature, call.signature.clone());
                }
                matched += 1;
            }
            None => {
                debug!("No mutation at {}:{}", call.chromosome, call.position);
                unmatched += 1;
            }
        }
    }
    Ok((matched, unmatched))
}

/// Import the signature calls of `probabilities` into `<csv_dir>/<sample>.csv`
///
/// Returns `None` if the sample has no table in `csv_dir`.
pub fn assign_signatures<P: AsRef<Path>, Q: AsRef<Path>>(
    probabilities: P,
    csv_dir: Q,
) -> Result<Option<SignatureImport>, MutshapeError> {
    let sample = sample_name(&probabilities);
    let table_path = csv_dir.as_ref().join(format!("{}.csv", sample));
    if !table_path.is_file() {
        warn!("Sample CSV not found: {}", sample);
        return Ok(None);
    }

    let calls = read_signature_probabilities(&probabilities)?;
    let mut table = Table::read(&table_path)?;
    let (matched, unmatched) = assign_signatures_to_table(&mut table, &calls)?;
    table.write(&table_path)?;

    info!("Processed {}: {} unmatched mutations", sample, unmatched);
    Ok(Some(SignatureImport {
        sample,
        table: table_path,
        matched,
        unmatched,
    }))
}
