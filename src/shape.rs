//! DNA shape features
//!
//! The shape predictor is run outside of this crate. It reads one flanking
//! sequence per line and writes one line of whitespace-separated values per
//! sequence. This module prepares its input and folds its output back into
//! the mutation table.

use std::convert::TryFrom;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::info;

use crate::error::{FileError, MutshapeError, ParseError};
use crate::table::Table;
use crate::{MUT_FLANKING_SEQUENCE, REF_FLANKING_SEQUENCE};

/// Which of the two flanking sequences of a mutation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    Reference,
    Mutated,
}

impl SequenceKind {
    pub fn column(&self) -> &'static str {
        match self {
            Self::Reference => REF_FLANKING_SEQUENCE,
            Self::Mutated => MUT_FLANKING_SEQUENCE,
        }
    }
}

impl FromStr for SequenceKind {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ref" => Ok(Self::Reference),
            "mut" => Ok(Self::Mutated),
            _ => Err(ParseError::somewhere("'ref' or 'mut'", s.to_string())),
        }
    }
}

/// Write one upper case flanking sequence per line to `<output_dir>/<input stem>.txt`
///
/// Mutations without a flanking sequence get an empty line, so that line
/// numbers keep matching table rows.
pub fn write_flanking_sequences<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output_dir: Q,
    kind: SequenceKind,
) -> Result<PathBuf, MutshapeError> {
    let input = input.as_ref();
    let table = Table::read(input)?;
    let sequences = table.column(kind.column())?;

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let output = output_dir.as_ref().join(format!("{}.txt", stem));
    let file = File::create(&output).map_err(|e| FileError::io(Some(&output), e))?;
    let mut writer = BufWriter::new(file);
    for seq in sequences {
        writeln!(writer, "{}", seq.to_uppercase()).map_err(|e| FileError::io(Some(&output), e))?;
    }
    writer.flush().map_err(|e| FileError::io(Some(&output), e))?;

    info!("Flanking sequences written to {}", output.display());
    Ok(output)
}

/// Direction in which a mutation moves a shape feature, summed over the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeSign {
    Positive,
    Negative,
    Zero,
}

impl ShapeSign {
    pub fn of(mutated: &[f64], reference: &[f64]) -> Self {
        let diff: f64 = mutated.iter().zip(reference).map(|(m, r)| m - r).sum();
        if diff > 0.0 {
            Self::Positive
        } else if diff < 0.0 {
            Self::Negative
        } else {
            Self::Zero
        }
    }

    pub fn apply(&self, distance: f64) -> f64 {
        match self {
            Self::Positive => distance,
            Self::Negative => -distance,
            Self::Zero => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "POS",
            Self::Negative => "NEG",
            Self::Zero => "ZERO",
        }
    }
}

impl fmt::Display for ShapeSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for ShapeSign {
    type Error = ParseError;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "POS" => Ok(Self::Positive),
            "NEG" => Ok(Self::Negative),
            "ZERO" => Ok(Self::Zero),
            _ => Err(ParseError::somewhere("POS, NEG or ZERO", s.to_string())),
        }
    }
}

pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Feature names are encoded in the predictor's output file names: `<sample>_<feature>[_...].txt`
pub fn feature_name<P: AsRef<Path>>(path: P) -> Result<String, ParseError> {
    let file_name = path
        .as_ref()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.split('_').nth(1) {
        Some(token) => Ok(token.split('.').next().unwrap_or("").to_string()),
        None => Err(ParseError::somewhere(
            "a file name like <sample>_<feature>.txt",
            file_name,
        )),
    }
}

/// The lines of a shape predictor output file, verbatim and parsed
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeValues {
    pub lines: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl ShapeValues {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, FileError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| FileError::io(Some(path), e))?;
        let mut lines = Vec::new();
        let mut values = Vec::new();
        for (i, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| FileError::io(Some(path), e))?;
            let parsed = line
                .split_whitespace()
                .map(|v| v.parse::<f64>())
                .collect::<Result<Vec<f64>, _>>()
                .map_err(|_| {
                    let err =
                        ParseError::file(path.to_path_buf(), i + 1, "numbers", line.clone());
                    FileError::parse(Some(path), err)
                })?;
            lines.push(line.trim().to_string());
            values.push(parsed);
        }
        Ok(Self { lines, values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Compare the predicted shape of mutated and reference sequences and add the result to `table`
///
/// Adds the columns `<feature>` (Euclidean distance), `<feature>_Sign`,
/// `<feature>_Signed`, `<feature>_wt` and `<feature>_mut`.
pub fn add_shape_features(
    table: &mut Table,
    feature: &str,
    mutated: &ShapeValues,
    reference: &ShapeValues,
) -> Result<(), MutshapeError> {
    if mutated.len() != reference.len() {
        return Err(MutshapeError::Mismatch(format!(
            "The mutated ({}) and reference ({}) shape files must have the same number of sequences",
            mutated.len(),
            reference.len()
        )));
    }
    if mutated.len() != table.len() {
        return Err(MutshapeError::Mismatch(format!(
            "Table {} has {} rows but there are {} shape predictions",
            table.name(),
            table.len(),
            mutated.len()
        )));
    }
    let sign_column = format!("{}_Sign", feature);
    if table.has_column(&sign_column) {
        return Err(MutshapeError::Mismatch(format!(
            "The column {} already exists in table {}",
            sign_column,
            table.name()
        )));
    }

    let mut distances = Vec::with_capacity(mutated.len());
    let mut signs = Vec::with_capacity(mutated.len());
    for (i, (m, r)) in mutated.values.iter().zip(&reference.values).enumerate() {
        if m.len() != r.len() {
            return Err(MutshapeError::Mismatch(format!(
                "Sequence {} has {} mutated but {} reference shape values",
                i + 1,
                m.len(),
                r.len()
            )));
        }
        distances.push(euclidean_distance(m, r));
        signs.push(ShapeSign::of(m, r));
    }

    table.set_column(feature, distances.iter().map(|d| Some(d.to_string())));
    table.set_column(&sign_column, signs.iter().map(|s| Some(s.as_str())));
    table.set_column(
        &format!("{}_Signed", feature),
        distances
            .iter()
            .zip(&signs)
            .map(|(d, s)| Some(s.apply(*d).to_string())),
    );
    table.set_column(
        &format!("{}_wt", feature),
        reference.lines.iter().map(|l| Some(l.as_str())),
    );
    table.set_column(
        &format!("{}_mut", feature),
        mutated.lines.iter().map(|l| Some(l.as_str())),
    );
    Ok(())
}

/// Fold the shape predictions for one feature into the mutation table at `csv`, in place
///
/// Returns the name of the feature.
pub fn process_shape_features<P, Q, R>(
    csv: P,
    mutated_file: Q,
    reference_file: R,
) -> Result<String, MutshapeError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
{
    let csv = csv.as_ref();
    let feature = feature_name(&mutated_file)?;
    let mutated = ShapeValues::read(&mutated_file)?;
    let reference = ShapeValues::read(&reference_file)?;

    let mut table = Table::read(csv)?;
    add_shape_features(&mut table, &feature, &mutated, &reference)?;
    table.write(csv)?;

    info!(
        "Appended {} shape features for {} sequences to {}",
        feature,
        mutated.len(),
        csv.display()
    );
    Ok(feature)
}

/// Make sure a directory exists before output is written into it
pub fn ensure_dir<P: AsRef<Path>>(dir: P) -> Result<(), FileError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| FileError::io(Some(dir), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn values(lines: &[&str]) -> ShapeValues {
        ShapeValues {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            values: lines
                .iter()
                .map(|l| {
                    l.split_whitespace()
                        .map(|v| v.parse::<f64>().unwrap())
                        .collect::<Vec<f64>>()
                })
                .collect(),
        }
    }

    fn table(rows: usize) -> Table {
        let mut table = Table::new("test", vec!["Hugo_Symbol".to_string()]);
        for i in 0..rows {
            table.push_row(vec![format!("GENE{}", i)]);
        }
        table
    }

    #[test]
    fn test_sign_and_distance() {
        assert_eq!(euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
        assert_eq!(euclidean_distance(&[1.0], &[1.0]), 0.0);

        assert_eq!(ShapeSign::of(&[1.0, 2.0], &[1.0, 1.0]), ShapeSign::Positive);
        assert_eq!(ShapeSign::of(&[1.0, 0.5], &[1.0, 1.0]), ShapeSign::Negative);
        assert_eq!(ShapeSign::of(&[2.0, 0.0], &[1.0, 1.0]), ShapeSign::Zero);

        assert_eq!(ShapeSign::Negative.apply(2.5), -2.5);
        assert_eq!(ShapeSign::Zero.apply(2.5), 0.0);
        assert_eq!(ShapeSign::try_from("NEG").unwrap(), ShapeSign::Negative);
        assert!(ShapeSign::try_from("neg").is_err());
    }

    #[test]
    fn test_feature_name() {
        assert_eq!(feature_name("out/cohort_MGW_layer4.txt").unwrap(), "MGW");
        assert_eq!(feature_name("cohort_ProT.txt").unwrap(), "ProT");
        assert!(feature_name("cohort.txt").is_err());
    }

    #[test]
    fn test_add_shape_features() {
        let mut table = table(3);
        let reference = values(&["1.0 1.0", "2.0 2.0", "3.0 3.0"]);
        let mutated = values(&["1.0 2.0", "2.0 1.0", "3.0 3.0"]);
        add_shape_features(&mut table, "MGW", &mutated, &reference).unwrap();

        assert_eq!(table.column("MGW").unwrap(), vec!["1", "1", "0"]);
        assert_eq!(table.column("MGW_Sign").unwrap(), vec!["POS", "NEG", "ZERO"]);
        assert_eq!(table.column("MGW_Signed").unwrap(), vec!["1", "-1", "0"]);
        assert_eq!(
            table.column("MGW_wt").unwrap(),
            vec!["1.0 1.0", "2.0 2.0", "3.0 3.0"]
        );
        assert_eq!(
            table.column("MGW_mut").unwrap(),
            vec!["1.0 2.0", "2.0 1.0", "3.0 3.0"]
        );

        // features are only added once
        assert!(add_shape_features(&mut table, "MGW", &mutated, &reference).is_err());
    }

    #[test]
    fn test_add_shape_features_mismatches() {
        let reference = values(&["1.0 1.0", "2.0 2.0"]);
        let mutated = values(&["1.0 2.0"]);
        assert!(add_shape_features(&mut table(2), "Roll", &mutated, &reference).is_err());

        let mutated = values(&["1.0 2.0", "2.0"]);
        assert!(add_shape_features(&mut table(2), "Roll", &mutated, &reference).is_err());

        let mutated = values(&["1.0 2.0", "2.0 1.0"]);
        assert!(add_shape_features(&mut table(3), "Roll", &mutated, &reference).is_err());
        assert!(add_shape_features(&mut table(2), "Roll", &mutated, &reference).is_ok());
    }

    #[test]
    fn test_process_shape_features() {
        let dir = tempdir().unwrap();
        let csv = dir.path().join("cohort.csv");
        fs::write(&csv, "Hugo_Symbol\nTP53\nKRAS\n").unwrap();
        let mutated = dir.path().join("cohort-mut_HelT_layer4.txt");
        fs::write(&mutated, "34.1  35.0\n33.0 33.0\n").unwrap();
        let reference = dir.path().join("cohort-ref_HelT_layer4.txt");
        fs::write(&reference, "34.1 34.0\n33.5 33.0\n").unwrap();

        assert_eq!(
            process_shape_features(&csv, &mutated, &reference).unwrap(),
            "HelT"
        );
        let table = Table::read(&csv).unwrap();
        assert_eq!(table.column("HelT_Sign").unwrap(), vec!["POS", "NEG"]);
        assert_eq!(table.column("HelT_mut").unwrap(), vec!["34.1  35.0", "33.0 33.0"]);

        let broken = dir.path().join("cohort_Roll.txt");
        fs::write(&broken, "1.0 abc\n").unwrap();
        assert!(ShapeValues::read(&broken).is_err());
    }

    #[test]
    fn test_write_flanking_sequences() {
        let dir = tempdir().unwrap();
        let csv = dir.path().join("cohort.csv");
        fs::write(
            &csv,
            "Ref_Flanking_Sequence,Mut_Flanking_Sequence\nacGTa,acTTa\n,\nCCCGG,CCAGG\n",
        )
        .unwrap();
        let out_dir = dir.path().join("sequences");
        ensure_dir(&out_dir).unwrap();

        let output = write_flanking_sequences(&csv, &out_dir, SequenceKind::Mutated).unwrap();
        assert_eq!(output, out_dir.join("cohort.txt"));
        assert_eq!(fs::read_to_string(&output).unwrap(), "ACTTA\n\nCCAGG\n");

        write_flanking_sequences(&csv, &out_dir, "REF".parse().unwrap()).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "ACGTA\n\nCCCGG\n");

        assert!("both".parse::<SequenceKind>().is_err());
    }
}
