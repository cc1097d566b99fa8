use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
#[error("Expected {expected} {location} but observed: {observed}")]
pub struct ParseError {
    expected: &'static str,
    observed: String,
    location: Location,
}

#[derive(Debug)]
pub enum Location {
    Unknown,
    File { path: PathBuf, line: usize },
    Row { column: String, index: usize },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Unknown => write!(f, "at unknown location"),
            Location::File { path, line } => {
                write!(f, "in file {} on line {}", path.as_path().display(), line)
            }
            Location::Row { column, index } => {
                write!(f, "in column {} of row {}", column, index)
            }
        }
    }
}

impl ParseError {
    pub fn somewhere(expected: &'static str, observed: String) -> Self {
        Self {
            expected,
            observed,
            location: Location::Unknown,
        }
    }

    pub fn file(path: PathBuf, line: usize, expected: &'static str, observed: String) -> Self {
        let location = Location::File { path, line };
        Self {
            observed,
            expected,
            location,
        }
    }

    pub fn row(column: &str, index: usize, expected: &'static str, observed: String) -> Self {
        let location = Location::Row {
            column: column.to_string(),
            index,
        };
        Self {
            observed,
            expected,
            location,
        }
    }
}

#[derive(Debug, Error)]
pub struct FileError {
    path: Option<PathBuf>,
    #[source]
    source: FileErrorSource,
}

impl FileError {
    pub fn io<P: AsRef<Path>>(path: Option<P>, error: std::io::Error) -> Self {
        Self {
            path: path.map(|p| p.as_ref().to_path_buf()),
            source: error.into(),
        }
    }

    pub fn parse<P: AsRef<Path>>(path: Option<P>, error: ParseError) -> Self {
        Self {
            path: path.map(|p| p.as_ref().to_path_buf()),
            source: error.into(),
        }
    }

    pub fn csv<P: AsRef<Path>>(path: Option<P>, error: csv::Error) -> Self {
        Self {
            path: path.map(|p| p.as_ref().to_path_buf()),
            source: error.into(),
        }
    }

    pub fn genome<P: AsRef<Path>>(path: Option<P>, message: String) -> Self {
        Self {
            path: path.map(|p| p.as_ref().to_path_buf()),
            source: FileErrorSource::Genome { message },
        }
    }
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "Failed to work with file {}", path.display()),
            None => write!(f, "Failed to work with anonymous file"),
        }
    }
}

#[derive(Debug, Error)]
pub enum FileErrorSource {
    #[error("Failed to parse file")]
    Parse {
        #[from]
        source: ParseError,
    },
    #[error("Failed to read/write to file")]
    IO {
        #[from]
        source: std::io::Error,
    },
    #[error("Malformed CSV table")]
    Csv {
        #[from]
        source: csv::Error,
    },
    #[error("Unreadable reference genome: {message}")]
    Genome { message: String },
}

/// Row-scoped failure of the sequence context derivation.
///
/// None of these abort a batch. The caller records a missing value for the
/// affected row and carries on with the next one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("Chromosome {0} is not part of the reference genome")]
    NotFound(String),
    #[error("Expected a sequence window of {expected} bases but got {observed}")]
    Invalid { expected: usize, observed: usize },
    #[error("Unknown base: {0:?}")]
    UnknownBase(String),
}

impl ContextError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Invalid { .. } => "invalid",
            Self::UnknownBase(_) => "unknown_base",
        }
    }
}

#[derive(Debug, Error)]
#[error("Table {table} is missing the required column {column}")]
pub struct ColumnError {
    table: String,
    column: String,
}

impl ColumnError {
    pub fn new(table: &str, column: &str) -> Self {
        Self {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}

/// Catch-all error for top-level API
#[derive(Debug, Error)]
pub enum MutshapeError {
    #[error(transparent)]
    ParseError(#[from] ParseError),
    #[error(transparent)]
    FileError(#[from] FileError),
    #[error(transparent)]
    ColumnError(#[from] ColumnError),
    #[error("{0}")]
    Mismatch(String),
}
