use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::de::DeserializeOwned;

use crate::error::{ColumnError, FileError, MutshapeError, ParseError};

/// An ordered CSV table with a header line
///
/// Cells are kept as text, so columns that are not touched are written back
/// exactly as they were read. Missing values are empty cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: &str, headers: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            headers,
            rows: Vec::new(),
        }
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, FileError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| FileError::io(Some(path), e))?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| FileError::csv(Some(path), e))?
            .iter()
            .map(|h| h.to_string())
            .collect();
        let mut table = Self::new(&path.display().to_string(), headers);
        for record_result in reader.records() {
            let record = record_result.map_err(|e| FileError::csv(Some(path), e))?;
            table.push_row(record.iter().map(|c| c.to_string()).collect());
        }
        Ok(table)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), FileError> {
        let path = path.as_ref();
        let mut writer = WriterBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| FileError::csv(Some(path), e))?;
        writer
            .write_record(&self.headers)
            .map_err(|e| FileError::csv(Some(path), e))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|e| FileError::csv(Some(path), e))?;
        }
        writer.flush().map_err(|e| FileError::io(Some(path), e))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row. Short rows are padded with missing values.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        if row.len() < self.headers.len() {
            row.resize(self.headers.len(), String::new());
        }
        self.rows.push(row);
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    pub fn require_column(&self, column: &str) -> Result<usize, ColumnError> {
        self.column_index(column)
            .ok_or_else(|| ColumnError::new(&self.name, column))
    }

    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows[row].get(column).map(|c| c.as_str()).unwrap_or("")
    }

    /// All cells of a column, in row order
    pub fn column(&self, column: &str) -> Result<Vec<&str>, ColumnError> {
        let idx = self.require_column(column)?;
        Ok((0..self.rows.len()).map(|row| self.cell(row, idx)).collect())
    }

    /// Parse a column of the table into numbers of type `T`
    pub fn parse_column<T: std::str::FromStr>(&self, column: &str) -> Result<Vec<T>, MutshapeError> {
        let idx = self.require_column(column)?;
        let mut result = Vec::with_capacity(self.rows.len());
        for row in 0..self.rows.len() {
            let cell = self.cell(row, idx);
            match cell.trim().parse::<T>() {
                Ok(value) => result.push(value),
                Err(_) => {
                    return Err(ParseError::row(column, row, "a number", cell.to_string()).into())
                }
            }
        }
        Ok(result)
    }

    /// Return the index of `column`, appending an empty column if it does not exist yet
    pub fn ensure_column(&mut self, column: &str) -> usize {
        match self.column_index(column) {
            Some(idx) => idx,
            None => {
                self.headers.push(column.to_string());
                for row in &mut self.rows {
                    row.resize(self.headers.len(), String::new());
                }
                self.headers.len() - 1
            }
        }
    }

    pub fn set_cell(&mut self, row: usize, column: usize, value: String) {
        let cells = &mut self.rows[row];
        if cells.len() <= column {
            cells.resize(column + 1, String::new());
        }
        cells[column] = value;
    }

    /// Replace the values of `column` (or add it) with one value per row
    ///
    /// `None` is written as a missing value. If fewer values than rows are
    /// given, the remaining rows keep their old value.
    pub fn set_column<I, S>(&mut self, column: &str, values: I)
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let idx = self.ensure_column(column);
        for (row, value) in values.into_iter().enumerate().take(self.rows.len()) {
            self.set_cell(row, idx, value.map(Into::into).unwrap_or_default());
        }
    }

    /// Keep only the rows for which `keep` returns `true`
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[String]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }

    /// Deserialize every row into a typed record. Columns that the record does not name are ignored.
    pub fn records<T: DeserializeOwned>(&self) -> Result<Vec<T>, MutshapeError> {
        let headers = StringRecord::from(self.headers.clone());
        let mut result = Vec::with_capacity(self.rows.len());
        for (i, row) in self.rows.iter().enumerate() {
            let record = StringRecord::from(row.clone());
            let item = record.deserialize(Some(&headers)).map_err(|e| {
                // line 1 is the header
                ParseError::file(PathBuf::from(&self.name), i + 2, "a well-formed record", e.to_string())
            })?;
            result.push(item);
        }
        Ok(result)
    }
}
