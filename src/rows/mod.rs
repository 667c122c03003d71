//! # Row Cursor
//!
//! Sequential, header-aware access to rows of raw text fields. A [`Rows`] cursor
//! pulls one row at a time from any [`RowSource`] (delimited text, Excel sheet,
//! OpenDocument table), resolves column names through the header row and hands
//! the raw fields to the typed accessors in [`accessor`].
use crate::error::SourceError;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, trace, warn};

pub(crate) mod accessor;
pub(crate) mod coercion;

/// Errors reported by the row cursor and its typed accessors.
///
/// Every accessor surfaces the most specific variant, so a missing column,
/// a blank field, a malformed value and an overflowing value stay
/// distinguishable at the call site.
#[derive(Error, Debug)]
pub enum RowsError {
    /// The cursor's row source has already been released
    #[error("Row source has been released")]
    NullCursor,

    /// The row source has no more rows
    #[error("End of data")]
    EndOfData,

    /// The row source failed to produce a row
    #[error("Read row failed: {0}")]
    Source(#[from] SourceError),

    /// Column name not present in the header, or no header established
    #[error("Unknown column '{name}'")]
    UnknownColumn { name: String },

    /// Position outside the current row
    #[error("Index {index} out of range for row of {len} fields")]
    IndexOutOfRange { index: isize, len: usize },

    /// Field resolved to no value under the coercion policy
    #[error("Null value at index {index}")]
    NullValue { index: usize },

    /// Non-empty value that does not parse as the requested type
    #[error("Parse '{value}' at index {index} to {target} failed")]
    Malformed {
        index: usize,
        value: String,
        target: &'static str,
        base: Option<u32>,
    },

    /// Value parses but does not fit the requested numeric width
    #[error("Value '{value}' at index {index} out of range for {target}")]
    OutOfRange {
        index: usize,
        value: String,
        target: &'static str,
    },
}

/// Discriminant of [`RowsError`], convenient for matching without context fields.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NullCursor,
    EndOfData,
    SourceError,
    UnknownColumn,
    IndexOutOfRange,
    NullValue,
    Malformed,
    OutOfRange,
}

impl RowsError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RowsError::NullCursor => ErrorKind::NullCursor,
            RowsError::EndOfData => ErrorKind::EndOfData,
            RowsError::Source(_) => ErrorKind::SourceError,
            RowsError::UnknownColumn { .. } => ErrorKind::UnknownColumn,
            RowsError::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            RowsError::NullValue { .. } => ErrorKind::NullValue,
            RowsError::Malformed { .. } => ErrorKind::Malformed,
            RowsError::OutOfRange { .. } => ErrorKind::OutOfRange,
        }
    }

    /// Returns true for the normal end-of-iteration signal.
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, RowsError::EndOfData)
    }
}

/// How a source has already handled quote characters in its raw fields.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum QuotingMode {
    /// Quote characters are literal text; fields are only trimmed
    #[default]
    Lazy,
    /// Standard quoting: blank fields are null and quoted literals are unquoted
    Strict,
}

/// Capability contract implemented by every tabular backend.
pub trait RowSource {
    /// Returns the next raw row, `Ok(None)` at end of data.
    fn next_row(&mut self) -> Result<Option<Vec<String>>, SourceError>;

    /// Releases the underlying resources. Must be idempotent.
    fn release(&mut self) -> Result<(), SourceError> {
        Ok(())
    }

    /// Quoting convention of the raw fields produced by this source.
    fn quoting_mode(&self) -> QuotingMode;
}

impl<S: RowSource + ?Sized> RowSource for &mut S {
    fn next_row(&mut self) -> Result<Option<Vec<String>>, SourceError> {
        (**self).next_row()
    }

    fn release(&mut self) -> Result<(), SourceError> {
        (**self).release()
    }

    fn quoting_mode(&self) -> QuotingMode {
        (**self).quoting_mode()
    }
}

impl<S: RowSource + ?Sized> RowSource for Box<S> {
    fn next_row(&mut self) -> Result<Option<Vec<String>>, SourceError> {
        (**self).next_row()
    }

    fn release(&mut self) -> Result<(), SourceError> {
        (**self).release()
    }

    fn quoting_mode(&self) -> QuotingMode {
        (**self).quoting_mode()
    }
}

/// Sequential cursor over the rows of a [`RowSource`].
///
/// In header mode the first row is consumed as column names, either lazily by
/// the first [`Rows::advance`] or explicitly by [`Rows::header`]. Once the source
/// is exhausted the cursor stays terminal and keeps the last row it fetched.
pub struct Rows<S> {
    /// Row source, `None` once released
    source: Option<S>,
    /// Quoting convention declared by the source
    quoting: QuotingMode,
    /// Whether the header row still has to be read
    header_pending: bool,
    /// Trimmed header fields
    header: Vec<String>,
    /// Lower-cased, trimmed column name to position
    columns: HashMap<String, usize>,
    /// Raw fields of the current row
    row: Vec<String>,
    /// Set once the source reported end of data
    terminal: bool,
}

impl<S: RowSource> Rows<S> {
    /// Creates a cursor over `source`, treating the first row as header when `header` is true.
    pub fn new(source: S, header: bool) -> Self {
        let quoting = source.quoting_mode();
        Self {
            source: Some(source),
            quoting,
            header_pending: header,
            header: Vec::new(),
            columns: HashMap::new(),
            row: Vec::new(),
            terminal: false,
        }
    }

    /// Quoting convention applied by the coercion policy.
    pub fn quoting_mode(&self) -> QuotingMode {
        self.quoting
    }

    /// Returns the trimmed header fields, reading the header row first if needed.
    ///
    /// Empty when header mode is off or the source had no rows at all.
    pub fn header(&mut self) -> Result<&[String], RowsError> {
        if self.header_pending {
            self.consume_header()?;
        }
        Ok(&self.header)
    }

    /// Moves to the next row.
    ///
    /// # Errors
    ///
    /// * `EndOfData` once the source is exhausted (and on every later call)
    /// * `Source` when the backend fails on this row; advancing again is allowed
    /// * `NullCursor` after [`Rows::close`]
    pub fn advance(&mut self) -> Result<(), RowsError> {
        if self.source.is_none() {
            return Err(RowsError::NullCursor);
        }
        if self.terminal {
            return Err(RowsError::EndOfData);
        }
        if self.header_pending {
            self.consume_header()?;
            if self.terminal {
                return Err(RowsError::EndOfData);
            }
        }

        let source = self.source.as_mut().ok_or(RowsError::NullCursor)?;
        match source.next_row() {
            Ok(Some(fields)) => {
                trace!(fields = fields.len(), "Fetched row");
                self.row = fields;
                Ok(())
            }
            Ok(None) => {
                self.terminal = true;
                Err(RowsError::EndOfData)
            }
            Err(error) => {
                self.row.clear();
                Err(RowsError::Source(error))
            }
        }
    }

    /// Moves to the next row, returning false at end of data.
    ///
    /// ```ignore
    /// while rows.read()? {
    ///     println!("{}", rows.column("name"));
    /// }
    /// ```
    pub fn read(&mut self) -> Result<bool, RowsError> {
        match self.advance() {
            Ok(()) => Ok(true),
            Err(RowsError::EndOfData) => Ok(false),
            Err(error) => Err(error),
        }
    }

    /// Raw fields of the current row, empty before the first row.
    pub fn row(&self) -> &[String] {
        &self.row
    }

    /// Returns true once the source reported end of data.
    pub fn is_finished(&self) -> bool {
        self.terminal
    }

    /// Resolves a column name to its position, ignoring case and surrounding whitespace.
    pub fn column_index(&self, name: &str) -> Result<usize, RowsError> {
        self.columns
            .get(&name.trim().to_lowercase())
            .copied()
            .ok_or_else(|| RowsError::UnknownColumn {
                name: name.to_owned(),
            })
    }

    /// Releases the row source. Later calls are no-ops.
    pub fn close(&mut self) -> Result<(), RowsError> {
        if let Some(mut source) = self.source.take() {
            source.release()?;
            debug!("Released row source");
        }
        Ok(())
    }

    /// Reads the header row and builds the column map. Duplicate names: last wins.
    fn consume_header(&mut self) -> Result<(), RowsError> {
        let source = self.source.as_mut().ok_or(RowsError::NullCursor)?;
        self.header_pending = false;
        match source.next_row()? {
            Some(fields) => {
                self.header = fields.iter().map(|field| field.trim().to_owned()).collect();
                for (index, name) in self.header.iter().enumerate() {
                    if let Some(previous) = self.columns.insert(name.to_lowercase(), index) {
                        warn!(column = %name, previous, index, "Duplicate header column, last one wins");
                    }
                }
                debug!(columns = self.header.len(), "Consumed header row");
            }
            None => {
                self.terminal = true;
                debug!("Source exhausted before header row");
            }
        }
        Ok(())
    }
}
