//! # Rusty Rows
//!
//! Typed, header-addressable row cursor over tabular sources: delimited text
//! (CSV, TSV and friends), Excel 2007+ workbooks and OpenDocument spreadsheets.
//!
//! ## Features
//!
//! - **One cursor for every format**: [`Rows`] wraps any [`RowSource`] and hands
//!   out one row of raw text fields at a time
//! - **Header addressing**: columns are looked up by name, case-insensitively
//! - **Typed accessors**: booleans, floats and integers in any base from 2 to 36,
//!   each with a nullable variant that maps blank fields to `None`
//! - **Quoting policies**: strict sources treat quoted text as quoted, lazy ones keep
//!   quote characters as literal text
//! - **Spreadsheet rendering**: dates, times, durations and booleans are rendered to
//!   text the way the spreadsheet displays them
//!
//! ```ignore
//! use rusty_rows::{CsvOptions, CsvSource, Rows};
//!
//! let mut rows = Rows::new(CsvSource::open("planets.csv", CsvOptions::strict())?, true);
//! while rows.read()? {
//!     let name = rows.column_string("name")?;
//!     let moons = rows.column_nullable_i64("moons", 10)?;
//!     println!("{name}: {moons:?}");
//! }
//! rows.close()?;
//! ```
mod delimited;
mod error;
mod helpers;
mod rows;
pub mod spreadsheet;

pub use delimited::CsvOptions;
pub use delimited::CsvSource;
pub use delimited::FieldsPerRecord;
pub use error::SourceError;
pub use rows::ErrorKind;
pub use rows::QuotingMode;
pub use rows::RowSource;
pub use rows::Rows;
pub use rows::RowsError;
pub use spreadsheet::SheetOptions;
pub use spreadsheet::SheetSelector;
pub use spreadsheet::SheetSource;
