//! # Spreadsheet Sources
//!
//! Row sources over Excel 2007+ workbooks (`.xlsx`, `.xlsm`, `.xlam`) and
//! OpenDocument spreadsheets (`.ods`). Both read one sheet, selected through
//! [`SheetOptions`], render every cell to text and hand out dense rows:
//! missing cells become empty fields and missing rows become empty rows.
//!
//! ```ignore
//! let options = SheetOptions::default().with_sheet_name("Planets");
//! let mut rows = Rows::new(spreadsheet::open("planets.xlsx", &options)?, true);
//! while rows.read()? {
//!     println!("{}", rows.column("name"));
//! }
//! ```
mod cell;
mod criteria;
mod excel;
mod ods;
mod range;
mod reference;
mod sheet;
mod xlsx;

pub use criteria::SheetOptions;
pub use criteria::SheetSelector;
pub use ods::OdsSource;
pub use range::Range;
pub use xlsx::XlsxSource;

use crate::error::SourceError;
use crate::rows::QuotingMode;
use crate::rows::RowSource;
use std::ffi::OsStr;
use std::path::Path;

/// Sheet source picked by file extension.
#[derive(Debug)]
pub enum SheetSource {
    Xlsx(XlsxSource),
    Ods(OdsSource),
}

/// Opens the sheet selected by `options`, choosing the backend from the file extension.
///
/// # Errors
///
/// * `InvalidFileFormat` for extensions other than `xlsx`, `xlsm`, `xlam` and `ods`
/// * `InvalidSheetName` when no sheet matches `options.sheet`
/// * `PasswordProtected` for encrypted documents
pub fn open<P: AsRef<Path>>(path: P, options: &SheetOptions) -> Result<SheetSource, SourceError> {
    let extension = path
        .as_ref()
        .extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("xlsx") | Some("xlsm") | Some("xlam") => Ok(SheetSource::Xlsx(XlsxSource::open(path, options)?)),
        Some("ods") => Ok(SheetSource::Ods(OdsSource::open(path, options)?)),
        _ => Err(SourceError::InvalidFileFormat(path.as_ref().to_string_lossy().to_string())),
    }
}

impl SheetSource {
    /// Name of the sheet being read, `None` once released.
    pub fn sheet_name(&self) -> Option<&str> {
        match self {
            Self::Xlsx(source) => source.sheet_name(),
            Self::Ods(source) => source.sheet_name(),
        }
    }
}

impl RowSource for SheetSource {
    fn next_row(&mut self) -> Result<Option<Vec<String>>, SourceError> {
        match self {
            Self::Xlsx(source) => source.next_row(),
            Self::Ods(source) => source.next_row(),
        }
    }

    fn release(&mut self) -> Result<(), SourceError> {
        match self {
            Self::Xlsx(source) => source.release(),
            Self::Ods(source) => source.release(),
        }
    }

    fn quoting_mode(&self) -> QuotingMode {
        match self {
            Self::Xlsx(source) => source.quoting_mode(),
            Self::Ods(source) => source.quoting_mode(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_extension() {
        for name in ["planets.csv", "planets", "planets.xls"] {
            match open(name, &SheetOptions::default()) {
                Err(SourceError::InvalidFileFormat(path)) => assert_eq!(path, name),
                other => panic!("unexpected result {other:?}"),
            }
        }
    }

    #[test]
    fn missing_file_names_the_path() {
        let error = open("no/such/planets.XLSX", &SheetOptions::default()).unwrap_err();
        assert!(error.to_string().starts_with("no/such/planets.XLSX: "), "{error}");
    }
}
