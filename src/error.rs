use thiserror::Error;

/// Faults reported by a row source while opening or reading its document.
/// Aggregates errors from the standard library, the parsing dependencies and the backend modules.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("{0}")]
    WithContext(String),

    // Standard library errors
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    ParseInt(#[from] std::num::ParseIntError),

    #[error("{0}")]
    StringEncoding(#[from] std::str::Utf8Error),

    #[error("{0}")]
    Pattern(#[from] glob::PatternError),

    // Third-party library errors
    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("{0}")]
    Regex(#[from] regex::Error),

    #[error("{0}")]
    Xml(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncoding(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    // Backend errors
    #[error("Invalid record at line {line}: {message}")]
    InvalidRecord { line: u64, message: String },

    #[error("Invalid sheet name '{0}'")]
    InvalidSheetName(String),

    #[error("Cannot detect file format for '{0}'")]
    InvalidFileFormat(String),

    #[error("Missing document part '{0}'")]
    MissingPart(String),

    #[error("Invalid ODS MIME type")]
    MimeType,

    #[error("Spreadsheet '{0}' is password protected")]
    PasswordProtected(String),

    #[error("Invalid range format '{0}'")]
    InvalidRange(String),

    #[error("Parse entity '{0}' failed")]
    ParseEntity(String),

    #[error("Parse attribute value '{0}' failed")]
    ParseAttributeValue(String),
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, SourceError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| SourceError::WithContext(format!("{}: {}", message, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_prefix_wraps_message() {
        let result: Result<(), SourceError> = Err(SourceError::MimeType);
        let error = result.with_prefix("planets.ods").unwrap_err();
        assert_eq!(error.to_string(), "planets.ods: Invalid ODS MIME type");
    }

    #[test]
    fn with_prefix_keeps_ok() {
        let result: Result<u8, SourceError> = Ok(7);
        assert_eq!(result.with_prefix("ignored").unwrap(), 7);
    }
}
