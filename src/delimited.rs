//! # Delimited Text Source
//!
//! Row source over comma, tab or otherwise delimited text, built on the `csv`
//! tokenizer. The cursor owns header handling, so every record (the header
//! line included) is handed out as a plain row.
use crate::error::ResultMessage;
use crate::error::SourceError;
use crate::rows::QuotingMode;
use crate::rows::RowSource;
use csv::ByteRecord;
use csv::ReaderBuilder;
use csv::Trim;
use encoding_rs::Encoding;
use encoding_rs::UTF_8;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Field count policy applied to every record.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FieldsPerRecord {
    /// Records may have any number of fields
    #[default]
    Variable,
    /// Every record must have as many fields as the first one
    FirstRecord,
    /// Every record must have exactly this many fields
    Exact(usize),
}

/// Options for parsing delimited text.
#[derive(Copy, Clone, Debug)]
pub struct CsvOptions {
    /// Field delimiter (default: comma)
    pub delimiter: u8,
    /// Quoting convention reported to the cursor (default: lazy)
    pub quoting: QuotingMode,
    /// Whether to trim whitespace around fields (default: true)
    pub trim_fields: bool,
    pub fields_per_record: FieldsPerRecord,
    /// Text encoding of the input (default: UTF-8)
    pub encoding: &'static Encoding,
    /// Lines starting with this byte are skipped
    pub comment: Option<u8>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quoting: QuotingMode::Lazy,
            trim_fields: true,
            fields_per_record: FieldsPerRecord::Variable,
            encoding: UTF_8,
            comment: None,
        }
    }
}

impl CsvOptions {
    /// Tab-separated values
    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            ..Default::default()
        }
    }

    /// Strict quoting: the cursor treats blank fields as null and unquotes leftover quoted text
    pub fn strict() -> Self {
        Self {
            quoting: QuotingMode::Strict,
            ..Default::default()
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_quoting(mut self, quoting: QuotingMode) -> Self {
        self.quoting = quoting;
        self
    }

    pub fn with_trim_fields(mut self, trim_fields: bool) -> Self {
        self.trim_fields = trim_fields;
        self
    }

    pub fn with_fields_per_record(mut self, fields_per_record: FieldsPerRecord) -> Self {
        self.fields_per_record = fields_per_record;
        self
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_comment(mut self, comment: Option<u8>) -> Self {
        self.comment = comment;
        self
    }
}

/// Row source over delimited text read from `R`.
pub struct CsvSource<R: Read> {
    /// Tokenizer, `None` once released
    reader: Option<csv::Reader<R>>,
    record: ByteRecord,
    options: CsvOptions,
    /// Field count every record must match, fixed by the policy or the first record
    expected_fields: Option<usize>,
    /// Whether the next record is the first one of the input
    first_record: bool,
}

impl CsvSource<File> {
    /// Opens the file at `path`.
    pub fn open<P: AsRef<Path>>(path: P, options: CsvOptions) -> Result<Self, SourceError> {
        let file_name = path.as_ref().to_string_lossy().to_string();
        let file = File::open(path.as_ref())
            .map_err(SourceError::from)
            .with_prefix(&file_name)?;
        debug!(file = %file_name, delimiter = %char::from(options.delimiter), quoting = ?options.quoting, "Opened delimited text");
        Ok(Self::new(file, options))
    }
}

impl<R: Read> CsvSource<R> {
    /// Wraps any reader; the `csv` tokenizer buffers it internally.
    ///
    /// Quoted fields are parsed in both modes. Stray quotes inside an unquoted
    /// field are kept as text.
    pub fn new(reader: R, options: CsvOptions) -> Self {
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(options.delimiter)
            .quoting(true)
            .double_quote(true)
            .comment(options.comment)
            .trim(if options.trim_fields { Trim::All } else { Trim::None })
            .from_reader(reader);
        let expected_fields = match options.fields_per_record {
            FieldsPerRecord::Exact(count) => Some(count),
            FieldsPerRecord::Variable | FieldsPerRecord::FirstRecord => None,
        };
        Self {
            reader: Some(reader),
            record: ByteRecord::new(),
            options,
            expected_fields,
            first_record: true,
        }
    }

    /// Rejects a record whose field count breaks the configured policy.
    fn check_field_count(&mut self, line: u64) -> Result<(), SourceError> {
        let count = self.record.len();
        if self.options.fields_per_record == FieldsPerRecord::FirstRecord && self.expected_fields.is_none() {
            self.expected_fields = Some(count);
        }
        match self.expected_fields {
            Some(expected) if expected != count => Err(SourceError::InvalidRecord {
                line,
                message: format!("expected {expected} fields, found {count}"),
            }),
            _ => Ok(()),
        }
    }

    /// Decodes the current record with the configured encoding.
    fn decode(&self, strip_bom: bool) -> Vec<String> {
        self.record
            .iter()
            .enumerate()
            .map(|(index, field)| {
                let (text, _) = if strip_bom && index == 0 {
                    self.options.encoding.decode_with_bom_removal(field)
                } else {
                    self.options.encoding.decode_without_bom_handling(field)
                };
                text.into_owned()
            })
            .collect()
    }
}

impl<R: Read> RowSource for CsvSource<R> {
    fn next_row(&mut self) -> Result<Option<Vec<String>>, SourceError> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };
        if !reader.read_byte_record(&mut self.record)? {
            return Ok(None);
        }

        let strip_bom = std::mem::replace(&mut self.first_record, false);
        let line = self.record.position().map(|position| position.line()).unwrap_or(0);
        self.check_field_count(line)?;
        Ok(Some(self.decode(strip_bom)))
    }

    fn release(&mut self) -> Result<(), SourceError> {
        if self.reader.take().is_some() {
            debug!("Released delimited text reader");
        }
        Ok(())
    }

    fn quoting_mode(&self) -> QuotingMode {
        self.options.quoting
    }
}
