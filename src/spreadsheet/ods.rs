use crate::error::ResultMessage;
use crate::error::SourceError;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::rows::QuotingMode;
use crate::rows::RowSource;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::criteria::SheetOptions;
use crate::spreadsheet::sheet::Sheet;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

/// ODS file MIME type identifier
const MIME_TYPE: &[u8] = b"application/vnd.oasis.opendocument.spreadsheet";
/// XML element name for spreadsheet root
const SPREADSHEET: QName = QName(b"office:spreadsheet");
/// XML element name for table (sheet)
const TABLE: QName = QName(b"table:table");
/// XML element name for table row
const TABLE_ROW: QName = QName(b"table:table-row");
/// XML element name for table cell
const TABLE_CELL: QName = QName(b"table:table-cell");
/// XML element name for covered table cell (merged cells)
const TABLE_COVERED_CELL: QName = QName(b"table:covered-table-cell");
/// XML element name for annotations (comments)
const ANNOTATION: QName = QName(b"office:annotation");
/// XML element name for paragraph text
const PARAGRAPH: QName = QName(b"text:p");
/// XML element name for string (space) text
const STRING: QName = QName(b"text:s");
const TAB: QName = QName(b"text:tab");
const LINE_BREAK: QName = QName(b"text:line-break");

/// Row source over one table of an OpenDocument spreadsheet (.ods).
///
/// Rows marked as repeated in the document are kept as a single run and
/// expanded one logical row per [`RowSource::next_row`] call. Cells are never
/// quoted, so the source reports [`QuotingMode::Lazy`].
#[derive(Debug)]
pub struct OdsSource {
    sheet: Option<Sheet>,
}

impl OdsSource {
    /// Opens the document at `path` and reads the table selected by `options`.
    pub fn open<P: AsRef<Path>>(path: P, options: &SheetOptions) -> Result<Self, SourceError> {
        let file_name = path.as_ref().to_string_lossy().to_string();
        let file = File::open(path.as_ref())
            .map_err(SourceError::from)
            .with_prefix(&file_name)?;
        Self::from_reader(BufReader::new(file), &file_name, options)
    }

    /// Reads a document from any seekable reader; `file_name` labels logs and `PasswordProtected`.
    pub fn from_reader<RS: Read + Seek>(reader: RS, file_name: &str, options: &SheetOptions) -> Result<Self, SourceError> {
        let sheet = read_document(reader, file_name, options)?;
        Ok(Self { sheet: Some(sheet) })
    }

    /// Name of the table being read, `None` once released.
    pub fn sheet_name(&self) -> Option<&str> {
        self.sheet.as_ref().map(|sheet| sheet.name.as_str())
    }
}

impl RowSource for OdsSource {
    fn next_row(&mut self) -> Result<Option<Vec<String>>, SourceError> {
        Ok(self.sheet.as_mut().and_then(Sheet::next))
    }

    fn release(&mut self) -> Result<(), SourceError> {
        if let Some(sheet) = self.sheet.take() {
            debug!(sheet = %sheet.name, "Released ods table");
        }
        Ok(())
    }

    fn quoting_mode(&self) -> QuotingMode {
        QuotingMode::Lazy
    }
}

fn read_document<RS: Read + Seek>(reader: RS, file_name: &str, options: &SheetOptions) -> Result<Sheet, SourceError> {
    let mut zip = ZipArchive::new(reader)?;
    check_mime(&mut zip)?;
    if is_password_protected(&mut zip)? {
        Err(SourceError::PasswordProtected(file_name.to_owned()))?;
    }

    let mut reader = zip.required_xml_reader("content.xml")?;
    let sheet = read_table(&mut reader, options)?;
    debug!(file = %file_name, sheet = %sheet.name, rows = sheet.len(), "Opened ods table");
    Ok(sheet)
}

/// Finds the selected `table:table` in `content.xml` and reads it.
fn read_table<R: BufRead>(reader: &mut XmlReader<R>, options: &SheetOptions) -> Result<Sheet, SourceError> {
    let mut table_index = 0usize;
    let mut selected = None::<String>;
    match_xml_events!(reader => {
        Event::End(event) if event.name() == SPREADSHEET => break,
        Event::Start(event) if event.name() == TABLE => {
            let name = event.get_attribute_value("table:name")?.unwrap_or_default();
            if options.sheet.accept(table_index, &name) {
                selected = Some(name.into_owned());
                break;
            }
            table_index += 1;
        }
    });

    let name = selected.ok_or_else(|| SourceError::InvalidSheetName(options.sheet.describe()))?;
    let mut sheet = Sheet::new(&name, options.range);
    read_rows(reader, &mut sheet)?;
    sheet.finish();
    Ok(sheet)
}

/// Reads the rows of the current table into `sheet`, up to the closing `table:table`.
fn read_rows<R: BufRead>(reader: &mut XmlReader<R>, sheet: &mut Sheet) -> Result<(), SourceError> {
    let mut cells = Vec::<Cell>::new();
    let mut row = 0usize;
    let mut col = 0usize;
    let mut row_count = 1usize;
    let mut col_count = 1usize;
    let mut kind = CellType::default();
    // Typed value attribute, used when the cell has no paragraph text
    let mut value = String::new();
    let mut text = String::new();
    let mut has_paragraph = false;
    let mut cell_context = false;
    let mut comment_context = false;
    let mut nested_tables = 0usize;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TABLE => nested_tables += 1,
        Event::End(event) if event.name() == TABLE => {
            if nested_tables == 0 {
                break;
            }
            nested_tables -= 1;
        }
        Event::Start(event) if nested_tables == 0 && event.name() == TABLE_ROW => {
            row_count = event.parse_attribute_value("table:number-rows-repeated")?.unwrap_or(1);
            col = 0;
            cells.clear();
        }
        Event::End(event) if nested_tables == 0 && event.name() == TABLE_ROW => {
            sheet.push(row, row_count, &cells);
            row = row
                .checked_add(row_count)
                .ok_or_else(|| SourceError::ParseAttributeValue(row_count.to_string()))?;
            if sheet.after_row_upper_bound(row) {
                break;
            }
        }
        Event::Start(event) if nested_tables == 0 && (event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL) => {
            col_count = event.parse_attribute_value("table:number-columns-repeated")?.unwrap_or(1);
            (kind, value) = typed_value(&event)?;
            text.clear();
            has_paragraph = false;
            cell_context = true;
        }
        Event::End(event) if nested_tables == 0 && (event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL) => {
            let (kind, value) = if text.is_empty() {
                (kind, value.as_str())
            } else {
                (CellType::InlineString, text.as_str())
            };
            if kind != CellType::Empty && !value.is_empty() {
                for col_number in col..col.saturating_add(col_count) {
                    if sheet.after_col_upper_bound(col_number) {
                        break;
                    }
                    cells.push(Cell {
                        row,
                        col: col_number,
                        kind,
                        value: value.to_owned(),
                    });
                }
            }
            col = col.saturating_add(col_count);
            cell_context = false;
            comment_context = false;
        }
        Event::Start(event) if cell_context && event.name() == ANNOTATION => comment_context = true,
        Event::End(event) if cell_context && event.name() == ANNOTATION => comment_context = false,
        Event::Start(event) if cell_context && !comment_context && event.name() == PARAGRAPH => {
            if has_paragraph {
                text.push('\n');
            }
            has_paragraph = true;
        }
        Event::Start(event) if cell_context && !comment_context && event.name() == STRING => {
            let count = event.parse_attribute_value("text:c")?.unwrap_or(1usize);
            text.push_str(&" ".repeat(count));
        }
        Event::Start(event) if cell_context && !comment_context && event.name() == TAB => text.push('\t'),
        Event::Start(event) if cell_context && !comment_context && event.name() == LINE_BREAK => text.push('\n'),
        Event::Text(event) if cell_context && !comment_context => text.push_bytes_text(&event)?,
        Event::GeneralRef(event) if cell_context && !comment_context => text.push_bytes_ref(&event)?,
    });
    Ok(())
}

/// Reads the cell type and the typed value attribute of a cell start element
fn typed_value(event: &BytesStart) -> Result<(CellType, String), SourceError> {
    let Some(value_type) = event.get_attribute_value("office:value-type")? else {
        return Ok((CellType::Empty, String::new()));
    };
    let (kind, attribute) = match value_type.as_ref() {
        "boolean" => {
            let value = event.get_attribute_value("office:boolean-value")?
                .map(|value| value != "false" && value != "0")
                .unwrap_or(false);
            return Ok((CellType::Boolean, if value { "1" } else { "0" }.to_owned()));
        }
        "date" => (CellType::IsoDateTime, "office:date-value"),
        "time" => (CellType::IsoDuration, "office:time-value"),
        "string" => (CellType::InlineString, "office:string-value"),
        _ => (CellType::Number, "office:value"),
    };
    let value = event.get_attribute_value(attribute)?.unwrap_or_default().into_owned();
    Ok((kind, value))
}

/// Validates the `mimetype` entry when the archive carries one
fn check_mime<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<(), SourceError> {
    if let Some(mut file) = zip.file("mimetype")? {
        let mut buffer = Vec::with_capacity(MIME_TYPE.len());
        file.read_to_end(&mut buffer)?;
        if buffer.trim_ascii() != MIME_TYPE {
            Err(SourceError::MimeType)?;
        }
    }
    Ok(())
}

/// Checks the manifest for encrypted entries
fn is_password_protected<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<bool, SourceError> {
    let mut reader = match zip.xml_reader("META-INF/manifest.xml")? {
        Some(reader) => reader,
        None => return Ok(false),
    };
    let mut in_file_entry = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == QName(b"manifest:file-entry") => in_file_entry = true,
        Event::End(event) if event.name() == QName(b"manifest:file-entry") => in_file_entry = false,
        Event::Start(event) if in_file_entry && event.name() == QName(b"manifest:encryption-data") => {
            return Ok(true);
        }
    });
    Ok(false)
}
