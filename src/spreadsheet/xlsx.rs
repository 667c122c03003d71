use crate::error::ResultMessage;
use crate::error::SourceError;
use crate::helpers::xml::XmlAttributeHelper;
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
use crate::spreadsheet::excel;
use crate::spreadsheet::excel::load_relationships;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::sheet::Sheet;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

// XML tag names for parsing Excel XLSX format
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts"); // Custom number formats container
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");   // Individual custom number format
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");  // Cell format indexes container
const TAG_FORMAT_INDEX: QName = QName(b"xf");         // Individual cell format index
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");   // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");       // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t");                  // Text content within strings
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr"); // Workbook properties
const TAG_SHEET: QName = QName(b"sheet");             // Worksheet definition
const TAG_ROW: QName = QName(b"row");                 // Row in worksheet
const TAG_CELL: QName = QName(b"c");                  // Cell in worksheet
const TAG_INLINE_STRING: QName = QName(b"is");        // Inline string value
const TAG_VALUE: QName = QName(b"v");                 // Cell value content

/// Row source over one worksheet of an Excel 2007+ workbook (.xlsx, .xlsm, .xlam).
///
/// The selected sheet is read and rendered to text when the source is opened;
/// [`RowSource::next_row`] then hands out one dense row at a time. Cells are
/// never quoted, so the source reports [`QuotingMode::Lazy`].
#[derive(Debug)]
pub struct XlsxSource {
    sheet: Option<Sheet>,
}

impl XlsxSource {
    /// Opens the workbook at `path` and reads the sheet selected by `options`.
    pub fn open<P: AsRef<Path>>(path: P, options: &SheetOptions) -> Result<Self, SourceError> {
        let file_name = path.as_ref().to_string_lossy().to_string();
        let file = File::open(path.as_ref())
            .map_err(SourceError::from)
            .with_prefix(&file_name)?;
        Self::from_reader(BufReader::new(file), &file_name, options)
    }

    /// Reads a workbook from any seekable reader; `file_name` labels logs and `PasswordProtected`.
    pub fn from_reader<RS: Read + Seek>(reader: RS, file_name: &str, options: &SheetOptions) -> Result<Self, SourceError> {
        let sheet = read_workbook(reader, file_name, options)?;
        Ok(Self { sheet: Some(sheet) })
    }

    /// Name of the sheet being read, `None` once released.
    pub fn sheet_name(&self) -> Option<&str> {
        self.sheet.as_ref().map(|sheet| sheet.name.as_str())
    }
}

impl RowSource for XlsxSource {
    fn next_row(&mut self) -> Result<Option<Vec<String>>, SourceError> {
        Ok(self.sheet.as_mut().and_then(Sheet::next))
    }

    fn release(&mut self) -> Result<(), SourceError> {
        if let Some(sheet) = self.sheet.take() {
            debug!(sheet = %sheet.name, "Released xlsx sheet");
        }
        Ok(())
    }

    fn quoting_mode(&self) -> QuotingMode {
        QuotingMode::Lazy
    }
}

fn read_workbook<RS: Read + Seek>(reader: RS, file_name: &str, options: &SheetOptions) -> Result<Sheet, SourceError> {
    let mut zip = excel::open(reader, file_name)?;
    let (sheets, is_1904) = load_workbook(&mut zip)?;
    let (sheet_name, zip_path) = sheets
        .into_iter()
        .enumerate()
        .find(|(index, (name, _))| options.sheet.accept(*index, name))
        .map(|(_, sheet)| sheet)
        .ok_or_else(|| SourceError::InvalidSheetName(options.sheet.describe()))?;
    let number_formats = load_number_formats(&mut zip, is_1904)?;
    let shared_strings = load_shared_strings(&mut zip)?;

    let mut sheet = Sheet::new(&sheet_name, options.range);
    let mut reader = zip.required_xml_reader(&zip_path)?;
    read_cells(&mut reader, &mut sheet, &number_formats, &shared_strings)?;
    sheet.finish();
    debug!(file = %file_name, sheet = %sheet.name, rows = sheet.len(), "Opened xlsx sheet");
    Ok(sheet)
}

/// Streams the cells of a worksheet part into `sheet`, one `<row>` at a time.
fn read_cells<R: BufRead>(
    reader: &mut XmlReader<R>,
    sheet: &mut Sheet,
    number_formats: &[CellType],
    shared_strings: &[String],
) -> Result<(), SourceError> {
    let mut cells = Vec::<Cell>::new();
    let mut row_count = 0usize;
    let mut col_count = 0usize;
    let mut row = 0usize;
    let mut col = 0usize;
    let mut kind = CellType::default();
    let mut value = String::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_ROW => {
            row = event.parse_attribute_value::<usize>("r")?
                .and_then(|number| number.checked_sub(1))
                .unwrap_or(row_count);
            if sheet.after_row_upper_bound(row) {
                break;
            }
            cells.clear();
            col_count = 0;
        }
        Event::End(event) if event.name() == TAG_ROW => {
            sheet.push(row, 1, &cells);
            row += 1;
            row_count = row;
        }
        Event::Start(event) if event.name() == TAG_CELL => {
            (row, col) = event.get_attribute_value("r")?
                .and_then(|reference| reference_to_index(&reference))
                .unwrap_or((row, col_count));
            col_count = col + 1;
            value.clear();
            kind = event.get_attribute_value("t")?.map(|t| {
                match t.as_ref() {
                    "inlineStr" | "str" => CellType::InlineString,
                    "s" => CellType::SharedString,
                    "d" => CellType::IsoDateTime,
                    "b" => CellType::Boolean,
                    "e" => CellType::Error,
                    _ => CellType::Number,
                }
            }).unwrap_or(CellType::Number);
            if let Some(format_id) = event.get_attribute_value("s")? {
                if kind == CellType::Number && !format_id.is_empty() {
                    let index = format_id.parse::<usize>()?;
                    kind = number_formats.get(index).copied().unwrap_or(CellType::Number);
                }
            }
            if sheet.after_col_upper_bound(col) {
                kind = CellType::Empty;
            }
        }
        Event::Start(event) if kind != CellType::Empty && event.name() == TAG_INLINE_STRING => {
            value = read_string_value(reader, TAG_INLINE_STRING, false)?;
        }
        Event::Start(event) if kind != CellType::Empty && event.name() == TAG_VALUE => {
            value = read_string_value(reader, TAG_VALUE, true)?;
        }
        Event::End(event) if kind != CellType::Empty && event.name() == TAG_CELL => {
            if kind == CellType::SharedString {
                let index = value.parse::<usize>()?;
                value = shared_strings
                    .get(index)
                    .cloned()
                    .ok_or_else(|| SourceError::WithContext(format!("Shared string {index} not found")))?;
            }
            if !value.is_empty() {
                cells.push(Cell {
                    row,
                    col,
                    kind,
                    value: std::mem::take(&mut value),
                });
            }
            kind = CellType::Empty;
        }
    });
    Ok(())
}

/// Loads the sheet list (name, zip path) and the date system from `xl/workbook.xml`
fn load_workbook<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<(Vec<(String, String)>, bool), SourceError> {
    let relationships = load_relationships(zip, "xl/_rels/workbook.xml.rels")?;
    let mut reader = zip.required_xml_reader("xl/workbook.xml")?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.get_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.get_value()?);
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(id.as_ref()) {
                    sheets.push((name.to_string(), path.to_owned()));
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event.get_attribute_value("date1904")?
                .map(|value| value.eq("1") || value.eq("true"))
                .unwrap_or(false);
        }
    });
    Ok((sheets, is_1904))
}

/// Loads the cell style table from `xl/styles.xml`, one cell type per style index
fn load_number_formats<RS: Read + Seek>(zip: &mut ZipArchive<RS>, is_1904: bool) -> Result<Vec<CellType>, SourceError> {
    let mut reader = match zip.xml_reader("xl/styles.xml")? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut has_custom_formats = false;
    let mut custom_formats_context = false;
    let mut custom_formats = HashMap::<String, CellType>::new();

    let mut has_format_indexes = false;
    let mut format_indexes_context = false;
    let mut format_indexes = Vec::<String>::new();

    match_xml_events!(reader => {
        Event::Start(event) if !custom_formats_context && event.name() == TAG_CUSTOM_FORMATS => {
            has_custom_formats = true;
            custom_formats_context = true;
        }
        Event::End(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMATS => {
            custom_formats_context = false;
            if has_custom_formats && has_format_indexes {
                break;
            }
        }
        Event::Start(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let format = event.get_attribute_value("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                let style = CellType::parse_custom_number_format(&format, is_1904);
                custom_formats.insert(id.to_string(), style);
            }
        }

        Event::Start(event) if !format_indexes_context && event.name() == TAG_FORMAT_INDEXES => {
            has_format_indexes = true;
            format_indexes_context = true;
        }
        Event::End(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEXES => {
            format_indexes_context = false;
            if has_custom_formats && has_format_indexes {
                break;
            }
        }
        Event::Start(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEX => {
            if let Some(id) = event.get_attribute_value("numFmtId")? {
                format_indexes.push(id.to_string());
            }
        }
    });

    Ok(excel::load_number_formats(format_indexes, custom_formats, is_1904))
}

/// Loads the shared string table from `xl/sharedStrings.xml`
fn load_shared_strings<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<Vec<String>, SourceError> {
    let mut shared_strings = Vec::<String>::new();
    let mut reader = match zip.xml_reader("xl/sharedStrings.xml")? {
        Some(reader) => reader,
        None => return Ok(shared_strings),
    };

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
            let string = read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?;
            shared_strings.push(string);
        }
    });
    Ok(shared_strings)
}

/// Reads string content up to `end_tag`, skipping phonetic annotations.
/// `is_text_content` treats the content as text without a surrounding `<t>`.
fn read_string_value<R: BufRead>(
    reader: &mut XmlReader<R>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, SourceError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_bytes_text(&event)?,
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}
