use crate::error::SourceError;
use crate::spreadsheet::reference::index_to_reference;
use chrono::Duration;
use chrono::NaiveDate;
use iso8601_duration::Duration as IsoDuration;
use std::fmt::Display;
use tracing::warn;

/// Types of cell data in spreadsheet files.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values stored as `1`/`0`
    Boolean,
    /// Numeric values
    Number,
    /// Date/time values stored as numbers from 1900 epoch
    NumberDateTime1900,
    /// Date values stored as numbers from 1900 epoch
    NumberDate1900,
    /// Time values stored as numbers from 1900 epoch
    NumberTime1900,
    /// Date/time values stored as numbers from 1904 epoch
    NumberDateTime1904,
    /// Date values stored as numbers from 1904 epoch
    NumberDate1904,
    /// Time values stored as numbers from 1904 epoch
    NumberTime1904,
    /// ISO 8601 date/time strings
    IsoDateTime,
    /// ISO 8601 duration strings
    IsoDuration,
    /// Inline string values
    InlineString,
    /// Shared string values, already resolved from the string table
    SharedString,
    /// Error literals such as `#DIV/0!`
    Error,
}

impl CellType {
    /// Parses built-in Excel number format IDs to determine cell type.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }),
            "14" | "15" | "16" | "17" => Some(if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 }),
            _ => None,
        }
    }

    /// Parses custom number format strings to determine cell type.
    /// Analyzes format codes for date/time patterns.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_date = false;
        let mut is_time = false;
        let mut is_color = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' if !is_escaped => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_literal && !is_color => is_literal = true,

                ']' if is_color => is_color = false,
                '[' if !is_color && !is_literal => is_color = true,
                _ if is_literal || is_color => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time, is_1904) {
            (true, true, false) => Self::NumberDateTime1900,
            (true, true, true) => Self::NumberDateTime1904,
            (true, false, false) => Self::NumberDate1900,
            (true, false, true) => Self::NumberDate1904,
            (false, true, false) => Self::NumberTime1900,
            (false, true, true) => Self::NumberTime1904,
            (false, false, _) => Self::Number,
        }
    }
}

/// A single populated cell with its position, type and stored value.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    pub(crate) kind: CellType,
    /// Value as stored in the document
    pub(crate) value: String,
}

impl Cell {
    /// Returns the Excel-style cell reference (e.g., "A1", "B2").
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    fn render(&self) -> Result<String, SourceError> {
        let text = match self.kind {
            CellType::Boolean => if self.value == "1" { "TRUE" } else { "FALSE" }.to_owned(),
            CellType::NumberDateTime1900 => to_datetime_string(&self.value, false)?,
            CellType::NumberDateTime1904 => to_datetime_string(&self.value, true)?,
            CellType::NumberDate1900 => to_date_string(&self.value, false)?,
            CellType::NumberDate1904 => to_date_string(&self.value, true)?,
            CellType::NumberTime1900 | CellType::NumberTime1904 => to_time_string(&self.value)?,
            CellType::IsoDateTime => self.value.replace('T', " "),
            CellType::IsoDuration => to_duration_string(&self.value)?,
            _ => self.value.to_owned(),
        };
        Ok(text)
    }
}

impl Display for Cell {
    /// Renders the value as text; a value that does not fit its format is shown as stored.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.render() {
            Ok(text) => f.write_str(&text),
            Err(error) => {
                warn!(cell = %self.reference(), value = %self.value, %error, "Render cell failed, keep stored value");
                f.write_str(&self.value)
            }
        }
    }
}

/// Converts Excel numeric date to ISO date string.
/// Handles Lotus 1-2-3 leap year bug for 1900 epoch.
fn to_date_string(value: &str, is_1904: bool) -> Result<String, SourceError> {
    let days = parse_serial(value)?.trunc() as i64;
    let offset = if is_1904 {
        1462
    } else if days < 60 {
        1
    } else {
        0
    };
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|epoch| Duration::try_days(days + offset).and_then(|duration| epoch.checked_add_signed(duration)))
        .map(|date| date.format("%Y-%m-%d").to_string())
        .ok_or_else(|| SourceError::WithContext(format!("Date serial '{value}' out of range")))
}

/// Converts the fractional part of an Excel serial to an ISO time string.
fn to_time_string(value: &str) -> Result<String, SourceError> {
    let fraction = parse_serial(value)?.fract();
    let mut remainder = (fraction * 86_400_000f64).round() as i64;
    let milliseconds = remainder % 1_000;
    remainder /= 1_000;
    let seconds = remainder % 60;
    remainder /= 60;
    let minutes = remainder % 60;
    let hours = remainder / 60;
    let time = if milliseconds > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    };
    Ok(time)
}

/// Converts Excel numeric datetime to ISO datetime string.
fn to_datetime_string(value: &str, is_1904: bool) -> Result<String, SourceError> {
    let date = to_date_string(value, is_1904)?;
    let time = to_time_string(value)?;
    Ok(format!("{date} {time}"))
}

/// Converts an ISO 8601 duration (`PT10H30M05S`) to clock notation.
fn to_duration_string(value: &str) -> Result<String, SourceError> {
    let duration = value
        .parse::<IsoDuration>()
        .map_err(|_| SourceError::WithContext(format!("Parse '{value}' to ISO 8601 duration failed")))?;
    let hours = (duration.day * 24.0 + duration.hour) as i64;
    let minutes = duration.minute as i64;
    let seconds = duration.second.trunc() as i64;
    Ok(format!("{hours:02}:{minutes:02}:{seconds:02}"))
}

fn parse_serial(value: &str) -> Result<f64, SourceError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|serial| serial.is_finite() && *serial >= 0.0)
        .ok_or_else(|| SourceError::WithContext(format!("Invalid date serial '{value}'")))
}
