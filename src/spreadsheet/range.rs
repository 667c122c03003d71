use crate::error::SourceError;
use crate::spreadsheet::reference::col_to_index;
use crate::spreadsheet::reference::row_to_index;
use regex::Regex;
use std::str::FromStr;

/// Excel-style cell range restricting the rows and columns a sheet source yields.
///
/// Every bound is optional: `B2:D10` bounds both axes, `B:D` only columns,
/// `3:10` only rows, and a single reference such as `B2` only the start.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Range {
    /// Lower row bound (0-based, inclusive)
    pub row_lower_bound: Option<usize>,
    /// Upper row bound (0-based, inclusive)
    pub row_upper_bound: Option<usize>,
    /// Lower column bound (0-based, inclusive)
    pub col_lower_bound: Option<usize>,
    /// Upper column bound (0-based, inclusive)
    pub col_upper_bound: Option<usize>,
}

impl Range {
    pub(crate) fn before_row_lower_bound(&self, row: usize) -> bool {
        self.row_lower_bound.is_some_and(|lower| row < lower)
    }

    pub(crate) fn after_row_upper_bound(&self, row: usize) -> bool {
        self.row_upper_bound.is_some_and(|upper| upper < row)
    }

    pub(crate) fn contains_col(&self, col: usize) -> bool {
        !self.col_lower_bound.is_some_and(|lower| col < lower)
            && !self.col_upper_bound.is_some_and(|upper| upper < col)
    }

    /// First column of the range, the origin of the yielded field positions.
    pub(crate) fn col_origin(&self) -> usize {
        self.col_lower_bound.unwrap_or(0)
    }

    /// First row of the range, the row the sheet source starts at.
    pub(crate) fn row_origin(&self) -> usize {
        self.row_lower_bound.unwrap_or(0)
    }
}

impl TryFrom<&str> for Range {
    type Error = SourceError;

    /// Parses an Excel-style range string (e.g. "A1", "B2:C5", "A:C", "1:10").
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let pattern = Regex::new(r"^([A-Z]*)(\d*)(:([A-Z]*)(\d*))?$")?;
        let value = value.trim().to_ascii_uppercase();
        let invalid = || SourceError::InvalidRange(value.to_owned());
        let captures = pattern.captures(&value).ok_or_else(invalid)?;
        let bound = |group: usize, parse: fn(&str) -> Option<usize>| -> Result<Option<usize>, SourceError> {
            match captures.get(group).map(|matcher| matcher.as_str()) {
                None | Some("") => Ok(None),
                Some(text) => parse(text).map(Some).ok_or_else(invalid),
            }
        };

        let range = Range {
            col_lower_bound: bound(1, col_to_index)?,
            row_lower_bound: bound(2, row_to_index)?,
            col_upper_bound: bound(4, col_to_index)?,
            row_upper_bound: bound(5, row_to_index)?,
        };
        let reversed = |lower: Option<usize>, upper: Option<usize>| lower.zip(upper).is_some_and(|(lower, upper)| upper < lower);
        if range == Range::default()
            || reversed(range.row_lower_bound, range.row_upper_bound)
            || reversed(range.col_lower_bound, range.col_upper_bound)
        {
            Err(invalid())
        } else {
            Ok(range)
        }
    }
}

impl FromStr for Range {
    type Err = SourceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Range::try_from(value)
    }
}
