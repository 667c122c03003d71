use crate::error::SourceError;
use crate::spreadsheet::range::Range;
use glob::Pattern;

/// Which sheet of a workbook a sheet source reads.
#[derive(Clone, Debug, Default)]
pub enum SheetSelector {
    /// The first sheet in workbook order
    #[default]
    First,
    /// The sheet with exactly this name
    Name(String),
    /// The first sheet whose name matches a glob pattern
    Pattern(Pattern),
}

impl SheetSelector {
    /// Builds a glob selector such as `Sheet*` or `20[0-9][0-9]`.
    pub fn pattern(pattern: &str) -> Result<Self, SourceError> {
        Ok(Self::Pattern(Pattern::new(pattern)?))
    }

    /// Checks whether the sheet at `index` named `name` is the selected one.
    pub(crate) fn accept(&self, index: usize, name: &str) -> bool {
        match self {
            Self::First => index == 0,
            Self::Name(expected) => expected == name,
            Self::Pattern(pattern) => pattern.matches(name),
        }
    }

    /// Describes the selection for error messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::First => "<first>".to_owned(),
            Self::Name(name) => name.to_owned(),
            Self::Pattern(pattern) => pattern.as_str().to_owned(),
        }
    }
}

/// Options shared by the xlsx and ods sources.
#[derive(Clone, Debug, Default)]
pub struct SheetOptions {
    /// Sheet to read (default: the first one)
    pub sheet: SheetSelector,
    /// Cells to read (default: the whole sheet)
    pub range: Option<Range>,
}

impl SheetOptions {
    pub fn with_sheet(mut self, sheet: SheetSelector) -> Self {
        self.sheet = sheet;
        self
    }

    pub fn with_sheet_name(self, name: &str) -> Self {
        self.with_sheet(SheetSelector::Name(name.to_owned()))
    }

    pub fn with_range(mut self, range: Range) -> Self {
        self.range = Some(range);
        self
    }
}
