use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::range::Range;
use std::collections::VecDeque;

/// A run of identical logical rows.
#[derive(Clone, Debug, PartialEq)]
struct RowRun {
    fields: Vec<String>,
    repeat: usize,
}

/// Rows of one sheet, rendered to text and restricted to the requested range.
///
/// Backends push rows in document order, each with its absolute row index and
/// a repeat count. Missing rows between pushes become empty rows, trailing
/// empty rows are dropped by [`Sheet::finish`], and repeated rows are only
/// expanded when they are handed out by [`Sheet::next`].
#[derive(Debug)]
pub(crate) struct Sheet {
    /// Sheet name
    pub(crate) name: String,
    /// Requested data range
    range: Range,
    rows: VecDeque<RowRun>,
    /// Absolute index of the row following the last pushed run
    next_row: usize,
}

impl Sheet {
    pub(crate) fn new(name: &str, range: Option<Range>) -> Self {
        let range = range.unwrap_or_default();
        Self {
            name: name.to_owned(),
            next_row: range.row_origin(),
            range,
            rows: VecDeque::new(),
        }
    }

    /// Returns true once `row` lies past the requested range, so later rows can be skipped.
    pub(crate) fn after_row_upper_bound(&self, row: usize) -> bool {
        self.range.after_row_upper_bound(row)
    }

    /// Returns true once `col` lies past the requested range.
    pub(crate) fn after_col_upper_bound(&self, col: usize) -> bool {
        self.range.col_upper_bound.is_some_and(|upper| upper < col)
    }

    /// Adds `repeat` copies of the row at `row` made of `cells`.
    pub(crate) fn push(&mut self, row: usize, repeat: usize, cells: &[Cell]) {
        let start = row.max(self.range.row_origin()).max(self.next_row);
        let end = match self.range.row_upper_bound {
            Some(upper) => row.saturating_add(repeat).min(upper.saturating_add(1)),
            None => row.saturating_add(repeat),
        };
        if start >= end {
            return;
        }

        if self.next_row < start {
            self.append(Vec::new(), start - self.next_row);
        }
        self.append(self.render(cells), end - start);
        self.next_row = end;
    }

    /// Drops trailing empty rows once the backend has pushed every row.
    pub(crate) fn finish(&mut self) {
        while self.rows.back().is_some_and(|run| run.fields.is_empty()) {
            self.rows.pop_back();
        }
    }

    /// Number of logical rows left.
    pub(crate) fn len(&self) -> usize {
        self.rows.iter().fold(0usize, |total, run| total.saturating_add(run.repeat))
    }

    /// Hands out the next logical row, expanding repeated runs.
    pub(crate) fn next(&mut self) -> Option<Vec<String>> {
        let run = self.rows.front_mut()?;
        if run.repeat > 1 {
            run.repeat -= 1;
            Some(run.fields.clone())
        } else {
            self.rows.pop_front().map(|run| run.fields)
        }
    }

    /// Lays the cells of one row out by column, re-based to the range origin.
    fn render(&self, cells: &[Cell]) -> Vec<String> {
        let origin = self.range.col_origin();
        let mut fields = Vec::<String>::new();
        for cell in cells.iter().filter(|cell| self.range.contains_col(cell.col)) {
            let position = cell.col - origin;
            if fields.len() <= position {
                fields.resize(position + 1, String::new());
            }
            fields[position] = cell.to_string();
        }
        while fields.last().is_some_and(String::is_empty) {
            fields.pop();
        }
        fields
    }

    /// Appends a run, merging it into the previous one when both are empty.
    fn append(&mut self, fields: Vec<String>, repeat: usize) {
        match self.rows.back_mut() {
            Some(last) if fields.is_empty() && last.fields.is_empty() => last.repeat = last.repeat.saturating_add(repeat),
            _ => self.rows.push_back(RowRun { fields, repeat }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::cell::CellType;

    fn cells(row: usize, values: &[(usize, &str)]) -> Vec<Cell> {
        values
            .iter()
            .map(|(col, value)| Cell {
                row,
                col: *col,
                kind: CellType::InlineString,
                value: value.to_string(),
            })
            .collect()
    }

    fn drain(sheet: &mut Sheet) -> Vec<Vec<String>> {
        std::iter::from_fn(|| sheet.next()).collect()
    }

    #[test]
    fn dense_rows() {
        let mut sheet = Sheet::new("Planets", None);
        sheet.push(0, 1, &cells(0, &[(0, "order"), (2, "mass")]));
        sheet.push(2, 1, &cells(2, &[(1, "Venus")]));
        sheet.finish();

        assert_eq!(sheet.len(), 3);
        assert_eq!(drain(&mut sheet), vec![
            vec!["order".to_owned(), String::new(), "mass".to_owned()],
            vec![],
            vec![String::new(), "Venus".to_owned()],
        ]);
        assert!(sheet.next().is_none());
    }

    #[test]
    fn leading_rows_are_kept() {
        let mut sheet = Sheet::new("", None);
        sheet.push(1, 1, &cells(1, &[(0, "a")]));
        sheet.finish();

        assert_eq!(drain(&mut sheet), vec![vec![], vec!["a".to_owned()]]);
    }

    #[test]
    fn repeated_rows_expand_lazily() {
        let mut sheet = Sheet::new("", None);
        sheet.push(0, 3, &cells(0, &[(0, "x")]));
        sheet.push(3, 1000, &[]);
        sheet.finish();

        assert_eq!(sheet.len(), 3);
        assert_eq!(drain(&mut sheet), vec![vec!["x".to_owned()]; 3]);
    }

    #[test]
    fn huge_repeat_counts_saturate() {
        let mut sheet = Sheet::new("", None);
        sheet.push(0, usize::MAX, &cells(0, &[(0, "x")]));
        sheet.push(usize::MAX, 1, &cells(usize::MAX, &[(0, "y")]));
        sheet.push(1, usize::MAX, &[]);
        sheet.finish();

        assert_eq!(sheet.len(), usize::MAX);
        assert_eq!(sheet.next(), Some(vec!["x".to_owned()]));
    }

    #[test]
    fn trailing_empty_rows_are_dropped() {
        let mut sheet = Sheet::new("", None);
        sheet.push(0, 1, &cells(0, &[(0, "a")]));
        sheet.push(1, 2, &[]);
        sheet.push(3, 1, &cells(3, &[(0, "b")]));
        sheet.push(4, 5, &[]);
        sheet.finish();

        assert_eq!(sheet.len(), 4);
    }

    #[test]
    fn range_clips_rows_and_columns() {
        let range = Range::try_from("B2:C3").unwrap();
        let mut sheet = Sheet::new("", Some(range));
        sheet.push(0, 1, &cells(0, &[(1, "skipped")]));
        sheet.push(1, 5, &cells(1, &[(0, "left"), (1, "b"), (2, "c"), (3, "right")]));
        assert!(sheet.after_row_upper_bound(3));
        assert!(sheet.after_col_upper_bound(3));
        sheet.finish();

        assert_eq!(drain(&mut sheet), vec![vec!["b".to_owned(), "c".to_owned()]; 2]);
    }

    #[test]
    fn range_starting_below_first_row() {
        let range = Range::try_from("A3").unwrap();
        let mut sheet = Sheet::new("", Some(range));
        sheet.push(0, 1, &cells(0, &[(0, "header")]));
        sheet.push(4, 1, &cells(4, &[(0, "data")]));
        sheet.finish();

        assert_eq!(drain(&mut sheet), vec![vec![], vec![], vec!["data".to_owned()]]);
    }
}
