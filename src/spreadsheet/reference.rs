//! Conversions between A1-style cell references and zero-based indexes.

/// Parses column letters (`A`, `AB`) to a zero-based column index.
pub(crate) fn col_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    letters.bytes().try_fold(0usize, |index, letter| {
        let digit = letter.to_ascii_uppercase();
        if digit.is_ascii_uppercase() {
            index.checked_mul(26)?.checked_add((digit - b'A') as usize + 1)
        } else {
            None
        }
    }).map(|number| number - 1)
}

/// Parses a one-based row number to a zero-based row index.
pub(crate) fn row_to_index(digits: &str) -> Option<usize> {
    digits.parse::<usize>().ok().and_then(|row| row.checked_sub(1))
}

/// Parses a cell reference such as `C12` into `(row, col)`.
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    Some((row_to_index(digits)?, col_to_index(letters)?))
}

/// Formats `(row, col)` as a cell reference such as `C12`.
pub(crate) fn index_to_reference(row: usize, col: usize) -> String {
    let mut letters = Vec::new();
    let mut number = col + 1;
    while number > 0 {
        number -= 1;
        letters.push(b'A' + (number % 26) as u8);
        number /= 26;
    }
    letters.reverse();
    let mut reference: String = letters.into_iter().map(char::from).collect();
    reference.push_str(&(row + 1).to_string());
    reference
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns() {
        assert_eq!(col_to_index("A"), Some(0));
        assert_eq!(col_to_index("z"), Some(25));
        assert_eq!(col_to_index("AA"), Some(26));
        assert_eq!(col_to_index("XFD"), Some(16_383));
        assert_eq!(col_to_index(""), None);
        assert_eq!(col_to_index("A1"), None);
    }

    #[test]
    fn rows() {
        assert_eq!(row_to_index("1"), Some(0));
        assert_eq!(row_to_index("1048576"), Some(1_048_575));
        assert_eq!(row_to_index("0"), None);
        assert_eq!(row_to_index(""), None);
    }

    #[test]
    fn references() {
        assert_eq!(reference_to_index("C12"), Some((11, 2)));
        assert_eq!(reference_to_index("AB3"), Some((2, 27)));
        assert_eq!(reference_to_index("12"), None);
        assert_eq!(reference_to_index("C"), None);
        assert_eq!(index_to_reference(11, 2), "C12");
        assert_eq!(index_to_reference(0, 27), "AB1");
        assert_eq!(index_to_reference(0, 16_383), "XFD1");
    }
}
