//! # Typed Accessors
//!
//! Conversions from the raw fields of the current row to typed values.
//!
//! Accessors are layered: every typed accessor starts from [`Rows::string_at`],
//! and every narrower integer accessor calls the next wider one and only adds a
//! range check (`i8` → `i16` → `i32` → `i64`, `u8` → `i16`). By-name accessors
//! resolve the column through [`Rows::column_index`] and then delegate to the
//! by-index accessor, so `UnknownColumn` never reaches the row. Nullable
//! variants turn `NullValue` into `None` and propagate every other error.
use crate::rows::coercion::coerce;
use crate::rows::{RowSource, Rows, RowsError};
use std::borrow::Cow;
use std::num::IntErrorKind;

const TRUTHY: [&str; 6] = ["1", "t", "T", "TRUE", "true", "True"];
const FALSY: [&str; 6] = ["0", "f", "F", "FALSE", "false", "False"];

/// Converts a `NullValue` outcome into `Ok(None)`.
fn nullable<T>(result: Result<T, RowsError>) -> Result<Option<T>, RowsError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(RowsError::NullValue { .. }) => Ok(None),
        Err(error) => Err(error),
    }
}

/// Range-checks a value produced by a wider accessor.
fn narrow<T: TryFrom<i64>>(value: impl Into<i64>, index: usize, target: &'static str) -> Result<T, RowsError> {
    let value = value.into();
    T::try_from(value).map_err(|_| RowsError::OutOfRange {
        index,
        value: value.to_string(),
        target,
    })
}

fn parse_bool(value: &str) -> Option<bool> {
    if TRUTHY.contains(&value) {
        Some(true)
    } else if FALSY.contains(&value) {
        Some(false)
    } else {
        None
    }
}

/// Failure of [`parse_int`].
#[derive(Debug, PartialEq)]
enum IntFailure {
    Syntax,
    Range,
}

/// Parses a signed integer in `base`; base 0 infers it from a `0x`, `0o`, `0b` or `0` prefix
/// and accepts `_` digit separators.
fn parse_int(value: &str, base: u32) -> Result<i64, IntFailure> {
    let (negative, digits) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };
    let (radix, digits) = if base == 0 {
        infer_radix(digits).ok_or(IntFailure::Syntax)?
    } else {
        (base, Cow::Borrowed(digits))
    };
    if !(2..=36).contains(&radix) || digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(IntFailure::Syntax);
    }

    let signed = if negative {
        Cow::Owned(format!("-{digits}"))
    } else {
        digits
    };
    i64::from_str_radix(&signed, radix).map_err(|error| match error.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => IntFailure::Range,
        _ => IntFailure::Syntax,
    })
}

/// Splits off the radix prefix and drops `_` separators, `None` when a separator is misplaced.
fn infer_radix(digits: &str) -> Option<(u32, Cow<'_, str>)> {
    let (radix, rest) = match digits.get(..2) {
        Some("0x") | Some("0X") => (16, &digits[2..]),
        Some("0o") | Some("0O") => (8, &digits[2..]),
        Some("0b") | Some("0B") => (2, &digits[2..]),
        _ if digits.len() > 1 && digits.starts_with('0') => (8, &digits[1..]),
        _ => (10, digits),
    };
    if !rest.contains('_') {
        return Some((radix, Cow::Borrowed(rest)));
    }
    // a separator sits between two digits, or between the prefix and a digit
    let prefixed = rest.len() < digits.len();
    let mut after_digit = prefixed;
    let mut after_separator = false;
    for character in rest.chars() {
        if character == '_' {
            if !after_digit {
                return None;
            }
            after_digit = false;
            after_separator = true;
        } else {
            after_digit = true;
            after_separator = false;
        }
    }
    if after_separator {
        return None;
    }
    Some((radix, Cow::Owned(rest.replace('_', ""))))
}

impl<S: RowSource> Rows<S> {
    /// Returns the raw field at `index`.
    fn field(&self, index: isize) -> Result<&str, RowsError> {
        usize::try_from(index)
            .ok()
            .and_then(|position| self.row().get(position))
            .map(String::as_str)
            .ok_or(RowsError::IndexOutOfRange {
                index,
                len: self.row().len(),
            })
    }

    /// Returns the coerced field at `index`, failing `NullValue` on an empty result.
    fn value_at(&self, index: isize) -> Result<(usize, String), RowsError> {
        let value = self.string_at(index)?;
        let position = index as usize; // validated by string_at
        if value.is_empty() {
            Err(RowsError::NullValue { index: position })
        } else {
            Ok((position, value))
        }
    }

    fn resolve(&self, name: &str) -> Result<isize, RowsError> {
        self.column_index(name).map(|index| index as isize)
    }

    // by-index accessors

    /// Returns the field at `index` after trimming and, for strict sources, unquoting.
    ///
    /// # Errors
    ///
    /// * `IndexOutOfRange` when `index` is negative or not below the row length
    /// * `NullValue` when a strict source holds a blank field
    pub fn string_at(&self, index: isize) -> Result<String, RowsError> {
        let raw = self.field(index)?;
        coerce(raw, self.quoting_mode())
            .map(Cow::into_owned)
            .ok_or(RowsError::NullValue {
                index: index as usize,
            })
    }

    /// Like [`Rows::string_at`], with null and empty fields reported as `None`.
    pub fn nullable_string_at(&self, index: isize) -> Result<Option<String>, RowsError> {
        nullable(self.string_at(index)).map(|value| value.filter(|text| !text.is_empty()))
    }

    /// Returns the field at `index`, or an empty string on any failure.
    pub fn get(&self, index: isize) -> String {
        self.string_at(index).unwrap_or_default()
    }

    /// Parses the field at `index` as a boolean literal (`1 t T TRUE true True`, `0 f F FALSE false False`).
    pub fn bool_at(&self, index: isize) -> Result<bool, RowsError> {
        let (position, value) = self.value_at(index)?;
        parse_bool(&value).ok_or(RowsError::Malformed {
            index: position,
            value,
            target: "bool",
            base: None,
        })
    }

    /// Like [`Rows::bool_at`], with a blank field read as `None`.
    pub fn nullable_bool_at(&self, index: isize) -> Result<Option<bool>, RowsError> {
        nullable(self.bool_at(index))
    }

    /// Parses the field at `index` as a decimal floating point number, exponent allowed.
    pub fn f64_at(&self, index: isize) -> Result<f64, RowsError> {
        let (position, value) = self.value_at(index)?;
        match value.parse::<f64>() {
            Ok(number) if number.is_infinite() && !value.to_ascii_lowercase().contains("inf") => {
                Err(RowsError::OutOfRange {
                    index: position,
                    value,
                    target: "f64",
                })
            }
            Ok(number) => Ok(number),
            Err(_) => Err(RowsError::Malformed {
                index: position,
                value,
                target: "f64",
                base: None,
            }),
        }
    }

    /// Like [`Rows::f64_at`], with a blank field read as `None`.
    pub fn nullable_f64_at(&self, index: isize) -> Result<Option<f64>, RowsError> {
        nullable(self.f64_at(index))
    }

    /// Parses the field at `index` as a signed 64-bit integer in `base`.
    ///
    /// `base` is 2 to 36, or 0 to infer it from a `0x`, `0o`, `0b` or `0` prefix.
    pub fn i64_at(&self, index: isize, base: u32) -> Result<i64, RowsError> {
        let (position, value) = self.value_at(index)?;
        parse_int(&value, base).map_err(|failure| match failure {
            IntFailure::Range => RowsError::OutOfRange {
                index: position,
                value,
                target: "i64",
            },
            IntFailure::Syntax => RowsError::Malformed {
                index: position,
                value,
                target: "i64",
                base: Some(base),
            },
        })
    }

    /// Like [`Rows::i64_at`], with a blank field read as `None`.
    pub fn nullable_i64_at(&self, index: isize, base: u32) -> Result<Option<i64>, RowsError> {
        nullable(self.i64_at(index, base))
    }

    /// Signed 32-bit integer, range-checked from the `i64` accessor.
    pub fn i32_at(&self, index: isize, base: u32) -> Result<i32, RowsError> {
        let value = self.i64_at(index, base)?;
        narrow(value, index as usize, "i32")
    }

    pub fn nullable_i32_at(&self, index: isize, base: u32) -> Result<Option<i32>, RowsError> {
        nullable(self.i32_at(index, base))
    }

    /// Signed 16-bit integer, range-checked from the `i32` accessor.
    pub fn i16_at(&self, index: isize, base: u32) -> Result<i16, RowsError> {
        let value = self.i32_at(index, base)?;
        narrow(value, index as usize, "i16")
    }

    pub fn nullable_i16_at(&self, index: isize, base: u32) -> Result<Option<i16>, RowsError> {
        nullable(self.i16_at(index, base))
    }

    /// Signed 8-bit integer, range-checked from the `i16` accessor.
    pub fn i8_at(&self, index: isize, base: u32) -> Result<i8, RowsError> {
        let value = self.i16_at(index, base)?;
        narrow(value, index as usize, "i8")
    }

    pub fn nullable_i8_at(&self, index: isize, base: u32) -> Result<Option<i8>, RowsError> {
        nullable(self.i8_at(index, base))
    }

    /// Unsigned byte, range-checked from the `i16` accessor.
    pub fn u8_at(&self, index: isize, base: u32) -> Result<u8, RowsError> {
        let value = self.i16_at(index, base)?;
        narrow(value, index as usize, "u8")
    }

    pub fn nullable_u8_at(&self, index: isize, base: u32) -> Result<Option<u8>, RowsError> {
        nullable(self.u8_at(index, base))
    }

    // by-name accessors

    /// Returns the named column as text, or an empty string on any failure.
    pub fn column(&self, name: &str) -> String {
        self.column_string(name).unwrap_or_default()
    }

    /// Returns the named column as text; null fields read as an empty string.
    pub fn column_string(&self, name: &str) -> Result<String, RowsError> {
        let index = self.resolve(name)?;
        self.nullable_string_at(index).map(Option::unwrap_or_default)
    }

    /// Returns the named column as text, `None` when the field is null.
    pub fn column_nullable_string(&self, name: &str) -> Result<Option<String>, RowsError> {
        let index = self.resolve(name)?;
        self.nullable_string_at(index)
    }

    /// Parses the named column as a boolean literal.
    pub fn column_bool(&self, name: &str) -> Result<bool, RowsError> {
        let index = self.resolve(name)?;
        self.bool_at(index)
    }

    /// Parses the named column as a boolean literal, `None` when blank.
    pub fn column_nullable_bool(&self, name: &str) -> Result<Option<bool>, RowsError> {
        let index = self.resolve(name)?;
        self.nullable_bool_at(index)
    }

    /// Parses the named column as a floating point number.
    pub fn column_f64(&self, name: &str) -> Result<f64, RowsError> {
        let index = self.resolve(name)?;
        self.f64_at(index)
    }

    /// Parses the named column as a floating point number, `None` when blank.
    pub fn column_nullable_f64(&self, name: &str) -> Result<Option<f64>, RowsError> {
        let index = self.resolve(name)?;
        self.nullable_f64_at(index)
    }

    /// Parses the named column as a signed 64-bit integer in `base`.
    pub fn column_i64(&self, name: &str, base: u32) -> Result<i64, RowsError> {
        let index = self.resolve(name)?;
        self.i64_at(index, base)
    }

    /// Parses the named column as a signed 64-bit integer in `base`, `None` when blank.
    pub fn column_nullable_i64(&self, name: &str, base: u32) -> Result<Option<i64>, RowsError> {
        let index = self.resolve(name)?;
        self.nullable_i64_at(index, base)
    }

    /// Parses the named column as a signed 32-bit integer in `base`.
    pub fn column_i32(&self, name: &str, base: u32) -> Result<i32, RowsError> {
        let index = self.resolve(name)?;
        self.i32_at(index, base)
    }

    /// Parses the named column as a signed 32-bit integer in `base`, `None` when blank.
    pub fn column_nullable_i32(&self, name: &str, base: u32) -> Result<Option<i32>, RowsError> {
        let index = self.resolve(name)?;
        self.nullable_i32_at(index, base)
    }

    /// Parses the named column as a signed 16-bit integer in `base`.
    pub fn column_i16(&self, name: &str, base: u32) -> Result<i16, RowsError> {
        let index = self.resolve(name)?;
        self.i16_at(index, base)
    }

    /// Parses the named column as a signed 16-bit integer in `base`, `None` when blank.
    pub fn column_nullable_i16(&self, name: &str, base: u32) -> Result<Option<i16>, RowsError> {
        let index = self.resolve(name)?;
        self.nullable_i16_at(index, base)
    }

    /// Parses the named column as a signed 8-bit integer in `base`.
    pub fn column_i8(&self, name: &str, base: u32) -> Result<i8, RowsError> {
        let index = self.resolve(name)?;
        self.i8_at(index, base)
    }

    /// Parses the named column as a signed 8-bit integer in `base`, `None` when blank.
    pub fn column_nullable_i8(&self, name: &str, base: u32) -> Result<Option<i8>, RowsError> {
        let index = self.resolve(name)?;
        self.nullable_i8_at(index, base)
    }

    /// Parses the named column as an unsigned byte in `base`.
    pub fn column_u8(&self, name: &str, base: u32) -> Result<u8, RowsError> {
        let index = self.resolve(name)?;
        self.u8_at(index, base)
    }

    /// Parses the named column as an unsigned byte in `base`, `None` when blank.
    pub fn column_nullable_u8(&self, name: &str, base: u32) -> Result<Option<u8>, RowsError> {
        let index = self.resolve(name)?;
        self.nullable_u8_at(index, base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::testing::MockSource;
    use crate::rows::ErrorKind;

    const HEADER: &[&str] = &["order", "name", "mass", "distance", "habitable", "note"];

    fn strict(row: &[&str]) -> Rows<MockSource> {
        let mut rows = Rows::new(MockSource::strict(&[HEADER, row]), true);
        rows.advance().unwrap();
        rows
    }

    fn lazy(row: &[&str]) -> Rows<MockSource> {
        let mut rows = Rows::new(MockSource::lazy(&[HEADER, row]), true);
        rows.advance().unwrap();
        rows
    }

    fn single(value: &str) -> Rows<MockSource> {
        let mut rows = Rows::new(MockSource::strict(&[&["value"], &[value]]), true);
        rows.advance().unwrap();
        rows
    }

    #[test]
    fn strict_planet_row() {
        let rows = strict(&["1", " Mercury", " 0.055", " 0.4", "false", ""]);

        assert_eq!(rows.column("name"), "Mercury");
        assert_eq!(rows.column_i64("order", 10).unwrap(), 1);
        assert_eq!(rows.column_f64("mass").unwrap(), 0.055);
        assert!(!rows.column_bool("habitable").unwrap());
        assert_eq!(rows.column_nullable_string("note").unwrap(), None);
        assert_eq!(rows.column_string("note").unwrap(), "");
        assert_eq!(rows.column_i32("order", 10).unwrap(), 1);
        assert_eq!(rows.column_i16("order", 10).unwrap(), 1);
        assert_eq!(rows.column_i8("order", 10).unwrap(), 1);
        assert_eq!(rows.column_u8("order", 10).unwrap(), 1);
        assert_eq!(rows.column_nullable_u8("order", 10).unwrap(), Some(1));
        assert_eq!(rows.column_nullable_f64("distance").unwrap(), Some(0.4));
    }

    #[test]
    fn lazy_planet_row_keeps_quotes() {
        let rows = lazy(&["1", " Mercury", " 0.055", " 0.4", "false", "\"\""]);

        assert_eq!(rows.column_string("note").unwrap(), "\"\"");
        assert_eq!(rows.column_nullable_string("note").unwrap().as_deref(), Some("\"\""));
        assert_eq!(rows.column("name"), "Mercury");
    }

    #[test]
    fn lazy_empty_string() {
        let rows = lazy(&["1", "Mercury", "0.055", "0.4", "false", ""]);

        assert_eq!(rows.string_at(5).unwrap(), "");
        assert_eq!(rows.nullable_string_at(5).unwrap(), None);
        assert_eq!(rows.bool_at(5).unwrap_err().kind(), ErrorKind::NullValue);
        assert_eq!(rows.nullable_i64_at(5, 10).unwrap(), None);
    }

    #[test]
    fn blank_field_under_strict_mode() {
        let rows = strict(&["1", "Mercury", "0.055", "0.4", "  ", ""]);

        assert_eq!(rows.nullable_bool_at(4).unwrap(), None);
        assert_eq!(rows.bool_at(4).unwrap_err().kind(), ErrorKind::NullValue);
        assert_eq!(rows.string_at(4).unwrap_err().kind(), ErrorKind::NullValue);
        assert_eq!(rows.column_nullable_bool("habitable").unwrap(), None);
        assert_eq!(rows.column_bool("habitable").unwrap_err().kind(), ErrorKind::NullValue);
        assert_eq!(rows.nullable_f64_at(5).unwrap(), None);
        assert_eq!(rows.nullable_i8_at(5, 10).unwrap(), None);
    }

    #[test]
    fn strict_quoted_empty_is_null_for_typed_values() {
        let rows = single("\"\"");

        assert_eq!(rows.string_at(0).unwrap(), "");
        assert_eq!(rows.nullable_string_at(0).unwrap(), None);
        assert_eq!(rows.i64_at(0, 10).unwrap_err().kind(), ErrorKind::NullValue);
    }

    #[test]
    fn index_out_of_range() {
        let rows = strict(&["1", "Mercury", "0.055", "0.4", "false", ""]);

        for index in [-1, 6, 100] {
            assert_eq!(rows.string_at(index).unwrap_err().kind(), ErrorKind::IndexOutOfRange);
            assert_eq!(rows.nullable_string_at(index).unwrap_err().kind(), ErrorKind::IndexOutOfRange);
            assert_eq!(rows.bool_at(index).unwrap_err().kind(), ErrorKind::IndexOutOfRange);
            assert_eq!(rows.nullable_bool_at(index).unwrap_err().kind(), ErrorKind::IndexOutOfRange);
            assert_eq!(rows.f64_at(index).unwrap_err().kind(), ErrorKind::IndexOutOfRange);
            assert_eq!(rows.i64_at(index, 10).unwrap_err().kind(), ErrorKind::IndexOutOfRange);
            assert_eq!(rows.i32_at(index, 10).unwrap_err().kind(), ErrorKind::IndexOutOfRange);
            assert_eq!(rows.i16_at(index, 10).unwrap_err().kind(), ErrorKind::IndexOutOfRange);
            assert_eq!(rows.i8_at(index, 10).unwrap_err().kind(), ErrorKind::IndexOutOfRange);
            assert_eq!(rows.u8_at(index, 10).unwrap_err().kind(), ErrorKind::IndexOutOfRange);
            assert_eq!(rows.get(index), "");
        }
    }

    #[test]
    fn index_out_of_range_before_first_row() {
        let rows = Rows::new(MockSource::strict(&[&["a"]]), false);

        let error = rows.string_at(0).unwrap_err();
        assert!(matches!(error, RowsError::IndexOutOfRange { index: 0, len: 0 }));
    }

    #[test]
    fn unknown_column_wins_over_value_errors() {
        let rows = strict(&["1", "Mercury", "0.055", "0.4", "false", ""]);

        assert_eq!(rows.column_string("foo").unwrap_err().kind(), ErrorKind::UnknownColumn);
        assert_eq!(rows.column_bool("foo").unwrap_err().kind(), ErrorKind::UnknownColumn);
        assert_eq!(rows.column_nullable_bool("foo").unwrap_err().kind(), ErrorKind::UnknownColumn);
        assert_eq!(rows.column_nullable_i8("foo", 10).unwrap_err().kind(), ErrorKind::UnknownColumn);
        assert_eq!(rows.column("foo"), "");
    }

    #[test]
    fn malformed_values() {
        let rows = strict(&["1", "Mercury", "0.055", "0.4", "false", ""]);

        assert_eq!(rows.column_bool("name").unwrap_err().kind(), ErrorKind::Malformed);
        assert_eq!(rows.column_f64("name").unwrap_err().kind(), ErrorKind::Malformed);
        assert_eq!(rows.column_i64("name", 10).unwrap_err().kind(), ErrorKind::Malformed);
        assert_eq!(rows.column_i64("mass", 10).unwrap_err().kind(), ErrorKind::Malformed);
        assert_eq!(rows.column_nullable_i8("name", 10).unwrap_err().kind(), ErrorKind::Malformed);
        assert_eq!(rows.column_nullable_bool("name").unwrap_err().kind(), ErrorKind::Malformed);
    }

    #[test]
    fn malformed_error_carries_context() {
        let rows = strict(&["1", "Mercury", "0.055", "0.4", "false", ""]);

        match rows.column_i64("name", 16).unwrap_err() {
            RowsError::Malformed { index, value, target, base } => {
                assert_eq!(index, 1);
                assert_eq!(value, "Mercury");
                assert_eq!(target, "i64");
                assert_eq!(base, Some(16));
            }
            error => panic!("unexpected error {error:?}"),
        }
    }

    #[test]
    fn boolean_literals() {
        for literal in ["1", "t", "T", "TRUE", "true", "True"] {
            assert!(single(literal).bool_at(0).unwrap(), "{literal}");
        }
        for literal in ["0", "f", "F", "FALSE", "false", "False"] {
            assert!(!single(literal).bool_at(0).unwrap(), "{literal}");
        }
        for literal in ["yes", "tRUE", "2", "fAlse"] {
            assert_eq!(single(literal).bool_at(0).unwrap_err().kind(), ErrorKind::Malformed, "{literal}");
        }
    }

    #[test]
    fn quoted_boolean_is_unquoted_first() {
        assert!(single("\"true\"").bool_at(0).unwrap());
    }

    #[test]
    fn float_values() {
        assert_eq!(single("1.5e3").f64_at(0).unwrap(), 1500.0);
        assert_eq!(single("-0.25").f64_at(0).unwrap(), -0.25);
        assert!(single("inf").f64_at(0).unwrap().is_infinite());
        assert_eq!(single("1e400").f64_at(0).unwrap_err().kind(), ErrorKind::OutOfRange);
        assert_eq!(single("1,5").f64_at(0).unwrap_err().kind(), ErrorKind::Malformed);
    }

    #[test]
    fn integer_bases() {
        assert_eq!(single("ff").i64_at(0, 16).unwrap(), 255);
        assert_eq!(single("-101").i64_at(0, 2).unwrap(), -5);
        assert_eq!(single("0x1F").i64_at(0, 0).unwrap(), 31);
        assert_eq!(single("-0b11").i64_at(0, 0).unwrap(), -3);
        assert_eq!(single("0o17").i64_at(0, 0).unwrap(), 15);
        assert_eq!(single("017").i64_at(0, 0).unwrap(), 15);
        assert_eq!(single("1_000").i64_at(0, 0).unwrap(), 1000);
        assert_eq!(single("0").i64_at(0, 0).unwrap(), 0);
        assert_eq!(single("1_000").i64_at(0, 10).unwrap_err().kind(), ErrorKind::Malformed);
        assert_eq!(single("12").i64_at(0, 1).unwrap_err().kind(), ErrorKind::Malformed);
        assert_eq!(single("12").i64_at(0, 37).unwrap_err().kind(), ErrorKind::Malformed);
        assert_eq!(single("+-1").i64_at(0, 10).unwrap_err().kind(), ErrorKind::Malformed);
        assert_eq!(single("-").i64_at(0, 10).unwrap_err().kind(), ErrorKind::Malformed);
    }

    #[test]
    fn digit_separators_sit_between_digits() {
        assert_eq!(single("0x_1F").i64_at(0, 0).unwrap(), 31);
        assert_eq!(single("0_17").i64_at(0, 0).unwrap(), 15);
        assert_eq!(single("-1_0_0").i64_at(0, 0).unwrap(), -100);
        for literal in ["1__0", "0x_", "_1", "1_", "0b1__1", "-_5"] {
            assert_eq!(single(literal).i64_at(0, 0).unwrap_err().kind(), ErrorKind::Malformed, "{literal}");
        }
    }

    #[test]
    fn integer_overflow() {
        assert_eq!(single("9223372036854775807").i64_at(0, 10).unwrap(), i64::MAX);
        assert_eq!(single("-9223372036854775808").i64_at(0, 10).unwrap(), i64::MIN);
        assert_eq!(single("9223372036854775808").i64_at(0, 10).unwrap_err().kind(), ErrorKind::OutOfRange);
        assert_eq!(single("-9223372036854775809").i64_at(0, 10).unwrap_err().kind(), ErrorKind::OutOfRange);
    }

    #[test]
    fn narrow_integer_boundaries() {
        assert_eq!(single("127").i8_at(0, 10).unwrap(), 127);
        assert_eq!(single("128").i8_at(0, 10).unwrap_err().kind(), ErrorKind::OutOfRange);
        assert_eq!(single("-128").i8_at(0, 10).unwrap(), -128);
        assert_eq!(single("-129").i8_at(0, 10).unwrap_err().kind(), ErrorKind::OutOfRange);

        assert_eq!(single("32767").i16_at(0, 10).unwrap(), i16::MAX);
        assert_eq!(single("32768").i16_at(0, 10).unwrap_err().kind(), ErrorKind::OutOfRange);
        assert_eq!(single("-32768").i16_at(0, 10).unwrap(), i16::MIN);
        assert_eq!(single("-32769").i16_at(0, 10).unwrap_err().kind(), ErrorKind::OutOfRange);

        assert_eq!(single("2147483647").i32_at(0, 10).unwrap(), i32::MAX);
        assert_eq!(single("2147483648").i32_at(0, 10).unwrap_err().kind(), ErrorKind::OutOfRange);
        assert_eq!(single("-2147483648").i32_at(0, 10).unwrap(), i32::MIN);
        assert_eq!(single("-2147483649").i32_at(0, 10).unwrap_err().kind(), ErrorKind::OutOfRange);

        assert_eq!(single("255").u8_at(0, 10).unwrap(), 255);
        assert_eq!(single("0").u8_at(0, 10).unwrap(), 0);
        assert_eq!(single("256").u8_at(0, 10).unwrap_err().kind(), ErrorKind::OutOfRange);
        assert_eq!(single("-1").u8_at(0, 10).unwrap_err().kind(), ErrorKind::OutOfRange);
    }

    #[test]
    fn narrow_accessors_inherit_parent_failures() {
        // 40000 already fails the i16 parent, so i8 and u8 report the parent's check
        match single("40000").i8_at(0, 10).unwrap_err() {
            RowsError::OutOfRange { target, .. } => assert_eq!(target, "i16"),
            error => panic!("unexpected error {error:?}"),
        }
        match single("40000").u8_at(0, 10).unwrap_err() {
            RowsError::OutOfRange { target, .. } => assert_eq!(target, "i16"),
            error => panic!("unexpected error {error:?}"),
        }
        assert_eq!(single("1.0").i8_at(0, 10).unwrap_err().kind(), ErrorKind::Malformed);
        assert_eq!(single("x").u8_at(0, 10).unwrap_err().kind(), ErrorKind::Malformed);
    }

    #[test]
    fn nullable_accessors_propagate_range_errors() {
        assert_eq!(single("128").nullable_i8_at(0, 10).unwrap_err().kind(), ErrorKind::OutOfRange);
        assert_eq!(single("300").nullable_u8_at(0, 10).unwrap_err().kind(), ErrorKind::OutOfRange);
        assert_eq!(single("70000").nullable_i16_at(0, 10).unwrap_err().kind(), ErrorKind::OutOfRange);
        assert_eq!(single("-5").nullable_i16_at(0, 10).unwrap(), Some(-5));
    }
}
