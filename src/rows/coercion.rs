//! Coercion policy turning a raw field into the string seen by the typed accessors.
use crate::rows::QuotingMode;
use std::borrow::Cow;

/// Applies the coercion policy to a raw field.
///
/// Both modes trim surrounding whitespace. Lazy sources return the trimmed
/// text as-is. Strict sources report blank fields as null (`None`) and unquote
/// quoted literals, keeping the trimmed text when unquoting fails.
pub(crate) fn coerce(raw: &str, mode: QuotingMode) -> Option<Cow<'_, str>> {
    let trimmed = raw.trim();
    match mode {
        QuotingMode::Lazy => Some(Cow::Borrowed(trimmed)),
        QuotingMode::Strict if trimmed.is_empty() => None,
        QuotingMode::Strict => match unquote(trimmed) {
            Some(text) => Some(Cow::Owned(text)),
            None => Some(Cow::Borrowed(trimmed)),
        },
    }
}

/// Removes symmetric `"` or `'` delimiters, collapsing doubled delimiters inside.
/// Returns `None` when the value is not a well-formed quoted literal.
pub(crate) fn unquote(value: &str) -> Option<String> {
    let quote = value.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    if value.len() < 2 || !value.ends_with(quote) {
        return None;
    }

    let inner = &value[1..value.len() - 1];
    let mut text = String::with_capacity(inner.len());
    let mut characters = inner.chars();
    while let Some(character) = characters.next() {
        if character == quote && characters.next() != Some(quote) {
            return None;
        }
        text.push(character);
    }
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lazy_only_trims() {
        assert_eq!(coerce("  Mercury ", QuotingMode::Lazy).unwrap(), "Mercury");
        assert_eq!(coerce("\"\"", QuotingMode::Lazy).unwrap(), "\"\"");
        assert_eq!(coerce(" 'a' ", QuotingMode::Lazy).unwrap(), "'a'");
    }

    #[test]
    fn lazy_keeps_blank() {
        assert_eq!(coerce("   ", QuotingMode::Lazy).unwrap(), "");
        assert_eq!(coerce("", QuotingMode::Lazy).unwrap(), "");
    }

    #[test]
    fn strict_blank_is_null() {
        assert!(coerce("", QuotingMode::Strict).is_none());
        assert!(coerce(" \t ", QuotingMode::Strict).is_none());
    }

    #[test]
    fn strict_unquotes() {
        assert_eq!(coerce(" \"order\" ", QuotingMode::Strict).unwrap(), "order");
        assert_eq!(coerce("'mass'", QuotingMode::Strict).unwrap(), "mass");
        assert_eq!(coerce("\"\"", QuotingMode::Strict).unwrap(), "");
        assert_eq!(coerce("\"say \"\"hi\"\"\"", QuotingMode::Strict).unwrap(), "say \"hi\"");
    }

    #[test]
    fn strict_falls_back_to_literal() {
        assert_eq!(coerce("\"open", QuotingMode::Strict).unwrap(), "\"open");
        assert_eq!(coerce("\"a\"b\"", QuotingMode::Strict).unwrap(), "\"a\"b\"");
        assert_eq!(coerce("\"", QuotingMode::Strict).unwrap(), "\"");
        assert_eq!(coerce("\"mixed'", QuotingMode::Strict).unwrap(), "\"mixed'");
        assert_eq!(coerce("plain", QuotingMode::Strict).unwrap(), "plain");
    }

    #[test]
    fn unquote_keeps_other_quote_kind() {
        assert_eq!(unquote("\"it's\"").unwrap(), "it's");
        assert_eq!(unquote("'it''s'").unwrap(), "it's");
    }
}
