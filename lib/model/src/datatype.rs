use crate::vocab::datatype;
use crate::{Literal, Term};
use regex::Regex;
use std::sync::LazyLock;

static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+$").expect("valid regex"));
static DECIMAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("valid regex"));
static DATE_DD_MM_YYYY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<day>\d{2})\.(?P<month>\d{2})\.(?P<year>\d{4})$").expect("valid regex")
});
static DATE_YYYY_MM_DD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<year>\d{4})/(?P<month>\d{2})/(?P<day>\d{2})$").expect("valid regex"));
static DATE_TIME_ISO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?Z").expect("valid regex"));
static WKT_POINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[Pp][Oo][Ii][Nn][Tt]\s*\(\s*(-)?\d+(\.\d+)?\s+(-)?\d+(\.\d+)?\s*\)\s*").expect("valid regex")
});

/// Guesses the datatype of a cell value from its content and returns the encoded literal.
///
/// Integers, decimals, dates (`DD.MM.YYYY` is rewritten to `YYYY/MM/DD`), ISO date-times and
/// WKT points are recognized. Everything else stays a plain string. The lexical form is trimmed.
pub fn typed_literal(value: &str) -> Literal {
    let trimmed = value.trim();

    if INTEGER.is_match(value) {
        return Literal::new_typed(trimmed, datatype::INTEGER);
    }
    if DECIMAL.is_match(value) {
        return Literal::new_typed(trimmed, datatype::DECIMAL);
    }
    if let Some(captures) = DATE_DD_MM_YYYY.captures(value) {
        let date = format!(
            "{}/{}/{}",
            &captures["year"], &captures["month"], &captures["day"]
        );
        return Literal::new_typed(date, datatype::DATE);
    }
    if DATE_YYYY_MM_DD.is_match(value) {
        return Literal::new_typed(trimmed, datatype::DATE);
    }
    if DATE_TIME_ISO.find(value).is_some_and(|m| m.start() == 0) {
        return Literal::new_typed(trimmed, datatype::DATE_TIME);
    }
    if WKT_POINT.is_match(value) {
        return Literal::new_typed(trimmed, datatype::WKT_LITERAL);
    }
    Literal::new_simple(trimmed)
}

/// Shorthand for [`typed_literal`] that directly returns a [`Term`].
pub fn typed_term(value: &str) -> Term {
    Term::Literal(typed_literal(value))
}
