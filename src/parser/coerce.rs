//! Raw value coercion into typed scalars.
//!
//! Every place that reads a raw property string (script literals, tabular
//! cells, JSON strings) goes through these functions so the same field ends
//! up with the same type regardless of which source format produced it.

use crate::models::PropertyValue;

/// Coerces a raw value into an integer, a float or a string.
///
/// Surrounding whitespace and one pair of matching quotes are removed first.
/// The remaining text becomes an integer if it parses fully as one, a float
/// if it contains a decimal point and parses fully as one, and otherwise
/// stays a string. There is no partial coercion: `"12abc"` stays a string.
///
/// ```
/// use histograph::models::PropertyValue;
/// use histograph::parser::coerce;
///
/// assert_eq!(coerce("118"), PropertyValue::Integer(118));
/// assert_eq!(coerce("32.06004"), PropertyValue::Float(32.06004));
/// assert_eq!(coerce("\"蒋介石\""), PropertyValue::String("蒋介石".into()));
/// ```
pub fn coerce(raw: &str) -> PropertyValue {
    let text = unquote(raw.trim());

    if let Ok(i) = text.parse::<i64>() {
        return PropertyValue::Integer(i);
    }

    if text.contains('.') {
        if let Some(f) = parse_finite(text) {
            return PropertyValue::Float(f);
        }
    }

    PropertyValue::String(text.to_string())
}

/// Coerces a declared floating-point field.
///
/// Integer text is widened. Blank or invalid input yields `Null`.
pub fn coerce_float(raw: &str) -> PropertyValue {
    parse_finite(unquote(raw.trim()))
        .map(PropertyValue::Float)
        .unwrap_or(PropertyValue::Null)
}

/// Coerces a declared integer field. Blank or invalid input yields `Null`.
pub fn coerce_int(raw: &str) -> PropertyValue {
    unquote(raw.trim())
        .parse::<i64>()
        .map(PropertyValue::Integer)
        .unwrap_or(PropertyValue::Null)
}

/// Strips one pair of matching `"` or `'` quotes.
fn unquote(text: &str) -> &str {
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

fn parse_finite(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|f| f.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer() {
        assert_eq!(coerce("118"), PropertyValue::Integer(118));
        assert_eq!(coerce("-383"), PropertyValue::Integer(-383));
        assert_eq!(coerce("  42 "), PropertyValue::Integer(42));
    }

    #[test]
    fn test_float() {
        assert_eq!(coerce("32.06004"), PropertyValue::Float(32.06004));
        assert_eq!(coerce("118.79688"), PropertyValue::Float(118.79688));
    }

    #[test]
    fn test_non_numeric_text_unchanged() {
        assert_eq!(coerce("蒋介石"), PropertyValue::String("蒋介石".to_string()));
        assert_eq!(coerce("12abc"), PropertyValue::String("12abc".to_string()));
    }

    #[test]
    fn test_quotes_stripped() {
        assert_eq!(coerce("\"蒋介石\""), PropertyValue::String("蒋介石".to_string()));
        assert_eq!(coerce("'陈果夫'"), PropertyValue::String("陈果夫".to_string()));
        assert_eq!(coerce("\"1938\""), PropertyValue::Integer(1938));
    }

    #[test]
    fn test_no_decimal_point_never_float() {
        // "inf" and "1e5" parse as f64 but have no decimal point
        assert_eq!(coerce("inf"), PropertyValue::String("inf".to_string()));
        assert_eq!(coerce("1e5"), PropertyValue::String("1e5".to_string()));
    }

    #[test]
    fn test_unbalanced_quote_kept() {
        assert_eq!(coerce("\"abc"), PropertyValue::String("\"abc".to_string()));
    }

    #[test]
    fn test_coerce_float() {
        assert_eq!(coerce_float("32.06"), PropertyValue::Float(32.06));
        assert_eq!(coerce_float("32"), PropertyValue::Float(32.0));
        assert_eq!(coerce_float(""), PropertyValue::Null);
        assert_eq!(coerce_float("N/A"), PropertyValue::Null);
    }

    #[test]
    fn test_coerce_int() {
        assert_eq!(coerce_int("5"), PropertyValue::Integer(5));
        assert_eq!(coerce_int("5.5"), PropertyValue::Null);
        assert_eq!(coerce_int(" "), PropertyValue::Null);
    }
}
