// src/extractors/number.rs
//! First number in free-form cell text.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+").expect("Failed to compile WHITESPACE_RE")
});

// ASCII digits only: `\d` would also accept other scripts' digits, which f64 cannot parse.
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"-?[0-9]+(?:\.[0-9]+)?").expect("Failed to compile NUMBER_RE")
});

/// Extracts the first number from `text`, accepting a decimal comma.
///
/// Only the first comma is rewritten to a period, so thousands separators are not
/// understood: `"1.234,5"` yields `1.234`. Text with several numbers yields the first.
pub fn parse_number(text: &str) -> Option<f64> {
    let collapsed = WHITESPACE_RE.replace_all(text, " ");
    let cleaned = collapsed.replacen(',', ".", 1);

    NUMBER_RE
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_comma_matches_decimal_point() {
        assert_eq!(parse_number("7,5"), Some(7.5));
        assert_eq!(parse_number("7.5"), Some(7.5));
        assert_eq!(parse_number("10,25"), parse_number("10.25"));
    }

    #[test]
    fn test_number_surrounded_by_labels() {
        assert_eq!(parse_number("Nota: 7,5 pts"), Some(7.5));
        assert_eq!(parse_number("\n\t  9\u{a0}pontos "), Some(9.0));
        assert_eq!(parse_number("(-2)"), Some(-2.0));
    }

    #[test]
    fn test_no_digits() {
        assert_eq!(parse_number("Ausente"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("-,-"), None);
    }

    #[test]
    fn test_first_match_wins() {
        assert_eq!(parse_number("8 e 9"), Some(8.0));
        assert_eq!(parse_number("1º bim: 6,0 / 2º bim: 8,0"), Some(1.0));
        // only the first comma is treated as decimal
        assert_eq!(parse_number("1.234,5"), Some(1.234));
    }

    #[test]
    fn test_trailing_period_is_not_fractional() {
        assert_eq!(parse_number("Nota 8."), Some(8.0));
    }
}
