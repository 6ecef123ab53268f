/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim()
    } else {
        trimmed
    }
}

/// Drop every occurrence of any char in `chars` (thousands separators, `%`, ...).
pub fn strip_chars(raw: &str, chars: &[char]) -> String {
    raw.chars().filter(|c| !chars.contains(c)).collect()
}

/// Integer parse that tolerates a fractional tail, truncating toward zero.
///
/// `"1200"`, `"+1200"`, `"1200.75"` and `"-3."` parse; anything with other
/// characters (or no digits at all) is `None`.
pub fn parse_int_lenient(raw: &str) -> Option<i64> {
    let s = clean_str(raw);
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s, None),
    };
    let digits = int_part.strip_prefix(['+', '-']).unwrap_or(int_part);
    if let Some(frac) = frac_part {
        if !frac.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        if digits.is_empty() && frac.is_empty() {
            return None;
        }
    } else if digits.is_empty() {
        return None;
    }
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if digits.is_empty() {
        // ".5" / "-.5" truncate to zero
        return Some(0);
    }
    int_part.parse::<i64>().ok()
}

/// Strict integer parse used by schema inference.
pub fn parse_int(raw: &str) -> Option<i64> {
    clean_str(raw).parse::<i64>().ok()
}

/// Float parse; empty input is `None`, not zero.
pub fn parse_double(raw: &str) -> Option<f64> {
    let s = clean_str(raw);
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_str() {
        assert_eq!(clean_str("  \"Walmart\" "), "Walmart");
        assert_eq!(clean_str("\""), "\"");
        assert_eq!(clean_str(" West "), "West");
    }

    #[test]
    fn test_strip_chars() {
        assert_eq!(strip_chars("1,234,567", &[',']), "1234567");
        assert_eq!(strip_chars("50%", &['%']), "50");
        assert_eq!(strip_chars("", &[',']), "");
    }

    #[test]
    fn test_parse_int_lenient() {
        assert_eq!(parse_int_lenient("1200"), Some(1200));
        assert_eq!(parse_int_lenient(" +1200 "), Some(1200));
        assert_eq!(parse_int_lenient("1200.0"), Some(1200));
        assert_eq!(parse_int_lenient("-12.9"), Some(-12));
        assert_eq!(parse_int_lenient("7."), Some(7));
        assert_eq!(parse_int_lenient(".5"), Some(0));
        assert_eq!(parse_int_lenient(""), None);
        assert_eq!(parse_int_lenient("."), None);
        assert_eq!(parse_int_lenient("-"), None);
        assert_eq!(parse_int_lenient("$1200"), None);
        assert_eq!(parse_int_lenient("12a"), None);
        assert_eq!(parse_int_lenient("1.2.3"), None);
    }

    #[test]
    fn test_parse_int_matches_naive_parse_without_separators() {
        for v in ["0", "1", "42", "1000", "-17", "9223372036854775807"] {
            assert_eq!(parse_int_lenient(v), v.parse::<i64>().ok(), "{v}");
        }
    }

    #[test]
    fn test_parse_double() {
        assert_eq!(parse_double("1500.25"), Some(1500.25));
        assert_eq!(parse_double(" 2000 "), Some(2000.0));
        assert_eq!(parse_double(""), None);
        assert_eq!(parse_double("n/a"), None);
        assert_eq!(parse_int("12.5"), None);
        assert_eq!(parse_int("12"), Some(12));
    }
}
