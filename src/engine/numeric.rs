const THOUSANDS_SEPARATORS: [char; 6] = [',', ' ', '\'', '\u{00A0}', '\u{2009}', '\u{202F}'];

/// Parses a locale-formatted number with an optional unit word ("million",
/// "m", "thousand", "k"). Anything that is not a plain decimal after the
/// thousands separators are removed yields `None`.
pub fn parse_amount(number: &str, unit_tail: Option<&str>) -> Option<f64> {
    let digits: String = number
        .trim()
        .chars()
        .filter(|character| !THOUSANDS_SEPARATORS.contains(character))
        .collect();
    if !is_plain_decimal(&digits) {
        return None;
    }

    let value = digits.parse::<f64>().ok()?;
    let scaled = value * unit_multiplier(unit_tail.unwrap_or_default());
    scaled.is_finite().then_some(scaled)
}

/// Splits a token such as "2k" or "1.5 million" into number and unit.
pub fn parse_numeric_token(token: &str) -> Option<f64> {
    let token = token.trim();
    let split_at = token
        .char_indices()
        .find(|(_, character)| character.is_alphabetic())
        .map(|(index, _)| index)
        .unwrap_or(token.len());
    let (number, tail) = token.split_at(split_at);

    let tail = tail.trim();
    parse_amount(number, (!tail.is_empty()).then_some(tail))
}

pub fn unit_multiplier(tail: &str) -> f64 {
    let word = tail
        .split(|character: char| !character.is_alphanumeric())
        .find(|word| !word.is_empty())
        .unwrap_or_default()
        .to_lowercase();

    match word.as_str() {
        "million" | "m" => 1_000_000.0,
        "thousand" | "k" => 1_000.0,
        _ => 1.0,
    }
}

fn is_plain_decimal(value: &str) -> bool {
    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (value, None),
    };

    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|byte| byte.is_ascii_digit());
    all_digits(whole) && fraction.is_none_or(all_digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_separator_variants_parse_to_the_same_magnitude() {
        for notation in ["100,000", "100 000", "100'000", "100\u{00A0}000", "100\u{202F}000"] {
            assert_eq!(parse_amount(notation, None), Some(100_000.0), "{notation}");
        }
    }

    #[test]
    fn unit_words_scale_the_value() {
        assert_eq!(parse_numeric_token("1.5 million"), Some(1_500_000.0));
        assert_eq!(parse_numeric_token("2k"), Some(2_000.0));
        assert_eq!(parse_numeric_token("3 thousand"), Some(3_000.0));
        assert_eq!(parse_amount("1", Some("M")), Some(1_000_000.0));
    }

    #[test]
    fn unrecognized_unit_leaves_value_unscaled() {
        assert_eq!(parse_amount("750", Some("per day")), Some(750.0));
        assert_eq!(parse_numeric_token("250 dollars"), Some(250.0));
    }

    #[test]
    fn malformed_numbers_are_no_value() {
        assert_eq!(parse_amount("", None), None);
        assert_eq!(parse_amount("1.2.3", None), None);
        assert_eq!(parse_amount("12a", None), None);
        assert_eq!(parse_amount(".5", None), None);
        assert_eq!(parse_numeric_token("inf"), None);
        assert_eq!(parse_numeric_token("NaN"), None);
        assert_eq!(parse_numeric_token("million"), None);
    }
}
