/// Korean counter units, largest first.
const UNITS: &[(char, u64)] = &[('억', 100_000_000), ('만', 10_000), ('천', 1_000)];

/// Parse "4.1만", "3.2천", "86,571" and friends into an integer.
///
/// Anything that does not reduce to a plain decimal number yields 0. The
/// decimal part is applied exactly, so "4.1만" is 41000 and not 40999.
pub fn parse_korean_number(text: &str) -> u64 {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return 0;
    }

    let (digits, multiplier) = match UNITS
        .iter()
        .find_map(|(unit, mult)| cleaned.strip_suffix(*unit).map(|rest| (rest, *mult)))
    {
        Some((rest, mult)) => (rest, mult),
        None => (cleaned.as_str(), 1),
    };

    scale_decimal(digits, multiplier).unwrap_or(0)
}

/// `parse_korean_number` for counts that cannot legitimately be zero.
pub fn parse_count(text: &str) -> Option<u64> {
    match parse_korean_number(text) {
        0 => None,
        n => Some(n),
    }
}

/// Multiply a non-negative decimal string by `multiplier` without floats.
/// Fraction digits that fall below the unit are truncated.
fn scale_decimal(digits: &str, multiplier: u64) -> Option<u64> {
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f),
        None => (digits, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(int_part) || !all_digits(frac_part) {
        return None;
    }

    let whole: u64 = if int_part.is_empty() { 0 } else { int_part.parse().ok()? };
    let mut value = whole.checked_mul(multiplier)?;

    let mut place = multiplier;
    for c in frac_part.chars() {
        place /= 10;
        if place == 0 {
            break;
        }
        let digit = c.to_digit(10)? as u64;
        value = value.checked_add(digit * place)?;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_suffixes() {
        assert_eq!(parse_korean_number("4.1만"), 41000);
        assert_eq!(parse_korean_number("3.2천"), 3200);
        assert_eq!(parse_korean_number("12만"), 120000);
        assert_eq!(parse_korean_number("1.5억"), 150_000_000);
        assert_eq!(parse_korean_number(" 2.75만 "), 27500);
    }

    #[test]
    fn comma_grouped() {
        assert_eq!(parse_korean_number("86,571"), 86571);
        assert_eq!(parse_korean_number("1,234,567"), 1234567);
        assert_eq!(parse_korean_number("1,234만"), 12_340_000);
        assert_eq!(parse_korean_number("42"), 42);
    }

    #[test]
    fn fraction_below_unit_is_truncated() {
        assert_eq!(parse_korean_number("1.23456천"), 1234);
        assert_eq!(parse_korean_number("9.9"), 9);
    }

    #[test]
    fn garbage_is_zero() {
        assert_eq!(parse_korean_number("garbage"), 0);
        assert_eq!(parse_korean_number(""), 0);
        assert_eq!(parse_korean_number("만"), 0);
        assert_eq!(parse_korean_number("4.1.2만"), 0);
        assert_eq!(parse_korean_number("약4만"), 0);
        assert_eq!(parse_korean_number("-3천"), 0);
        assert_eq!(parse_korean_number("99999999999999999999억"), 0);
    }

    #[test]
    fn count_treats_zero_as_absent() {
        assert_eq!(parse_count("0"), None);
        assert_eq!(parse_count("n/a"), None);
        assert_eq!(parse_count("3천"), Some(3000));
    }
}
