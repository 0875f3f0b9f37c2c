//! Phone number normalization.
//!
//! Every subscriber is identified by a single canonical string per physical
//! phone number, so downstream lookups are exact string matches. Raw text
//! from carriers and admin forms goes through [`normalize`] before it
//! touches the contact registry.

use thiserror::Error;

/// Why a raw phone string could not be normalized.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Phone number is empty")]
    Empty,

    #[error("Phone number too short")]
    TooShort,

    #[error("Phone number too long")]
    TooLong,

    #[error("Invalid country code")]
    InvalidCountryCode,

    #[error("Phone number is not dialable")]
    NotDialable,

    #[error("Unknown default region: {0}")]
    UnknownRegion(String),
}

/// Maximum digits in an international number (ITU E.164).
const MAX_DIGITS: usize = 15;
const MIN_DIGITS: usize = 7;

/// Dialing rules for a default region: country code plus the accepted
/// national number lengths.
struct RegionRule {
    country_code: &'static str,
    national_len: std::ops::RangeInclusive<usize>,
}

fn region_rule(region: &str) -> Option<RegionRule> {
    let rule = match region.to_ascii_uppercase().as_str() {
        "US" | "CA" => RegionRule {
            country_code: "1",
            national_len: 10..=10,
        },
        "GB" => RegionRule {
            country_code: "44",
            national_len: 9..=10,
        },
        "AU" => RegionRule {
            country_code: "61",
            national_len: 9..=9,
        },
        "NZ" => RegionRule {
            country_code: "64",
            national_len: 8..=10,
        },
        "DE" => RegionRule {
            country_code: "49",
            national_len: 10..=11,
        },
        "FR" => RegionRule {
            country_code: "33",
            national_len: 9..=9,
        },
        "IN" => RegionRule {
            country_code: "91",
            national_len: 10..=10,
        },
        _ => return None,
    };
    Some(rule)
}

/// Normalize a raw phone string to its canonical `+`-prefixed form.
///
/// Input starting with `+` is parsed as an international number with no
/// assumed region; anything else is parsed against `default_region`.
/// Formatting noise (spaces, dashes, parentheses, dots) is ignored, so
/// `"(412) 555-0100"` and `"412.555.0100"` normalize identically.
pub fn normalize(raw: &str, default_region: &str) -> Result<String, NormalizeError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(NormalizeError::Empty);
    }

    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if raw.starts_with('+') {
        return normalize_international(&digits);
    }

    let rule = region_rule(default_region)
        .ok_or_else(|| NormalizeError::UnknownRegion(default_region.to_string()))?;

    if rule.country_code == "1" {
        normalize_nanp(&digits)
    } else {
        normalize_regional(&digits, &rule)
    }
}

fn normalize_international(digits: &str) -> Result<String, NormalizeError> {
    if digits.len() < MIN_DIGITS {
        return Err(NormalizeError::TooShort);
    }
    if digits.len() > MAX_DIGITS {
        return Err(NormalizeError::TooLong);
    }
    // No country code starts with 0.
    if digits.starts_with('0') {
        return Err(NormalizeError::InvalidCountryCode);
    }
    Ok(format!("+{digits}"))
}

/// North American Numbering Plan: exactly ten national digits, with an
/// optional leading country-code `1`. Area code and exchange must start
/// with 2-9 to be dialable.
fn normalize_nanp(digits: &str) -> Result<String, NormalizeError> {
    let national = match digits.len() {
        10 => digits,
        11 if digits.starts_with('1') => &digits[1..],
        0..=9 => return Err(NormalizeError::TooShort),
        _ => return Err(NormalizeError::TooLong),
    };

    let area = national.as_bytes()[0];
    let exchange = national.as_bytes()[3];
    if !(b'2'..=b'9').contains(&area) || !(b'2'..=b'9').contains(&exchange) {
        return Err(NormalizeError::NotDialable);
    }

    Ok(format!("+1{national}"))
}

fn normalize_regional(digits: &str, rule: &RegionRule) -> Result<String, NormalizeError> {
    // Trunk prefix (a leading 0 dialed domestically) is not part of the
    // international form.
    let national = digits.strip_prefix('0').unwrap_or(digits);

    // Accept input that already carries the region's country code.
    if let Some(rest) = national.strip_prefix(rule.country_code) {
        if rule.national_len.contains(&rest.len()) {
            return Ok(format!("+{}{}", rule.country_code, rest));
        }
    }

    if national.len() < *rule.national_len.start() {
        return Err(NormalizeError::TooShort);
    }
    if national.len() > *rule.national_len.end() {
        return Err(NormalizeError::TooLong);
    }

    let canonical = format!("+{}{}", rule.country_code, national);
    if canonical.len() - 1 > MAX_DIGITS {
        return Err(NormalizeError::TooLong);
    }
    Ok(canonical)
}
