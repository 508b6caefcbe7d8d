//! Currency/amount normalizer.
//!
//! Turns vernacular quantities ("20k", "3 triệu", "50.000", "1.5tr") into a
//! whole number of đồng.

use std::sync::LazyLock;

use moneykeeper_types::error::AmountError;
use regex::Regex;

/// Unit tokens recognized after a number, as a regex alternation.
/// Longer spellings come first so `leftmost-first` matching prefers them.
pub(crate) const UNIT_ALTERNATION: &str =
    "nghìn|ngàn|nghin|ngan|triệu|trieu|tỷ|tỉ|ty|tr|k|đồng|dong|vnđ|vnd|đ|d";

static AMOUNT_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\s*([\d\s.,]+?)\s*({UNIT_ALTERNATION})?\s*$"))
        .expect("amount phrase pattern is valid")
});

/// Multiplier for a unit token. `None` for tokens that are not units.
pub fn unit_scale(unit: &str) -> Option<i64> {
    match unit.trim().to_lowercase().as_str() {
        "k" | "nghìn" | "ngàn" | "nghin" | "ngan" => Some(1_000),
        "tr" | "triệu" | "trieu" => Some(1_000_000),
        "tỷ" | "tỉ" | "ty" => Some(1_000_000_000),
        "đ" | "d" | "đồng" | "dong" | "vnd" | "vnđ" => Some(1),
        _ => None,
    }
}

/// Normalize a numeric substring plus optional unit into đồng.
///
/// Whitespace is ignored. A `.` or `,` followed by exactly three digits is a
/// thousands separator; a single trailing separator followed by one or two
/// digits is a decimal point, so `("1.5", "tr")` is 1,500,000. Fractions of
/// a đồng are rounded half up.
pub fn normalize_amount(numeric: &str, unit: Option<&str>) -> Result<i64, AmountError> {
    let invalid = || AmountError::InvalidAmountFormat(numeric.to_string());

    let compact: String = numeric.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(invalid());
    }

    let scale = match unit.map(str::trim).filter(|u| !u.is_empty()) {
        Some(u) => unit_scale(u).ok_or_else(invalid)?,
        None => 1,
    };

    let (integer_part, fraction) = split_decimal(&compact).ok_or_else(invalid)?;
    let integer: i128 = parse_grouped(integer_part).ok_or_else(invalid)?;

    let (fraction_value, denominator) = match fraction {
        Some(digits) => (
            digits.parse::<i128>().map_err(|_| invalid())?,
            10_i128.pow(digits.len() as u32),
        ),
        None => (0, 1),
    };

    let scaled = (integer * denominator + fraction_value) * i128::from(scale);
    let rounded = (scaled + denominator / 2) / denominator;
    i64::try_from(rounded).map_err(|_| invalid())
}

/// Parse a whole phrase such as `"20k"`, `"3 triệu"` or `"50.000"`.
pub fn parse_amount_phrase(phrase: &str) -> Result<i64, AmountError> {
    let lowered = phrase.to_lowercase();
    let caps = AMOUNT_PHRASE
        .captures(&lowered)
        .ok_or_else(|| AmountError::InvalidAmountFormat(phrase.to_string()))?;
    let numeric = caps.get(1).map_or("", |m| m.as_str());
    normalize_amount(numeric, caps.get(2).map(|m| m.as_str()))
}

/// Split off a decimal fraction: the last separator when it is followed by
/// one or two digits. Returns `None` for malformed input.
fn split_decimal(s: &str) -> Option<(&str, Option<&str>)> {
    match s.rfind(['.', ',']) {
        Some(idx) => {
            let tail = &s[idx + 1..];
            if (1..=2).contains(&tail.len()) && tail.chars().all(|c| c.is_ascii_digit()) {
                Some((&s[..idx], Some(tail)))
            } else {
                Some((s, None))
            }
        }
        None => Some((s, None)),
    }
}

/// Parse digits optionally grouped by `.`/`,` in threes ("1.234.567").
fn parse_grouped(s: &str) -> Option<i128> {
    let groups: Vec<&str> = s.split(['.', ',']).collect();
    let first = groups.first()?;
    if first.is_empty() || !first.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if groups.len() > 1 {
        if first.len() > 3 {
            return None;
        }
        let rest_ok = groups[1..]
            .iter()
            .all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()));
        if !rest_ok {
            return None;
        }
    }
    groups.concat().parse().ok()
}
