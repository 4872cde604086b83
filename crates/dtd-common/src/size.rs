//! Size expressions: human-authored byte counts such as `"1 KB"` or `"infinity"`.
//!
//! Units are binary (1 KB = 1024 B). Rule bounds are written by hand, so the
//! parser tolerates inner whitespace, digit separators and enclosing quotes or
//! brackets. The literal `infinity` (and the integer `-1`) denote an unbounded
//! upper limit.

use crate::error::{Error, Result};
use crate::raw::RawValue;

/// Unit suffixes accepted by the parser, indexed by power of 1024 plus one.
/// The empty suffix and `b` both mean bytes.
const PARSE_UNITS: [&str; 10] = ["", "b", "kb", "mb", "gb", "tb", "pb", "eb", "zb", "yb"];

/// Units used when rendering sizes.
const DISPLAY_UNITS: [&str; 9] = ["B", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Characters stripped from both ends of an expression.
const ENCLOSING: [char; 11] = ['"', '\'', '`', '(', ')', '[', ']', '{', '}', '<', '>'];

/// A canonical byte count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Size {
    /// Whole bytes. `u128` covers the full `yb` range.
    Bytes(u128),
    /// No upper limit.
    Unbounded,
}

impl Size {
    /// Signed view of the unbounded sentinel.
    pub const SENTINEL: i128 = -1;

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Size::Unbounded)
    }

    /// Byte count, or `None` for the sentinel.
    pub fn bytes(&self) -> Option<u128> {
        match self {
            Size::Bytes(b) => Some(*b),
            Size::Unbounded => None,
        }
    }

    /// Signed view used for comparisons: the sentinel is `-1`.
    pub fn as_signed(&self) -> i128 {
        match self {
            Size::Bytes(b) => i128::try_from(*b).unwrap_or(i128::MAX),
            Size::Unbounded => Self::SENTINEL,
        }
    }
}

impl From<u64> for Size {
    fn from(bytes: u64) -> Self {
        Size::Bytes(u128::from(bytes))
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_size(*self, "YB"))
    }
}

fn unparseable(expr: impl std::fmt::Display) -> Error {
    Error::MalformedConfig(format!("Unable to convert size {}", expr))
}

/// Parse a size expression from a raw config value.
///
/// Integers are taken as bytes (`-1` is the sentinel), non-negative floats are
/// rounded to the nearest byte, strings go through [`parse_size_str`].
pub fn parse_size(expr: &RawValue) -> Result<Size> {
    match expr {
        RawValue::Integer(-1) => Ok(Size::Unbounded),
        RawValue::Integer(i) => u128::try_from(*i)
            .map(Size::Bytes)
            .map_err(|_| unparseable(expr)),
        RawValue::Float(x) if *x == -1.0 => Ok(Size::Unbounded),
        RawValue::Float(x) if x.is_finite() && *x >= 0.0 => Ok(Size::Bytes(x.round() as u128)),
        RawValue::String(s) => parse_size_str(s),
        _ => Err(unparseable(expr)),
    }
}

/// Parse a size expression such as `"1 KB"`, `"100000000"`, `"2.5 gb"` or `"Infinity"`.
pub fn parse_size_str(text: &str) -> Result<Size> {
    let trimmed = text.trim_matches(|c: char| c.is_whitespace() || ENCLOSING.contains(&c));

    if trimmed.eq_ignore_ascii_case("infinity") || trimmed == "-1" {
        return Ok(Size::Unbounded);
    }

    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c.is_whitespace() || matches!(c, '.' | ',' | '_')))
        .unwrap_or(trimmed.len());
    let (magnitude, unit) = trimmed.split_at(split);

    let digits: String = magnitude
        .chars()
        .filter(|c| !(c.is_whitespace() || matches!(c, ',' | '_')))
        .collect();
    if digits.is_empty() {
        return Err(unparseable(text));
    }

    let unit = unit.trim().to_ascii_lowercase();
    let position = PARSE_UNITS
        .iter()
        .position(|u| *u == unit)
        .ok_or_else(|| unparseable(text))?;
    let exponent = u32::try_from(position.saturating_sub(1)).map_err(|_| unparseable(text))?;

    let bytes = scale_magnitude(&digits, exponent).ok_or_else(|| unparseable(text))?;
    if i128::try_from(bytes).is_err() {
        return Err(unparseable(text));
    }
    Ok(Size::Bytes(bytes))
}

/// `digits` is ASCII digits with at most one `.`; returns `magnitude * 1024^exponent`
/// rounded half-up to whole bytes, or `None` on syntax error or overflow.
fn scale_magnitude(digits: &str, exponent: u32) -> Option<u128> {
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    if fraction.contains('.') || (whole.is_empty() && fraction.is_empty()) {
        return None;
    }

    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let whole_bytes = whole.checked_mul(1024u128.checked_pow(exponent)?)?;
    if fraction.is_empty() {
        return Some(whole_bytes);
    }
    whole_bytes.checked_add(scale_fraction(fraction, exponent)?)
}

/// Exact `0.<fraction> * 1024^exponent`, rounded half-up.
///
/// The product is built in decimal digits, so no precision is lost for long
/// fractions or large units.
fn scale_fraction(fraction: &str, exponent: u32) -> Option<u128> {
    let mut product: Vec<u32> = fraction.bytes().map(|b| u32::from(b - b'0')).collect();
    for _ in 0..exponent {
        let mut carry = 0;
        for digit in product.iter_mut().rev() {
            let v = *digit * 1024 + carry;
            *digit = v % 10;
            carry = v / 10;
        }
        while carry > 0 {
            product.insert(0, carry % 10);
            carry /= 10;
        }
    }

    let point = product.len() - fraction.len();
    let mut bytes: u128 = 0;
    for digit in &product[..point] {
        bytes = bytes.checked_mul(10)?.checked_add(u128::from(*digit))?;
    }
    if product.get(point).is_some_and(|d| *d >= 5) {
        bytes = bytes.checked_add(1)?;
    }
    Some(bytes)
}

/// Render a size as `"<value to 2 decimals> <UNIT>"`.
///
/// The value is divided by 1024 until it drops below 1024 or the unit reaches
/// `cap_unit`. Unknown caps fall back to `YB`.
pub fn format_size(size: Size, cap_unit: &str) -> String {
    let bytes = match size {
        Size::Unbounded => return "Infinity".to_string(),
        Size::Bytes(b) => b,
    };

    let upto = DISPLAY_UNITS
        .iter()
        .position(|u| u.eq_ignore_ascii_case(cap_unit.trim()))
        .unwrap_or(DISPLAY_UNITS.len() - 1);

    let mut value = bytes as f64;
    let mut idx = 0;
    while value >= 1024.0 && idx < upto {
        value /= 1024.0;
        idx += 1;
    }

    format!("{:.2} {}", value, DISPLAY_UNITS[idx])
}

/// Render a loosely-typed byte count.
///
/// Accepts integers, floats (truncated) and integer strings; `-1` renders as
/// `Infinity`. Anything that cannot be cast to a byte count is
/// [`Error::InvalidSize`].
pub fn format_value(value: &RawValue, cap_unit: &str) -> Result<String> {
    let uncastable =
        || Error::InvalidSize(format!("format_value passed uncastable non numeric value {}", value));

    let signed: i128 = match value {
        RawValue::Integer(i) => i128::from(*i),
        RawValue::Float(x) if x.is_finite() => x.trunc() as i128,
        RawValue::String(s) => s.trim().parse::<i128>().map_err(|_| uncastable())?,
        _ => return Err(uncastable()),
    };

    let size = match signed {
        Size::SENTINEL => Size::Unbounded,
        n => Size::Bytes(u128::try_from(n).map_err(|_| uncastable())?),
    };
    Ok(format_size(size, cap_unit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_units() {
        assert_eq!(parse_size_str("1 KB").unwrap(), Size::Bytes(1024));
        assert_eq!(parse_size_str("1kb").unwrap(), Size::Bytes(1024));
        assert_eq!(parse_size_str("100000000").unwrap(), Size::Bytes(100_000_000));
        assert_eq!(parse_size_str("12 b").unwrap(), Size::Bytes(12));
        assert_eq!(parse_size_str("3 MB").unwrap(), Size::Bytes(3 * 1024 * 1024));
        assert_eq!(parse_size_str("1 YB").unwrap(), Size::Bytes(1u128 << 80));
    }

    #[test]
    fn test_parse_infinity() {
        assert_eq!(parse_size_str("infinity").unwrap(), Size::Unbounded);
        assert_eq!(parse_size_str("Infinity").unwrap(), Size::Unbounded);
        assert_eq!(parse_size_str(" INFINITY ").unwrap(), Size::Unbounded);
        assert_eq!(parse_size(&RawValue::Integer(-1)).unwrap(), Size::Unbounded);
        assert_eq!(Size::Unbounded.as_signed(), -1);
    }

    #[test]
    fn test_parse_tolerates_whitespace_and_punctuation() {
        assert_eq!(parse_size_str("  1 0 0 KB ").unwrap(), Size::Bytes(100 * 1024));
        assert_eq!(parse_size_str("1,000").unwrap(), Size::Bytes(1000));
        assert_eq!(parse_size_str("\"2 kb\"").unwrap(), Size::Bytes(2048));
        assert_eq!(parse_size_str("[4 KB]").unwrap(), Size::Bytes(4096));
    }

    #[test]
    fn test_parse_fractional_magnitude() {
        assert_eq!(parse_size_str("1.5 KB").unwrap(), Size::Bytes(1536));
        assert_eq!(parse_size_str("0.5 B").unwrap(), Size::Bytes(1));
        assert_eq!(parse_size_str(".25 kb").unwrap(), Size::Bytes(256));
        assert_eq!(parse_size_str("2.5 B").unwrap(), Size::Bytes(3));
        assert_eq!(parse_size_str("0.4 B").unwrap(), Size::Bytes(0));
    }

    #[test]
    fn test_parse_fraction_exact_for_large_units() {
        // 0.1 * 2^80 = 120892581961462917470617.6
        assert_eq!(
            parse_size_str("0.1 YB").unwrap(),
            Size::Bytes(120_892_581_961_462_917_470_618)
        );
        // 1.3 * 2^60 = 1498797955988901068.8
        assert_eq!(
            parse_size_str("1.3 EB").unwrap(),
            Size::Bytes(1_498_797_955_988_901_069)
        );
        assert_eq!(
            parse_size_str("0.000000000000000000000001 YB").unwrap(),
            Size::Bytes(1)
        );
    }

    #[test]
    fn test_parse_raw_values() {
        assert_eq!(parse_size(&RawValue::Integer(0)).unwrap(), Size::Bytes(0));
        assert_eq!(parse_size(&RawValue::Integer(2048)).unwrap(), Size::Bytes(2048));
        assert_eq!(parse_size(&RawValue::Float(10.6)).unwrap(), Size::Bytes(11));
        assert_eq!(parse_size(&RawValue::from("1 KB")).unwrap(), Size::Bytes(1024));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["12 parsecs", "KB", "", "-5", "1.2.3 KB", "one KB"] {
            let err = parse_size_str(bad).unwrap_err();
            assert!(
                matches!(err, Error::MalformedConfig(ref m) if m.contains("Unable to convert size")),
                "expected malformed for {:?}, got {:?}",
                bad,
                err
            );
        }
        assert!(parse_size(&RawValue::Integer(-7)).is_err());
        assert!(parse_size(&RawValue::Bool(true)).is_err());
        assert!(parse_size(&RawValue::Null).is_err());
    }

    #[test]
    fn test_parse_rejects_overflow() {
        assert!(parse_size_str("999999999999999999999999999999 YB").is_err());
    }

    #[test]
    fn test_format_sizes() {
        assert_eq!(format_size(Size::Bytes(1024), "YB"), "1.00 KB");
        assert_eq!(format_size(Size::Bytes(0), "YB"), "0.00 B");
        assert_eq!(format_size(Size::Bytes(293), "YB"), "293.00 B");
        assert_eq!(format_size(Size::Bytes(3307), "YB"), "3.23 KB");
        assert_eq!(format_size(Size::Unbounded, "YB"), "Infinity");
        assert_eq!(Size::Bytes(1536).to_string(), "1.50 KB");
    }

    #[test]
    fn test_format_cap_unit() {
        let gib = Size::Bytes(1024 * 1024 * 1024);
        assert_eq!(format_size(gib, "MB"), "1024.00 MB");
        assert_eq!(format_size(gib, " kb "), "1048576.00 KB");
        assert_eq!(format_size(gib, "bogus"), "1.00 GB");
        assert_eq!(format_size(gib, "B"), "1073741824.00 B");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&RawValue::Integer(-1), "YB").unwrap(), "Infinity");
        assert_eq!(format_value(&RawValue::Integer(1024), "YB").unwrap(), "1.00 KB");
        assert_eq!(format_value(&RawValue::from("2048"), "YB").unwrap(), "2.00 KB");
        assert_eq!(format_value(&RawValue::Float(1024.9), "YB").unwrap(), "1.00 KB");

        for bad in [
            RawValue::from("1 KB"),
            RawValue::Bool(true),
            RawValue::Null,
            RawValue::Integer(-4),
        ] {
            let err = format_value(&bad, "YB").unwrap_err();
            assert!(matches!(err, Error::InvalidSize(_)), "{:?}", bad);
        }
    }
}
