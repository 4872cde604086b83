//! Property-based tests for size parsing and formatting.

use dtd_common::{format_size, format_value, parse_size, parse_size_str, RawValue, Size};
use proptest::prelude::*;

const UNITS: [&str; 9] = ["B", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Bytes per unit of the rendered string, e.g. 1024 for "1.50 KB".
fn unit_scale(rendered: &str) -> u128 {
    let unit = rendered.rsplit(' ').next().unwrap_or("B");
    let idx = UNITS.iter().position(|u| *u == unit).expect("known unit");
    1024u128.pow(idx as u32)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Re-parsing a rendered size lands within two-decimal rounding of the original.
    #[test]
    fn format_then_parse_within_tolerance(bytes in any::<u64>()) {
        let rendered = format_size(Size::from(bytes), "YB");
        let parsed = parse_size_str(&rendered).expect("rendered sizes parse");
        let Size::Bytes(parsed) = parsed else {
            panic!("finite size parsed as unbounded: {}", rendered);
        };

        let tolerance = unit_scale(&rendered) as f64 * 0.006 + 1.0;
        let diff = (parsed as f64 - bytes as f64).abs();
        prop_assert!(diff <= tolerance, "{} -> {:?} -> {} (diff {})", bytes, rendered, parsed, diff);
    }

    /// Sizes below 1 KB round-trip exactly.
    #[test]
    fn small_sizes_roundtrip_exactly(bytes in 0u64..1024) {
        let rendered = format_size(Size::from(bytes), "YB");
        prop_assert_eq!(parse_size_str(&rendered).unwrap(), Size::Bytes(bytes as u128));
    }

    /// Integer units scale by exact powers of 1024 regardless of case and spacing.
    #[test]
    fn units_scale_by_1024(n in 0u64..100_000, idx in 1usize..9, upper in any::<bool>(), gap in 0usize..3) {
        let unit = if upper { UNITS[idx].to_string() } else { UNITS[idx].to_lowercase() };
        let expr = format!("{}{}{}", n, " ".repeat(gap), unit);
        let expected = u128::from(n) * 1024u128.pow(idx as u32);
        prop_assert_eq!(parse_size_str(&expr).unwrap(), Size::Bytes(expected));
    }

    /// Formatting never divides past the cap unit.
    #[test]
    fn cap_unit_is_respected(bytes in any::<u64>(), cap in 0usize..9) {
        let rendered = format_size(Size::from(bytes), UNITS[cap]);
        let unit = rendered.rsplit(' ').next().unwrap();
        let idx = UNITS.iter().position(|u| *u == unit).unwrap();
        prop_assert!(idx <= cap);
    }

    /// Integer values format the same whether typed or given as strings.
    #[test]
    fn format_value_accepts_integer_strings(bytes in 0i64..i64::MAX) {
        let typed = format_value(&RawValue::Integer(bytes), "YB").unwrap();
        let text = format_value(&RawValue::from(bytes.to_string()), "YB").unwrap();
        prop_assert_eq!(typed, text);
    }

    /// Arbitrary text either parses or fails cleanly.
    #[test]
    fn parse_never_panics(text in ".{0,40}") {
        let _ = parse_size_str(&text);
        let _ = parse_size(&RawValue::from(text.as_str()));
    }
}

#[test]
fn sentinel_roundtrips_exactly() {
    let rendered = format_size(Size::Unbounded, "YB");
    assert_eq!(rendered, "Infinity");
    assert_eq!(parse_size_str(&rendered).unwrap(), Size::Unbounded);
    assert_eq!(format_value(&RawValue::Integer(-1), "KB").unwrap(), "Infinity");
}
