//! Property-based tests for repair.
//!
//! Whatever repair produces must validate cleanly and unchanged.

use dtd_config::validate::NICE_RANGE;
use dtd_config::{load_str, Mode};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct RuleSpec {
    kind: &'static str,
    nice: i64,
    lower: u64,
    upper: Option<u64>,
    destination: Option<&'static str>,
    fail_message: bool,
}

fn rule_spec() -> impl Strategy<Value = RuleSpec> {
    (
        prop_oneof![Just("file_size"), Just("records")],
        -40i64..=40,
        0u64..10_000,
        prop::option::of(0u64..10_000),
        prop_oneof![Just(Some("cluster")), Just(Some("fail")), Just(None)],
        any::<bool>(),
    )
        .prop_map(|(kind, nice, lower, upper, destination, fail_message)| RuleSpec {
            kind,
            nice,
            lower,
            upper,
            destination,
            fail_message,
        })
}

fn render(rules: &[RuleSpec]) -> String {
    let mut doc = String::from("verbose: false\ndefault_destination: waffles_default\ntools:\n  spades:\n    rules:\n");
    for rule in rules {
        doc.push_str(&format!("      - rule_type: {}\n", rule.kind));
        doc.push_str(&format!("        nice_value: {}\n", rule.nice));
        doc.push_str(&format!("        lower_bound: {}\n", rule.lower));
        match rule.upper {
            Some(upper) => doc.push_str(&format!("        upper_bound: {}\n", upper)),
            None => doc.push_str("        upper_bound: Infinity\n"),
        }
        if let Some(dest) = rule.destination {
            doc.push_str(&format!("        destination: {}\n", dest));
        }
        if rule.fail_message {
            doc.push_str("        fail_message: not today\n");
        }
    }
    doc
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn repaired_config_revalidates_clean(rules in prop::collection::vec(rule_spec(), 1..6)) {
        let first = load_str(&render(&rules), Mode::Repair).unwrap();

        for entry in first.config.tools.values() {
            for rule in &entry.rules {
                prop_assert!(NICE_RANGE.contains(&rule.nice_value));
                let bounds = rule.bounds.as_ref().unwrap();
                prop_assert!(!bounds.is_reversed());
                if rule.destination == "fail" {
                    prop_assert!(rule.fail_message.is_some());
                }
            }
        }

        let yaml = first.config.to_yaml_string().unwrap();
        let second = load_str(&yaml, Mode::Repair).unwrap();
        prop_assert!(second.valid, "diagnostics: {:?}", second.diagnostics);
        prop_assert_eq!(second.config.to_raw(), first.config.to_raw());
    }

    /// Strict mode reports the same validity as repair mode.
    #[test]
    fn strict_and_repair_agree_on_validity(rules in prop::collection::vec(rule_spec(), 1..6)) {
        let doc = render(&rules);
        let repaired = load_str(&doc, Mode::Repair).unwrap();
        let strict = load_str(&doc, Mode::StrictCheckOnly).unwrap();
        prop_assert_eq!(repaired.valid, strict.valid);
        prop_assert_eq!(repaired.diagnostics.len(), strict.diagnostics.len());
    }
}
