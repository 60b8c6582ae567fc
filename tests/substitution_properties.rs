//! Property tests for the substitution engine
//!
//! For any `key<ws>=<ws>value` line, replacement rewrites only the value
//! segment, and an absent key adds exactly one line.

use game_tuner::models::{OverrideSet, OverrideValue};
use game_tuner::SubstitutionEngine;
use proptest::prelude::*;

fn key_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9_.]{0,15}"
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_.,:;/ -]{1,20}".prop_map(|v| v.trim().to_string()).prop_filter("non-empty", |v| !v.is_empty())
}

proptest! {
    #[test]
    fn replacement_changes_only_the_value(
        key in key_strategy(),
        old in value_strategy(),
        new in value_strategy(),
        left in "[ \t]{0,3}",
        right in "[ \t]{0,3}",
        before in "(# header\n)?",
        after in "(other_key=1\n)?",
    ) {
        let text = format!("{}{}{}={}{}\n{}", before, key, left, right, old, after);
        let overrides = OverrideSet::new().with(key.clone(), OverrideValue::from(new.clone()));

        let outcome = SubstitutionEngine::default().apply(&text, &overrides);

        let expected = format!("{}{}{}={}{}\n{}", before, key, left, right, new, after);
        prop_assert_eq!(outcome.text, expected);
    }

    #[test]
    fn absent_key_appends_exactly_one_line(
        lines in proptest::collection::vec("[a-z]{1,8}=[0-9]{1,4}", 0..6),
        value in value_strategy(),
    ) {
        let text: String = lines.iter().map(|l| format!("{}\n", l)).collect();
        let key = "zz_absent_key";
        let overrides = OverrideSet::new().with(key, OverrideValue::from(value.clone()));

        let outcome = SubstitutionEngine::default().apply(&text, &overrides);

        prop_assert!(outcome.text.starts_with(&text));
        let added = &outcome.text[text.len()..];
        prop_assert_eq!(added, format!("{}={}", key, value) + if text.is_empty() { "" } else { "\n" });
        prop_assert_eq!(outcome.text.lines().count(), lines.len() + 1);
    }
}
