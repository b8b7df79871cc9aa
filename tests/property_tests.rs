/// Property-based tests using proptest
/// Resolution and extraction must hold for arbitrary JSON trees
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use zoho_leads_md::envelope::{classify, resolve, MAX_UNWRAP_DEPTH};
use zoho_leads_md::extractor::extract;
use zoho_leads_md::render::{display_name, render};

fn arb_key() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("success".to_string()),
        Just("result".to_string()),
        Just("data".to_string()),
        Just("Data".to_string()),
        Just("records".to_string()),
        Just("Records".to_string()),
        Just("Full_Name".to_string()),
        "[a-z]{1,6}",
    ]
}

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z ]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(6, 64, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map(arb_key(), inner, 0..5)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<String, Value>>())),
        ]
    })
}

// Property: extraction never panics and its counts are consistent
proptest! {
    #[test]
    fn extract_never_panics(value in arb_json()) {
        let extraction = extract(&value);
        let raw = extraction.debug["raw_list_len"].as_u64().unwrap() as usize;
        let dropped = extraction.debug["dropped_non_objects"].as_u64().unwrap() as usize;
        prop_assert_eq!(raw, extraction.records.len() + dropped);
        prop_assert_eq!(
            extraction.debug["records_count"].as_u64().unwrap() as usize,
            extraction.records.len()
        );
    }

    #[test]
    fn render_has_one_bullet_per_record(value in arb_json()) {
        let extraction = extract(&value);
        let listing = render(&extraction.records);
        prop_assert!(listing.starts_with("# Zoho Leads\n\n"));
        if !extraction.records.is_empty() {
            let bullets: Vec<String> = listing.lines().skip(2).map(str::to_string).collect();
            let expected: Vec<String> = extraction
                .records
                .iter()
                .map(|record| format!("- {}", display_name(record)))
                .collect();
            prop_assert_eq!(bullets, expected);
        }
    }
}

// Property: resolution fixed point and depth
proptest! {
    #[test]
    fn non_wrappers_resolve_to_themselves(value in arb_json()) {
        prop_assume!(classify(&value).inner().is_none());
        let resolution = resolve(&value);
        prop_assert_eq!(resolution.value, &value);
        prop_assert_eq!(resolution.trace.len(), 1);
    }

    #[test]
    fn resolution_is_bounded(value in arb_json()) {
        let resolution = resolve(&value);
        prop_assert!(resolution.trace.len() <= MAX_UNWRAP_DEPTH + 1);
        if !resolution.depth_exhausted {
            prop_assert!(classify(resolution.value).inner().is_none());
        }
    }

    #[test]
    fn nested_envelopes_unwrap_exactly(
        layers in 0usize..=MAX_UNWRAP_DEPTH,
        flags in prop::collection::vec(any::<bool>(), MAX_UNWRAP_DEPTH),
        names in prop::collection::vec("[A-Z][a-z]{1,8}", 0..5)
    ) {
        let records: Vec<Value> = names.iter().map(|n| json!({"Full_Name": n})).collect();
        let payload = json!({"data": records});
        let mut value = payload.clone();
        for flag in flags.iter().take(layers) {
            value = json!({"success": flag, "result": value});
        }

        let resolution = resolve(&value);
        prop_assert_eq!(resolution.trace.len(), layers + 1);
        prop_assert_eq!(resolution.value, &payload);
        prop_assert_eq!(extract(&value).records.len(), names.len());
    }
}
