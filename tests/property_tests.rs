/// Property-based tests using proptest
/// Tests merge precedence and validator robustness for arbitrary inputs
use lead_api::models::LeadDocument;
use lead_api::services::merge_lead_data;
use lead_api::validation::{validate_lead_data, validate_lead_patch};
use proptest::prelude::*;
use serde_json::{json, Value};

fn field() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "name",
        "surname",
        "cpf",
        "email",
        "birth_date",
        "occupation",
        "monthly_income",
    ])
    .prop_map(str::to_string)
}

fn document() -> impl Strategy<Value = LeadDocument> {
    prop::collection::btree_map(field(), "[a-z0-9@.]{0,12}", 0..7).prop_map(|m| {
        m.into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect()
    })
}

// Property: existing keys always win, new keys are always added
proptest! {
    #[test]
    fn merge_keeps_every_existing_value(existing in document(), incoming in document()) {
        let merged = merge_lead_data(&existing, &incoming);
        for (key, value) in &existing {
            prop_assert_eq!(merged.get(key), Some(value));
        }
    }

    #[test]
    fn merge_adds_only_missing_keys(existing in document(), incoming in document()) {
        let merged = merge_lead_data(&existing, &incoming);
        for (key, value) in &incoming {
            if !existing.contains_key(key) {
                prop_assert_eq!(merged.get(key), Some(value));
            }
        }
        prop_assert!(merged.keys().all(|k| existing.contains_key(k) || incoming.contains_key(k)));
    }

    #[test]
    fn merge_is_idempotent(existing in document(), incoming in document()) {
        let once = merge_lead_data(&existing, &incoming);
        let twice = merge_lead_data(&once, &incoming);
        prop_assert_eq!(once, twice);
    }
}

// Property: validation should never panic
proptest! {
    #[test]
    fn validation_never_panics(name in "\\PC*", income in any::<f64>(), flag in any::<bool>()) {
        let payload = json!({
            "name": name,
            "surname": if flag { json!(income) } else { json!("x") },
            "monthly_income": income,
        });
        let _ = validate_lead_data(&payload);
        let _ = validate_lead_patch(&payload);
    }

    #[test]
    fn non_empty_required_strings_always_accepted(
        name in ".{1,20}",
        surname in ".{1,20}",
        cpf in "[0-9]{11}",
        email in "[a-z]{1,8}@[a-z]{1,8}\\.com"
    ) {
        let payload = json!({"name": name, "surname": surname, "cpf": cpf, "email": email.clone()});
        let data = validate_lead_data(&payload).unwrap();
        prop_assert_eq!(data.email, email);
    }
}
