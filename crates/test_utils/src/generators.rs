//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants.

use chrono::NaiveDate;
use domain_underwriting::{Eligibility, ResponseValue, Tristate};
use proptest::prelude::*;
use serde_json::{json, Value};

/// Strategy for generating Tristate values
pub fn tristate_strategy() -> impl Strategy<Value = Tristate> {
    prop_oneof![
        Just(Tristate::True),
        Just(Tristate::False),
        Just(Tristate::Unknown),
    ]
}

/// Strategy for generating eligibility outcomes
pub fn eligibility_strategy() -> impl Strategy<Value = Eligibility> {
    prop_oneof![
        Just(Eligibility::Eligible),
        Just(Eligibility::Refer),
        Just(Eligibility::Ineligible),
    ]
}

/// Strategy for generating calendar dates between 1950 and 2030
pub fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (1950i32..2030, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

/// Strategy for generating arbitrary raw answer values, including junk
pub fn response_value_strategy() -> impl Strategy<Value = ResponseValue> {
    let leaf = prop_oneof![
        Just(ResponseValue::Null),
        any::<bool>().prop_map(ResponseValue::Bool),
        any::<f64>().prop_map(ResponseValue::Number),
        ".{0,24}".prop_map(ResponseValue::Text),
        Just(ResponseValue::Text("None".to_string())),
        Just(ResponseValue::Text("NaN".to_string())),
    ];
    leaf.prop_recursive(2, 8, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(ResponseValue::List)
    })
}

/// Strategy for a boolean leaf over a small set of diabetes facts
fn boolean_leaf_strategy() -> impl Strategy<Value = Value> {
    (
        prop::sample::select(vec!["is_controlled", "insulin_use", "good_control", "missing_fact"]),
        any::<bool>(),
    )
        .prop_map(|(name, value)| {
            json!({
                "type": "boolean",
                "field": format!("diabetes.{}", name),
                "operator": "eq",
                "value": value,
            })
        })
}

/// Strategy for generating predicate JSON trees up to depth 3
pub fn predicate_json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![Just(json!({})), boolean_leaf_strategy()];
    leaf.prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..3).prop_map(|c| json!({ "all": c })),
            prop::collection::vec(inner.clone(), 0..3).prop_map(|c| json!({ "any": c })),
            inner.prop_map(|c| json!({ "not": c })),
        ]
    })
}
