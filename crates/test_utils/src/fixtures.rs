//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for the underwriting engine.
//! These fixtures are designed to be consistent and predictable for unit tests.

use chrono::NaiveDate;
use core_kernel::{CarrierId, ProductId};
use domain_underwriting::{ApplicantProfile, ConditionAnswer, Gender, RuleSet};
use once_cell::sync::Lazy;
use serde_json::{json, Value};

use crate::builders::{ConditionAnswerBuilder, RuleBuilder, RuleSetBuilder};

/// Carrier shared by every fixture for the life of the test process
static CARRIER_ID: Lazy<CarrierId> = Lazy::new(CarrierId::new_v7);

/// Fixture for identifiers
pub struct IdFixtures;

impl IdFixtures {
    /// The carrier every builder uses by default
    pub fn carrier_id() -> CarrierId {
        *CARRIER_ID
    }

    /// A fresh product identifier
    pub fn product_id() -> ProductId {
        ProductId::new()
    }
}

/// Fixture for evaluation dates
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// The as-of date used throughout the test suite
    pub fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }
}

/// Fixture for applicants
pub struct ApplicantFixtures;

impl ApplicantFixtures {
    /// 55-year-old applicant with no other known attributes
    pub fn age_55() -> ApplicantProfile {
        ApplicantProfile::new(55)
    }

    /// 40-year-old non-smoking female
    pub fn female_40() -> ApplicantProfile {
        ApplicantProfile::new(40)
            .with_gender(Gender::Female)
            .with_tobacco(false)
    }
}

/// Fixture for questionnaire answers
pub struct AnswerFixtures;

impl AnswerFixtures {
    /// Insulin-treated diabetes with an A1C of 6.5
    pub fn controlled_diabetes() -> ConditionAnswer {
        ConditionAnswerBuilder::new("diabetes")
            .answer("treatment", "Insulin only")
            .answer("a1c_level", 6.5)
            .build()
    }

    /// Diabetes with every question skipped
    pub fn empty_diabetes() -> ConditionAnswer {
        ConditionAnswerBuilder::new("diabetes").build()
    }

    /// Stroke six months before the fixture as-of date, with residual weakness
    pub fn recent_stroke() -> ConditionAnswer {
        ConditionAnswerBuilder::new("stroke")
            .answer("date_of_event", "2023-12-01")
            .labels("residual_effects", ["Paralysis/weakness"])
            .build()
    }

    /// Stroke five years before the fixture as-of date, no residual effects
    pub fn remote_stroke() -> ConditionAnswer {
        ConditionAnswerBuilder::new("stroke")
            .answer("date_of_event", "2019-06-01")
            .labels("residual_effects", ["None"])
            .build()
    }
}

/// Fixture for predicate JSON
pub struct PredicateFixtures;

impl PredicateFixtures {
    /// `{type: boolean, field, operator: eq, value}`
    pub fn boolean_eq(field: &str, value: bool) -> Value {
        json!({"type": "boolean", "field": field, "operator": "eq", "value": value})
    }

    /// `{type: numeric, field, operator, value}`
    pub fn numeric(field: &str, operator: &str, value: f64) -> Value {
        json!({"type": "numeric", "field": field, "operator": operator, "value": value})
    }

    /// `{type: date, field, operator: years_since_<cmp>, value}`
    pub fn years_since(field: &str, cmp: &str, value: f64) -> Value {
        json!({"type": "date", "field": field, "operator": format!("years_since_{}", cmp), "value": value})
    }
}

/// Fixture for rule sets
pub struct RuleSetFixtures;

impl RuleSetFixtures {
    /// Diabetes rules: controlled → eligible/standard, uncontrolled → refer
    pub fn diabetes() -> RuleSet {
        RuleSetBuilder::for_condition("diabetes")
            .rule(
                RuleBuilder::new("Controlled diabetes")
                    .priority(10)
                    .when(PredicateFixtures::boolean_eq("diabetes.is_controlled", true))
                    .eligible("standard")
                    .reason("Diabetes well controlled")
                    .build(),
            )
            .rule(
                RuleBuilder::new("Uncontrolled diabetes")
                    .priority(20)
                    .when(PredicateFixtures::boolean_eq("diabetes.is_controlled", false))
                    .refer("Diabetes not controlled")
                    .concern("diabetes_control")
                    .build(),
            )
            .build()
    }

    /// Stroke rules: declined within two years of the event
    pub fn stroke() -> RuleSet {
        RuleSetBuilder::for_condition("stroke")
            .rule(
                RuleBuilder::new("Recent stroke")
                    .priority(100)
                    .when(PredicateFixtures::years_since("stroke.event_date", "lt", 2.0))
                    .ineligible("Stroke within the last 2 years")
                    .concern("recent_stroke")
                    .build(),
            )
            .rule(
                RuleBuilder::new("Remote stroke")
                    .priority(10)
                    .when(PredicateFixtures::years_since("stroke.event_date", "gte", 2.0))
                    .eligible("standard")
                    .build(),
            )
            .build()
    }
}
