//! Fact Transformer Tests
//!
//! # Test Coverage
//!
//! - Absence propagation: unanswered questions never become `false`, `0` or `[]`
//! - Explicit "None" selections versus unanswered multi-selects
//! - Numeric strings parsed the same as numbers
//! - Negated treatment phrases do not imply insulin
//! - Registry fallback for unregistered conditions
//! - Property tests over arbitrary raw answers

use domain_underwriting::transform::{DiabetesTransform, HeartAttackTransform, HypertensionTransform};
use domain_underwriting::{
    ApplicantProfile, ConditionTransform, Diagnostic, FactValue, ResponseValue, Responses,
    TransformContext, TransformRegistry,
};
use proptest::prelude::*;
use test_utils::{
    assert_fact_absent, assert_fact_eq, response_value_strategy, AnswerFixtures, ConditionAnswerBuilder,
    TemporalFixtures,
};

fn ctx() -> TransformContext {
    TransformContext {
        applicant_age: 55,
        as_of: TemporalFixtures::as_of(),
    }
}

// ============================================================================
// ABSENCE PROPAGATION
// ============================================================================

mod absence_propagation {
    use super::*;

    #[test]
    fn test_empty_responses_produce_empty_fact() {
        let fact = DiabetesTransform.transform(&Responses::new(), &ctx());
        assert!(fact.is_empty(), "expected no facts, got {:?}", fact);
    }

    #[test]
    fn test_missing_a1c_leaves_control_absent() {
        let answer = ConditionAnswerBuilder::new("diabetes")
            .answer("treatment", "Oral medication only")
            .build();
        let fact = DiabetesTransform.transform(&answer.responses, &ctx());

        assert_fact_eq(&fact, "insulin_use", false);
        assert_fact_absent(&fact, "is_controlled");
        assert_fact_absent(&fact, "good_control");
        assert_fact_absent(&fact, "a1c_level");
    }

    #[test]
    fn test_null_and_blank_answers_are_absent() {
        let answer = ConditionAnswerBuilder::new("diabetes")
            .answer("treatment", "   ")
            .answer("a1c_level", ResponseValue::Null)
            .build();
        let fact = DiabetesTransform.transform(&answer.responses, &ctx());
        assert!(fact.is_empty());
    }

    #[test]
    fn test_non_finite_number_is_absent() {
        let answer = ConditionAnswerBuilder::new("diabetes")
            .answer("a1c_level", "NaN")
            .build();
        let fact = DiabetesTransform.transform(&answer.responses, &ctx());
        assert_fact_absent(&fact, "a1c_level");
    }

    #[test]
    fn test_out_of_range_blood_pressure_is_absent() {
        let answer = ConditionAnswerBuilder::new("high_blood_pressure")
            .answer("current_reading", "400/90")
            .build();
        let fact = HypertensionTransform.transform(&answer.responses, &ctx());
        assert_fact_absent(&fact, "systolic");
        assert_fact_absent(&fact, "is_stage2_or_higher");
    }

    #[test]
    fn test_unanswered_heart_attack_has_no_ejection_fraction_flags() {
        let fact = HeartAttackTransform.transform(&Responses::new(), &ctx());
        assert_fact_absent(&fact, "ef_normal");
        assert_fact_absent(&fact, "ef_severely_reduced");
    }
}

// ============================================================================
// EXPLICIT NONE VERSUS UNANSWERED
// ============================================================================

mod explicit_none {
    use super::*;

    #[test]
    fn test_none_selection_is_empty_list() {
        let answer = ConditionAnswerBuilder::new("diabetes")
            .labels("complications", ["None"])
            .build();
        let fact = DiabetesTransform.transform(&answer.responses, &ctx());
        assert_fact_eq(&fact, "complications", Vec::<String>::new());
    }

    #[test]
    fn test_empty_selection_is_unanswered() {
        let answer = ConditionAnswerBuilder::new("diabetes")
            .labels("complications", Vec::<String>::new())
            .build();
        let fact = DiabetesTransform.transform(&answer.responses, &ctx());
        assert_fact_absent(&fact, "complications");
    }

    #[test]
    fn test_labels_are_canonicalized() {
        let answer = ConditionAnswerBuilder::new("diabetes")
            .labels("complications", ["Retinopathy (eye)", "Neuropathy (nerve)"])
            .build();
        let fact = DiabetesTransform.transform(&answer.responses, &ctx());
        assert_fact_eq(
            &fact,
            "complications",
            vec!["retinopathy".to_string(), "neuropathy".to_string()],
        );
    }
}

// ============================================================================
// NUMERIC STRINGS AND NEGATION
// ============================================================================

mod parsing {
    use super::*;

    #[test]
    fn test_numeric_string_matches_number() {
        let as_text = ConditionAnswerBuilder::new("diabetes").answer("a1c_level", "6.5").build();
        let as_number = ConditionAnswerBuilder::new("diabetes").answer("a1c_level", 6.5).build();

        assert_eq!(
            DiabetesTransform.transform(&as_text.responses, &ctx()),
            DiabetesTransform.transform(&as_number.responses, &ctx())
        );
    }

    #[test]
    fn test_partial_numeric_string_is_rejected() {
        let answer = ConditionAnswerBuilder::new("diabetes").answer("a1c_level", "6.5%").build();
        let fact = DiabetesTransform.transform(&answer.responses, &ctx());
        assert_fact_absent(&fact, "a1c_level");
    }

    #[test]
    fn test_negated_insulin_phrases() {
        for treatment in ["No insulin", "non-insulin medication", "Managed without insulin"] {
            let answer = ConditionAnswerBuilder::new("diabetes").answer("treatment", treatment).build();
            let fact = DiabetesTransform.transform(&answer.responses, &ctx());
            assert_fact_eq(&fact, "insulin_use", false);
        }
    }

    #[test]
    fn test_scenario_one_facts() {
        let answer = AnswerFixtures::controlled_diabetes();
        let fact = DiabetesTransform.transform(&answer.responses, &ctx());

        assert_eq!(fact.len(), 4, "unexpected facts: {:?}", fact);
        assert_fact_eq(&fact, "insulin_use", true);
        assert_fact_eq(&fact, "is_controlled", true);
        assert_fact_eq(&fact, "good_control", true);
        assert_fact_eq(&fact, "a1c_level", 6.5);
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

mod registry {
    use super::*;

    #[test]
    fn test_client_scope_and_conditions() {
        let applicant = ApplicantProfile::new(55).with_state(" tx ");
        let output = TransformRegistry::standard().transform(
            &[AnswerFixtures::controlled_diabetes(), AnswerFixtures::recent_stroke()],
            &applicant,
            TemporalFixtures::as_of(),
        );

        assert_eq!(output.reported, vec!["diabetes".to_string(), "stroke".to_string()]);
        assert_eq!(output.facts.client().get("state"), Some(&FactValue::Text("TX".into())));
        assert!(output.diagnostics.is_empty());

        let stroke = output.facts.condition("stroke").unwrap();
        assert_fact_eq(stroke, "has_paralysis", true);
        assert_fact_eq(stroke, "years_since_event", 0.5);
    }

    #[test]
    fn test_empty_registry_passes_everything_through() {
        let output = TransformRegistry::new().transform(
            &[AnswerFixtures::controlled_diabetes()],
            &ApplicantProfile::new(55),
            TemporalFixtures::as_of(),
        );

        let fact = output.facts.condition("diabetes").unwrap();
        assert_fact_eq(fact, "treatment", "Insulin only");
        assert_fact_absent(fact, "insulin_use");
        assert!(matches!(
            output.diagnostics.as_slice(),
            [Diagnostic::UnregisteredConditionTransform { condition_code }] if condition_code == "diabetes"
        ));
    }
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

proptest! {
    #[test]
    fn prop_control_facts_require_a1c_answer(
        treatment in response_value_strategy(),
        complications in response_value_strategy(),
    ) {
        let mut responses = Responses::new();
        responses.insert("treatment".into(), treatment);
        responses.insert("complications".into(), complications);

        let fact = DiabetesTransform.transform(&responses, &ctx());
        prop_assert!(!fact.contains("is_controlled"));
        prop_assert!(!fact.contains("a1c_level"));
    }

    #[test]
    fn prop_every_registered_transform_accepts_junk(
        code in prop::sample::select(TransformRegistry::standard().condition_codes().into_iter().map(String::from).collect::<Vec<_>>()),
        values in prop::collection::vec(response_value_strategy(), 0..6),
    ) {
        let fields = ["type", "severity", "treatment", "diagnosis_date", "complications", "hospitalizations"];
        let responses: Responses = fields
            .iter()
            .zip(values)
            .map(|(f, v)| (f.to_string(), v))
            .collect();

        let registry = TransformRegistry::standard();
        let answer = domain_underwriting::ConditionAnswer::new(code, responses);
        let (fact, raw) = registry.transform_condition(&answer, &ctx());
        prop_assert!(!raw);
        for (_, value) in fact.iter() {
            if let FactValue::Number(n) = value {
                prop_assert!(n.is_finite());
            }
        }
    }
}
