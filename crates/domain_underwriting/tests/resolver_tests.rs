//! Rule Resolver Tests
//!
//! # Test Coverage
//!
//! - Priority selection and declaration-order tie breaks
//! - Refer when nothing matches but something is unknown
//! - Missing fields collected only from undecided rules
//! - Malformed predicates isolated to their own rule
//! - Age band and gender applicability
//! - Determinism over shuffled priorities (property test)

use domain_underwriting::{
    resolve, resolve_rule_set, ApplicantProfile, Diagnostic, Eligibility, EvaluationContext, Fact, FactMap,
    Gender, ResolvedOutcome, RuleResult,
};
use proptest::prelude::*;
use serde_json::json;
use test_utils::{PredicateFixtures, RuleBuilder, RuleSetBuilder, TemporalFixtures};

fn facts_with(applicant: ApplicantProfile, controlled: Option<bool>, a1c: Option<f64>) -> FactMap {
    let mut facts = FactMap::new(applicant);
    let mut diabetes = Fact::new();
    diabetes.insert_opt("is_controlled", controlled);
    diabetes.insert_opt("a1c_level", a1c);
    facts.insert_condition("diabetes", diabetes);
    facts
}

fn controlled(controlled: Option<bool>) -> FactMap {
    facts_with(ApplicantProfile::new(55), controlled, None)
}

// ============================================================================
// SELECTION
// ============================================================================

mod selection {
    use super::*;

    #[test]
    fn test_matched_beats_unknown_regardless_of_priority() {
        let facts = controlled(Some(true));
        let rules = vec![
            RuleBuilder::new("Unknown high")
                .priority(100)
                .when(PredicateFixtures::numeric("diabetes.a1c_level", "gt", 9.0))
                .ineligible("Very high A1C")
                .build(),
            RuleBuilder::new("Matched low")
                .priority(1)
                .when(PredicateFixtures::boolean_eq("diabetes.is_controlled", true))
                .eligible("standard")
                .build(),
        ];

        let resolution = resolve(&rules, &EvaluationContext::new(&facts, TemporalFixtures::as_of()));
        assert_eq!(resolution.outcome.governing_rule().map(|r| r.name.as_str()), Some("Matched low"));
        assert_eq!(resolution.verdicts[0].result, RuleResult::Unknown);
        assert_eq!(resolution.verdicts[1].result, RuleResult::Matched);
    }

    #[test]
    fn test_missing_fields_only_from_unknown_rules() {
        let facts = controlled(Some(false));
        let rules = vec![
            RuleBuilder::new("False")
                .priority(10)
                .when(json!({"all": [
                    PredicateFixtures::boolean_eq("diabetes.is_controlled", true),
                    PredicateFixtures::numeric("diabetes.a1c_level", "lt", 7.0),
                ]}))
                .build(),
            RuleBuilder::new("Unknown")
                .priority(5)
                .when(PredicateFixtures::boolean_eq("diabetes.insulin_use", true))
                .build(),
        ];

        let resolution = resolve(&rules, &EvaluationContext::new(&facts, TemporalFixtures::as_of()));
        assert_eq!(resolution.missing_fields, vec!["diabetes.insulin_use".to_string()]);
        assert_eq!(
            resolution.outcome,
            ResolvedOutcome::Refer {
                reason: "Missing data to evaluate: diabetes.insulin_use".to_string()
            }
        );
    }

    #[test]
    fn test_empty_rule_list_has_no_governing_rule() {
        let facts = controlled(Some(true));
        let resolution = resolve(&[], &EvaluationContext::new(&facts, TemporalFixtures::as_of()));
        assert_eq!(resolution.outcome, ResolvedOutcome::NoGoverningRule);
        assert!(resolution.verdicts.is_empty());
    }

    proptest! {
        #[test]
        fn prop_governing_rule_has_max_priority_and_first_index(priorities in prop::collection::vec(-5i32..5, 1..8)) {
            let facts = controlled(Some(true));
            let rules: Vec<_> = priorities
                .iter()
                .enumerate()
                .map(|(i, p)| RuleBuilder::new(format!("rule {}", i)).priority(*p).build())
                .collect();

            let resolution = resolve(&rules, &EvaluationContext::new(&facts, TemporalFixtures::as_of()));
            let max = *priorities.iter().max().unwrap();
            let first = priorities.iter().position(|p| *p == max).unwrap();
            prop_assert_eq!(resolution.outcome.governing_rule().map(|r| r.id), Some(rules[first].id));
        }
    }
}

// ============================================================================
// MALFORMED PREDICATES
// ============================================================================

mod malformed {
    use super::*;

    #[test]
    fn test_malformed_rule_fails_alone() {
        let facts = controlled(Some(true));
        let broken = RuleBuilder::new("Broken")
            .priority(100)
            .when(json!({"type": "boolean", "field": "diabetes.is_controlled", "operator": "is", "value": true}))
            .ineligible("never")
            .build();
        let healthy = RuleBuilder::new("Healthy")
            .priority(1)
            .when(PredicateFixtures::boolean_eq("diabetes.is_controlled", true))
            .eligible("standard")
            .build();
        let rule_set = RuleSetBuilder::for_condition("diabetes")
            .rule(broken.clone())
            .rule(healthy)
            .build();

        let resolution = resolve_rule_set(&rule_set, &EvaluationContext::new(&facts, TemporalFixtures::as_of()));
        assert_eq!(resolution.outcome.governing_rule().map(|r| r.name.as_str()), Some("Healthy"));
        match resolution.diagnostics.as_slice() {
            [Diagnostic::MalformedPredicate { rule_id, rule_set_id, condition_code, .. }] => {
                assert_eq!(*rule_id, Some(broken.id));
                assert_eq!(*rule_set_id, Some(rule_set.id));
                assert_eq!(condition_code.as_deref(), Some("diabetes"));
            }
            other => panic!("unexpected diagnostics {:?}", other),
        }
    }

    #[test]
    fn test_only_malformed_rules_refer() {
        let facts = controlled(Some(true));
        let rules = vec![RuleBuilder::new("Broken").when(json!({"type": "mystery"})).build()];
        let resolution = resolve(&rules, &EvaluationContext::new(&facts, TemporalFixtures::as_of()));
        assert!(resolution.outcome.is_refer());
        assert!(resolution.missing_fields.is_empty());
    }
}

// ============================================================================
// APPLICABILITY
// ============================================================================

mod applicability {
    use super::*;

    #[test]
    fn test_age_band_excludes_rule() {
        let facts = facts_with(ApplicantProfile::new(70), Some(true), None);
        let rules = vec![
            RuleBuilder::new("Under 65")
                .priority(50)
                .ages(None, Some(64))
                .outcome(Eligibility::Eligible)
                .build(),
            RuleBuilder::new("Anyone")
                .priority(10)
                .outcome(Eligibility::Refer)
                .build(),
        ];

        let resolution = resolve(&rules, &EvaluationContext::new(&facts, TemporalFixtures::as_of()));
        assert_eq!(resolution.outcome.governing_rule().map(|r| r.name.as_str()), Some("Anyone"));
        assert_eq!(resolution.verdicts[0].result, RuleResult::NotApplicable);
    }

    #[test]
    fn test_gender_filter_matches_known_gender() {
        let facts = facts_with(ApplicantProfile::new(40).with_gender(Gender::Female), Some(true), None);
        let rules = vec![RuleBuilder::new("Female").gender(Gender::Female).build()];
        let resolution = resolve(&rules, &EvaluationContext::new(&facts, TemporalFixtures::as_of()));
        assert!(resolution.outcome.governing_rule().is_some());
    }
}
