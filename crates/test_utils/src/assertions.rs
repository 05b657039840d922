//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for domain types that give
//! more meaningful error messages than standard assertions.

use domain_underwriting::{Decision, Diagnostic, Eligibility, Fact, FactValue};

/// Asserts that a decision selected the expected eligibility
///
/// # Panics
///
/// Panics if the decision has no outcome or a different eligibility
pub fn assert_eligibility(decision: &Decision, expected: Eligibility) {
    match &decision.outcome {
        Some(outcome) => assert_eq!(
            outcome.eligibility, expected,
            "Expected {} decision, got {} (reasons: {:?})",
            expected, outcome.eligibility, decision.reasons
        ),
        None => panic!("Expected {} decision, got no outcome", expected),
    }
}

/// Asserts that a decision has no outcome at all
pub fn assert_no_outcome(decision: &Decision) {
    assert!(
        decision.outcome.is_none(),
        "Expected no outcome, got {:?}",
        decision.outcome
    );
}

/// Asserts that one of the decision's reasons contains `needle`
pub fn assert_reason_contains(decision: &Decision, needle: &str) {
    assert!(
        decision.reasons.iter().any(|r| r.contains(needle)),
        "No reason contains {:?}; reasons were {:?}",
        needle,
        decision.reasons
    );
}

/// Asserts that a fact entry is present with the given value
pub fn assert_fact_eq(fact: &Fact, name: &str, expected: impl Into<FactValue>) {
    let expected = expected.into();
    assert_eq!(
        fact.get(name),
        Some(&expected),
        "Fact {:?} mismatch; fact was {:?}",
        name,
        fact
    );
}

/// Asserts that a fact entry is absent
pub fn assert_fact_absent(fact: &Fact, name: &str) {
    assert!(
        !fact.contains(name),
        "Expected fact {:?} to be absent, got {:?}",
        name,
        fact.get(name)
    );
}

/// Asserts that a decision carries at least one malformed-predicate diagnostic
pub fn assert_has_malformed_predicate(decision: &Decision) {
    assert!(
        decision
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::MalformedPredicate { .. })),
        "Expected a malformed predicate diagnostic, got {:?}",
        decision.diagnostics
    );
}
