//! Rule Resolver
//!
//! Picks the governing rule of one rule set:
//!
//! 1. Rules whose age band excludes the applicant are not applicable.
//! 2. Every remaining predicate is evaluated; results are partitioned into
//!    matched, unknown and not matched.
//! 3. The highest-priority matched rule governs. Equal priorities go to the
//!    rule declared first.
//! 4. With no match but at least one unknown, the outcome is `Refer` for
//!    insufficient information.
//! 5. Otherwise no rule governs and the set contributes nothing.

use serde::Serialize;
use tracing::debug;

use core_kernel::RuleId;

use crate::diagnostics::Diagnostic;
use crate::facts::{FieldRef, CLIENT_SCOPE};
use crate::predicate::{EvaluationContext, PredicateTrace, Tristate};
use crate::rules::{Rule, RuleSet};

/// Outcome of resolving one rule set
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedOutcome {
    /// A rule matched and governs
    Governed(Rule),
    /// No rule matched but some could not be decided
    Refer { reason: String },
    /// Every rule was definitely false or not applicable
    NoGoverningRule,
}

impl ResolvedOutcome {
    pub fn governing_rule(&self) -> Option<&Rule> {
        match self {
            ResolvedOutcome::Governed(rule) => Some(rule),
            _ => None,
        }
    }

    pub fn is_refer(&self) -> bool {
        matches!(self, ResolvedOutcome::Refer { .. })
    }
}

/// How one rule fared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleResult {
    Matched,
    NotMatched,
    Unknown,
    NotApplicable,
}

impl From<Tristate> for RuleResult {
    fn from(value: Tristate) -> Self {
        match value {
            Tristate::True => RuleResult::Matched,
            Tristate::False => RuleResult::NotMatched,
            Tristate::Unknown => RuleResult::Unknown,
        }
    }
}

/// Per-rule result, kept for audit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleVerdict {
    pub rule_id: RuleId,
    pub rule_name: String,
    pub result: RuleResult,
}

/// Full result of resolving one rule set
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub outcome: ResolvedOutcome,
    /// Fields whose absence left a rule undecided
    pub missing_fields: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
    /// One entry per rule, in declaration order
    pub verdicts: Vec<RuleVerdict>,
}

/// Reason attached to a refer for insufficient information
pub fn insufficient_information_reason(missing_fields: &[String]) -> String {
    if missing_fields.is_empty() {
        "Insufficient information to evaluate".to_string()
    } else {
        format!("Missing data to evaluate: {}", missing_fields.join(", "))
    }
}

/// Applies age band and gender filters
///
/// Returns `None` when the rule does not apply at all.
fn applicability(rule: &Rule, ctx: &EvaluationContext<'_>, trace: &mut PredicateTrace) -> Option<Tristate> {
    let applicant = ctx.facts.applicant();
    if !rule.covers_age(applicant.age) {
        return None;
    }
    match (rule.gender, applicant.gender) {
        (None, _) => Some(Tristate::True),
        (Some(required), Some(actual)) if required == actual => Some(Tristate::True),
        (Some(_), Some(_)) => None,
        (Some(_), None) => {
            let field = FieldRef {
                scope: CLIENT_SCOPE.to_string(),
                name: "gender".to_string(),
            }
            .to_string();
            if !trace.missing_fields.contains(&field) {
                trace.missing_fields.push(field);
            }
            Some(Tristate::Unknown)
        }
    }
}

/// Resolves a list of rules against the facts in `ctx`
pub fn resolve(rules: &[Rule], ctx: &EvaluationContext<'_>) -> Resolution {
    let mut best: Option<&Rule> = None;
    let mut any_unknown = false;
    let mut missing_fields: Vec<String> = Vec::new();
    let mut diagnostics = Vec::new();
    let mut verdicts = Vec::with_capacity(rules.len());

    for rule in rules {
        let mut trace = PredicateTrace::default();
        let result = match applicability(rule, ctx, &mut trace) {
            None => RuleResult::NotApplicable,
            Some(gate) => RuleResult::from(gate.and(rule.predicate.evaluate_traced(ctx, &mut trace))),
        };

        debug!(
            rule_id = %rule.id,
            rule_name = %rule.name,
            priority = rule.priority,
            result = ?result,
            "Evaluated rule"
        );

        for issue in trace.issues {
            diagnostics.push(Diagnostic::malformed_predicate(Some(rule.id), issue).logged());
        }

        match result {
            RuleResult::Matched => {
                if best.map_or(true, |b| rule.priority > b.priority) {
                    best = Some(rule);
                }
            }
            RuleResult::Unknown => {
                any_unknown = true;
                for field in trace.missing_fields {
                    if !missing_fields.contains(&field) {
                        missing_fields.push(field);
                    }
                }
            }
            RuleResult::NotMatched | RuleResult::NotApplicable => {}
        }

        verdicts.push(RuleVerdict {
            rule_id: rule.id,
            rule_name: rule.name.clone(),
            result,
        });
    }

    let outcome = match best {
        Some(rule) => ResolvedOutcome::Governed(rule.clone()),
        None if any_unknown => ResolvedOutcome::Refer {
            reason: insufficient_information_reason(&missing_fields),
        },
        None => ResolvedOutcome::NoGoverningRule,
    };

    Resolution {
        outcome,
        missing_fields,
        diagnostics,
        verdicts,
    }
}

/// Resolves a rule set, tagging diagnostics with the set they came from
pub fn resolve_rule_set(rule_set: &RuleSet, ctx: &EvaluationContext<'_>) -> Resolution {
    let mut resolution = resolve(&rule_set.rules, ctx);
    for diagnostic in resolution.diagnostics.iter_mut() {
        *diagnostic = diagnostic
            .clone()
            .in_rule_set(rule_set.id, rule_set.condition_code.as_deref());
    }
    resolution
}
