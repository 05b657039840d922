//! Recoverable evaluation diagnostics
//!
//! None of these abort an evaluation. They travel with the `Decision` so a
//! reviewer can see why a case was referred, and each one is logged at
//! `warn` when it is recorded.

use core_kernel::{RuleId, RuleSetId};
use serde::Serialize;
use tracing::warn;

/// A non-fatal problem encountered while evaluating
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A predicate node could not be interpreted; its rule evaluated Unknown
    MalformedPredicate {
        rule_id: Option<RuleId>,
        rule_set_id: Option<RuleSetId>,
        condition_code: Option<String>,
        reason: String,
    },
    /// No transform is registered for the condition; raw answers were used
    UnregisteredConditionTransform { condition_code: String },
    /// The same condition was reported more than once; the first was kept
    DuplicateCondition { condition_code: String },
    /// No rule set covers a reported condition; it was referred
    MissingRuleSet { condition_code: String },
}

impl Diagnostic {
    pub fn malformed_predicate(rule_id: Option<RuleId>, reason: impl Into<String>) -> Self {
        Diagnostic::MalformedPredicate {
            rule_id,
            rule_set_id: None,
            condition_code: None,
            reason: reason.into(),
        }
    }

    /// Attaches the rule set a malformed predicate belongs to
    pub fn in_rule_set(mut self, id: RuleSetId, code: Option<&str>) -> Self {
        if let Diagnostic::MalformedPredicate {
            rule_set_id,
            condition_code,
            ..
        } = &mut self
        {
            *rule_set_id = Some(id);
            *condition_code = code.map(str::to_string);
        }
        self
    }

    /// Emits the diagnostic to the log and returns it for collection
    pub fn logged(self) -> Self {
        match &self {
            Diagnostic::MalformedPredicate { rule_id, condition_code, reason, .. } => {
                warn!(
                    rule_id = ?rule_id,
                    condition_code = ?condition_code,
                    reason = %reason,
                    "Malformed predicate evaluated as unknown"
                );
            }
            Diagnostic::UnregisteredConditionTransform { condition_code } => {
                warn!(
                    condition_code = %condition_code,
                    "No transform registered; raw answers passed through"
                );
            }
            Diagnostic::DuplicateCondition { condition_code } => {
                warn!(condition_code = %condition_code, "Duplicate condition answer ignored");
            }
            Diagnostic::MissingRuleSet { condition_code } => {
                warn!(condition_code = %condition_code, "No approved rule set for condition");
            }
        }
        self
    }
}
