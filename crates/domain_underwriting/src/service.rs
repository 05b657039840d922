//! Underwriting service
//!
//! Runs the whole pipeline for one application: transform answers into
//! facts, pick a rule set per reported condition, resolve each set, then
//! aggregate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::aggregator::{aggregate, AggregationConfig, ConditionResolution, Decision};
use crate::catalog::{RuleCatalog, RuleSetQuery};
use crate::diagnostics::Diagnostic;
use crate::error::UnderwritingError;
use crate::facts::{ApplicantProfile, ConditionAnswer};
use crate::predicate::EvaluationContext;
use crate::resolver::{resolve_rule_set, Resolution, ResolvedOutcome};
use crate::rules::{RuleSet, RuleSetScope};
use crate::transform::TransformRegistry;

/// Questionnaire answers for one application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub applicant: ApplicantProfile,
    /// Reported conditions in declaration order
    #[serde(default)]
    pub conditions: Vec<ConditionAnswer>,
}

impl EvaluationRequest {
    pub fn new(applicant: ApplicantProfile) -> Self {
        Self {
            applicant,
            conditions: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: ConditionAnswer) -> Self {
        self.conditions.push(condition);
        self
    }
}

/// Reason recorded when a reported condition has no rule set
pub fn missing_rule_set_reason(condition_code: &str) -> String {
    format!("{}: no approved rule set found - manual review required", condition_code)
}

/// Evaluates applications against rule sets
///
/// Holds only read-only state, so one instance can be shared behind an
/// `Arc` by concurrent requests.
#[derive(Debug, Clone)]
pub struct UnderwritingService {
    registry: TransformRegistry,
    config: AggregationConfig,
}

impl Default for UnderwritingService {
    fn default() -> Self {
        Self::new()
    }
}

impl UnderwritingService {
    /// Creates a service with the standard condition transforms
    pub fn new() -> Self {
        Self {
            registry: TransformRegistry::standard(),
            config: AggregationConfig::default(),
        }
    }

    /// Replaces the transform registry
    pub fn with_registry(mut self, registry: TransformRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replaces the aggregation settings
    pub fn with_config(mut self, config: AggregationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &TransformRegistry {
        &self.registry
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Evaluates an application against the supplied rule sets
    ///
    /// For each reported condition, the condition-scoped set with the
    /// highest `version` is used (first supplied wins a tie). A condition
    /// with no set is referred. Global sets are resolved afterwards, in the
    /// order supplied.
    ///
    /// # Arguments
    ///
    /// * `request` - Applicant and condition answers
    /// * `rule_sets` - Candidate rule sets, already filtered for carrier and product
    /// * `as_of` - Calendar date used for all elapsed-time arithmetic
    #[instrument(skip_all, fields(conditions = request.conditions.len(), rule_sets = rule_sets.len(), %as_of))]
    pub fn evaluate(&self, request: &EvaluationRequest, rule_sets: &[RuleSet], as_of: NaiveDate) -> Decision {
        let output = self.registry.transform(&request.conditions, &request.applicant, as_of);
        let ctx = EvaluationContext::new(&output.facts, as_of);

        let mut resolutions = Vec::with_capacity(output.reported.len());
        let mut extra_diagnostics = output.diagnostics;

        for code in &output.reported {
            match select_rule_set(rule_sets, code) {
                Some(rule_set) => resolutions.push(ConditionResolution {
                    condition_code: code.clone(),
                    scope: RuleSetScope::Condition,
                    rule_set_id: Some(rule_set.id),
                    resolution: resolve_rule_set(rule_set, &ctx),
                }),
                None => {
                    extra_diagnostics.push(
                        Diagnostic::MissingRuleSet {
                            condition_code: code.clone(),
                        }
                        .logged(),
                    );
                    resolutions.push(ConditionResolution {
                        condition_code: code.clone(),
                        scope: RuleSetScope::Condition,
                        rule_set_id: None,
                        resolution: Resolution {
                            outcome: ResolvedOutcome::Refer {
                                reason: missing_rule_set_reason(code),
                            },
                            missing_fields: Vec::new(),
                            diagnostics: Vec::new(),
                            verdicts: Vec::new(),
                        },
                    });
                }
            }
        }

        for rule_set in rule_sets.iter().filter(|s| s.scope == RuleSetScope::Global) {
            resolutions.push(ConditionResolution {
                condition_code: rule_set.name.clone(),
                scope: RuleSetScope::Global,
                rule_set_id: Some(rule_set.id),
                resolution: resolve_rule_set(rule_set, &ctx),
            });
        }

        let mut decision = aggregate(&resolutions, as_of, &self.config);
        extra_diagnostics.append(&mut decision.diagnostics);
        decision.diagnostics = extra_diagnostics;

        info!(
            evaluation_id = %decision.evaluation_id,
            eligibility = ?decision.eligibility(),
            referred = decision.referred_conditions.len(),
            diagnostics = decision.diagnostics.len(),
            "Underwriting evaluation complete"
        );
        decision
    }

    /// Fetches rule sets from a catalog, then evaluates
    pub async fn evaluate_with_catalog(
        &self,
        catalog: &dyn RuleCatalog,
        query: &RuleSetQuery,
        request: &EvaluationRequest,
        as_of: NaiveDate,
    ) -> Result<Decision, UnderwritingError> {
        let rule_sets = catalog.rule_sets(query).await?;
        Ok(self.evaluate(request, &rule_sets, as_of))
    }
}

/// Highest-version condition set for `code`; first supplied wins a tie
fn select_rule_set<'a>(rule_sets: &'a [RuleSet], code: &str) -> Option<&'a RuleSet> {
    rule_sets
        .iter()
        .filter(|s| s.covers(code))
        .fold(None, |best: Option<&RuleSet>, set| match best {
            Some(b) if b.version >= set.version => Some(b),
            _ => Some(set),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::CarrierId;

    #[test]
    fn test_select_rule_set_prefers_highest_version() {
        let carrier = CarrierId::new();
        let v1 = RuleSet::for_condition(carrier, "diabetes", 1);
        let v3 = RuleSet::for_condition(carrier, "diabetes", 3);
        let v3_later = RuleSet::for_condition(carrier, "diabetes", 3);
        let other = RuleSet::for_condition(carrier, "stroke", 9);
        let sets = vec![v1, v3.clone(), v3_later, other];

        assert_eq!(select_rule_set(&sets, "diabetes").map(|s| s.id), Some(v3.id));
        assert!(select_rule_set(&sets, "copd").is_none());
    }

    #[test]
    fn test_missing_rule_set_reason() {
        assert_eq!(
            missing_rule_set_reason("gout"),
            "gout: no approved rule set found - manual review required"
        );
    }
}
