//! Decision Aggregator
//!
//! Combines per-condition resolutions into one [`Decision`]. The most
//! restrictive eligibility wins (`ineligible` over `refer` over `eligible`).
//! Inside the winning tier the highest rule priority selects the outcome;
//! refers for insufficient information rank below any rule, and remaining
//! ties go to the condition declared first.

use chrono::NaiveDate;
use core_kernel::{EvaluationId, RuleId, RuleSetId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::diagnostics::Diagnostic;
use crate::resolver::{Resolution, ResolvedOutcome, RuleVerdict};
use crate::rules::{Eligibility, FlatExtra, Rule, RuleSetScope, TableRating};

/// How flat extras of the winning tier are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlatExtraComposition {
    /// Greatest per-thousand amount, with that extra's duration
    #[default]
    Max,
    /// Per-thousand amounts summed over the longest duration, saturating at `Decimal::MAX`
    Sum,
    /// The single extra with the greatest per-thousand × years
    WorstOnly,
}

impl FlatExtraComposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlatExtraComposition::Max => "max",
            FlatExtraComposition::Sum => "sum",
            FlatExtraComposition::WorstOnly => "worst_only",
        }
    }

    /// Combines flat extras; `None` when there are none
    pub fn compose(&self, extras: &[FlatExtra]) -> Option<FlatExtra> {
        let first = extras.first()?;
        let composed = match self {
            FlatExtraComposition::Max => extras
                .iter()
                .fold(*first, |acc, e| if e.per_thousand > acc.per_thousand { *e } else { acc }),
            FlatExtraComposition::Sum => FlatExtra {
                per_thousand: extras.iter().fold(Decimal::ZERO, |acc, e| {
                    acc.checked_add(e.per_thousand).unwrap_or(Decimal::MAX)
                }),
                years: extras.iter().filter_map(|e| e.years).max(),
            },
            FlatExtraComposition::WorstOnly => extras
                .iter()
                .fold(*first, |acc, e| if e.total_cost() > acc.total_cost() { *e } else { acc }),
        };
        Some(composed)
    }
}

impl fmt::Display for FlatExtraComposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlatExtraComposition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "max" => Ok(FlatExtraComposition::Max),
            "sum" => Ok(FlatExtraComposition::Sum),
            "worst_only" => Ok(FlatExtraComposition::WorstOnly),
            other => Err(format!("unknown flat extra composition '{}'", other)),
        }
    }
}

/// Aggregation settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationConfig {
    #[serde(default)]
    pub flat_extra_composition: FlatExtraComposition,
}

/// The resolution of one condition (or one global rule set)
#[derive(Debug, Clone)]
pub struct ConditionResolution {
    /// Condition code, or the rule set name for global sets
    pub condition_code: String,
    pub scope: RuleSetScope,
    /// `None` when no rule set was found
    pub rule_set_id: Option<RuleSetId>,
    pub resolution: Resolution,
}

/// The outcome selected for the whole application
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedOutcome {
    pub eligibility: Eligibility,
    pub health_class: Option<String>,
    pub table_rating: TableRating,
    /// Flat extra of the selected rule
    pub flat_extra: Option<FlatExtra>,
    /// Flat extras of the whole winning tier, combined per [`FlatExtraComposition`]
    pub total_flat_extra: Option<FlatExtra>,
    /// Condition that supplied the outcome
    pub source_condition: String,
    /// `None` when the outcome is a refer for insufficient information
    pub rule_id: Option<RuleId>,
}

/// A rule that governed its condition at the winning tier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoverningRule {
    pub rule_id: RuleId,
    pub rule_name: String,
    pub rule_set_id: Option<RuleSetId>,
    pub condition_code: String,
    pub priority: i32,
}

/// How a single condition resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionStatus {
    Governed,
    InsufficientInformation,
    NoGoverningRule,
}

/// Per-condition entry in the decision breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionOutcome {
    pub condition_code: String,
    pub scope: RuleSetScope,
    pub rule_set_id: Option<RuleSetId>,
    pub status: ConditionStatus,
    pub eligibility: Option<Eligibility>,
    pub rule_id: Option<RuleId>,
    pub reason: Option<String>,
    pub missing_fields: Vec<String>,
    pub rules: Vec<RuleVerdict>,
}

/// The underwriting decision for one application
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub evaluation_id: EvaluationId,
    /// Date used for elapsed-time arithmetic
    pub as_of: NaiveDate,
    /// `None` when no condition contributed an outcome
    pub outcome: Option<SelectedOutcome>,
    /// Reasons of the winning tier, first occurrence order
    pub reasons: Vec<String>,
    pub concerns: Vec<String>,
    pub governing_rules: Vec<GoverningRule>,
    /// Flat extras of every governing rule at the winning tier
    pub flat_extras: Vec<FlatExtra>,
    /// Conditions referred for insufficient information
    pub referred_conditions: Vec<String>,
    pub conditions: Vec<ConditionOutcome>,
    pub missing_fields: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Decision {
    pub fn eligibility(&self) -> Option<Eligibility> {
        self.outcome.as_ref().map(|o| o.eligibility)
    }
}

/// A condition that produced an outcome
struct Contributor<'a> {
    entry: &'a ConditionResolution,
    eligibility: Eligibility,
    /// `None` for insufficient-information refers
    rule: Option<&'a Rule>,
    reason: Option<&'a str>,
}

impl<'a> Contributor<'a> {
    fn from_entry(entry: &'a ConditionResolution) -> Option<Self> {
        match &entry.resolution.outcome {
            ResolvedOutcome::Governed(rule) => Some(Self {
                entry,
                eligibility: rule.outcome_eligibility,
                rule: Some(rule),
                reason: rule.outcome_reason.as_deref(),
            }),
            ResolvedOutcome::Refer { reason } => Some(Self {
                entry,
                eligibility: Eligibility::Refer,
                rule: None,
                reason: Some(reason.as_str()),
            }),
            ResolvedOutcome::NoGoverningRule => None,
        }
    }

    fn priority(&self) -> Option<i32> {
        self.rule.map(|r| r.priority)
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

/// Aggregates resolutions into a decision
///
/// # Arguments
///
/// * `resolutions` - One entry per condition in declaration order, followed by global sets
/// * `as_of` - Date recorded on the decision
/// * `config` - Flat extra composition
pub fn aggregate(
    resolutions: &[ConditionResolution],
    as_of: NaiveDate,
    config: &AggregationConfig,
) -> Decision {
    let contributors: Vec<Contributor<'_>> = resolutions.iter().filter_map(Contributor::from_entry).collect();

    let winning_tier = contributors.iter().map(|c| c.eligibility).max();

    let mut reasons = Vec::new();
    let mut concerns = Vec::new();
    let mut governing_rules = Vec::new();
    let mut flat_extras = Vec::new();
    let mut selected: Option<&Contributor<'_>> = None;

    if let Some(tier) = winning_tier {
        for contributor in contributors.iter().filter(|c| c.eligibility == tier) {
            if selected.map_or(true, |s| contributor.priority() > s.priority()) {
                selected = Some(contributor);
            }
            if let Some(reason) = contributor.reason {
                push_unique(&mut reasons, reason);
            }
            match contributor.rule {
                Some(rule) => {
                    for concern in &rule.outcome_concerns {
                        push_unique(&mut concerns, concern);
                    }
                    flat_extras.extend(rule.flat_extra());
                    governing_rules.push(GoverningRule {
                        rule_id: rule.id,
                        rule_name: rule.name.clone(),
                        rule_set_id: contributor.entry.rule_set_id,
                        condition_code: contributor.entry.condition_code.clone(),
                        priority: rule.priority,
                    });
                }
                None => push_unique(&mut concerns, &contributor.entry.condition_code),
            }
        }
    }

    let outcome = selected.map(|s| SelectedOutcome {
        eligibility: s.eligibility,
        health_class: s.rule.and_then(|r| r.outcome_health_class.clone()),
        table_rating: s.rule.map(|r| r.outcome_table_rating).unwrap_or_default(),
        flat_extra: s.rule.and_then(Rule::flat_extra),
        total_flat_extra: config.flat_extra_composition.compose(&flat_extras),
        source_condition: s.entry.condition_code.clone(),
        rule_id: s.rule.map(|r| r.id),
    });

    let mut referred_conditions = Vec::new();
    let mut missing_fields = Vec::new();
    let mut diagnostics = Vec::new();
    let mut conditions = Vec::with_capacity(resolutions.len());

    for entry in resolutions {
        let resolution = &entry.resolution;
        let (status, eligibility, rule_id, reason) = match &resolution.outcome {
            ResolvedOutcome::Governed(rule) => (
                ConditionStatus::Governed,
                Some(rule.outcome_eligibility),
                Some(rule.id),
                rule.outcome_reason.clone(),
            ),
            ResolvedOutcome::Refer { reason } => {
                push_unique(&mut referred_conditions, &entry.condition_code);
                (
                    ConditionStatus::InsufficientInformation,
                    Some(Eligibility::Refer),
                    None,
                    Some(reason.clone()),
                )
            }
            ResolvedOutcome::NoGoverningRule => (ConditionStatus::NoGoverningRule, None, None, None),
        };

        for field in &resolution.missing_fields {
            push_unique(&mut missing_fields, field);
        }
        diagnostics.extend(resolution.diagnostics.iter().cloned());

        conditions.push(ConditionOutcome {
            condition_code: entry.condition_code.clone(),
            scope: entry.scope,
            rule_set_id: entry.rule_set_id,
            status,
            eligibility,
            rule_id,
            reason,
            missing_fields: resolution.missing_fields.clone(),
            rules: resolution.verdicts.clone(),
        });
    }

    Decision {
        evaluation_id: EvaluationId::new_v7(),
        as_of,
        outcome,
        reasons,
        concerns,
        governing_rules,
        flat_extras,
        referred_conditions,
        conditions,
        missing_fields,
        diagnostics,
    }
}
