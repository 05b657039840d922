//! Depression, anxiety and bipolar answers
//!
//! The three conditions share diagnosis, severity, treatment and
//! hospitalization questions; each adds a few of its own.

use super::{ConditionTransform, TransformContext};
use crate::facts::{Fact, Responses};
use crate::normalize::{self, mentions, token};

/// Which mental-health questionnaire the answers came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MentalHealthCondition {
    Depression,
    Anxiety,
    Bipolar,
}

impl MentalHealthCondition {
    pub fn code(&self) -> &'static str {
        match self {
            MentalHealthCondition::Depression => "depression",
            MentalHealthCondition::Anxiety => "anxiety",
            MentalHealthCondition::Bipolar => "bipolar",
        }
    }
}

/// Medication keywords in a treatment answer
const MEDICATION_WORDS: &[&str] = &["medication", "antidepressant", "ssri", "snri", "benzodiazepine"];

/// Transform for `depression`, `anxiety` and `bipolar`
#[derive(Debug, Clone, Copy)]
pub struct MentalHealthTransform {
    condition: MentalHealthCondition,
}

impl MentalHealthTransform {
    pub fn new(condition: MentalHealthCondition) -> Self {
        Self { condition }
    }

    fn shared(&self, responses: &Responses, ctx: &TransformContext, fact: &mut Fact) {
        fact.insert_opt(
            "years_since_diagnosis",
            normalize::years_since_answer(responses, "diagnosis_date", ctx.as_of),
        );

        let mut severe = None;
        if let Some(severity) = normalize::text(responses, "severity") {
            let severity = severity.to_lowercase();
            severe = Some(severity == "severe");
            fact.insert("is_mild", severity == "mild");
            fact.insert("is_moderate", severity == "moderate");
            fact.insert("is_severe", severity == "severe");
            fact.insert("in_remission", severity.contains("remission"));
            fact.insert("severity", severity);
        }

        if let Some(treatment) = normalize::answered_list(responses, "treatment") {
            let on_medication = treatment
                .iter()
                .any(|t| MEDICATION_WORDS.iter().any(|w| mentions(t, w)));
            fact.insert("on_medication", on_medication);
            fact.insert(
                "in_therapy",
                treatment.iter().any(|t| mentions(t, "therapy") || mentions(t, "counseling")),
            );
            fact.insert(
                "no_treatment",
                treatment.iter().any(|t| mentions(t, "no current treatment")),
            );
            // Stability needs a severity answer as well as a treatment answer
            fact.insert_opt("stable_on_treatment", severe.map(|s| on_medication && !s));
            fact.insert(
                "treatment",
                treatment.iter().map(|t| token(t)).collect::<Vec<_>>(),
            );
        }

        if let Some(hospitalizations) = normalize::text(responses, "hospitalizations") {
            let lowered = hospitalizations.to_lowercase();
            fact.insert("hospitalized", !matches!(lowered.as_str(), "no" | "0"));
            fact.insert(
                "multiple_hospitalizations",
                lowered.contains("more than once")
                    || lowered.contains("more")
                    || normalize::leading_count(&lowered).is_some_and(|n| n >= 2),
            );
        }
    }

    fn depression(&self, responses: &Responses, fact: &mut Fact) {
        fact.insert_opt(
            "suicide_history",
            normalize::text(responses, "suicide_attempt").map(|a| a == "Yes"),
        );
        if let Some(impact) = normalize::text(responses, "work_impact") {
            fact.insert(
                "work_disabled",
                mentions(impact, "disability") || mentions(impact, "unable to work"),
            );
            fact.insert("work_impact", token(impact));
        }
    }

    fn anxiety(&self, responses: &Responses, fact: &mut Fact) {
        if let Some(kind) = normalize::text(responses, "type") {
            fact.insert("is_ptsd", mentions(kind, "ptsd"));
            fact.insert("is_ocd", mentions(kind, "ocd"));
            fact.insert("is_panic_disorder", mentions(kind, "panic"));
            fact.insert("anxiety_type", token(kind));
        }
        if let Some(panic) = normalize::text(responses, "panic_attacks") {
            let lowered = panic.to_lowercase();
            fact.insert("has_panic_attacks", lowered != "never");
            fact.insert(
                "frequent_panic_attacks",
                lowered.contains("weekly") || lowered.contains("daily"),
            );
            fact.insert("panic_frequency", lowered);
        }
    }

    fn bipolar(&self, responses: &Responses, fact: &mut Fact) {
        if let Some(kind) = normalize::text(responses, "type") {
            let words = normalize::words(kind);
            let type_two = words.iter().any(|w| w == "ii" || w == "2");
            let type_one = !type_two && words.iter().any(|w| w == "i" || w == "1");
            fact.insert("is_bipolar_1", type_one);
            fact.insert("is_bipolar_2", type_two);
            fact.insert("bipolar_type", token(kind));
        }
        if let Some(state) = normalize::text(responses, "current_state") {
            fact.insert("is_stable", mentions(state, "stable"));
            fact.insert(
                "in_episode",
                ["manic", "depressive", "mixed"].iter().any(|w| mentions(state, w)),
            );
            fact.insert("current_state", token(state));
        }
        if let Some(medications) = normalize::answered_list(responses, "medications") {
            fact.insert("on_lithium", medications.iter().any(|m| mentions(m, "lithium")));
            fact.insert(
                "on_antipsychotic",
                medications.iter().any(|m| mentions(m, "antipsychotic")),
            );
        }
        if let Some(compliance) = normalize::text(responses, "compliance") {
            fact.insert(
                "is_compliant",
                mentions(compliance, "always") || mentions(compliance, "mostly"),
            );
            fact.insert("often_non_compliant", mentions(compliance, "often non"));
            fact.insert("compliance_level", token(compliance));
        }
    }
}

impl ConditionTransform for MentalHealthTransform {
    fn transform(&self, responses: &Responses, ctx: &TransformContext) -> Fact {
        let mut fact = Fact::new();
        self.shared(responses, ctx, &mut fact);
        match self.condition {
            MentalHealthCondition::Depression => self.depression(responses, &mut fact),
            MentalHealthCondition::Anxiety => self.anxiety(responses, &mut fact),
            MentalHealthCondition::Bipolar => self.bipolar(responses, &mut fact),
        }
        fact
    }
}
