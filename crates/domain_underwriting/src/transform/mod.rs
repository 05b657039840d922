//! Fact Transformer
//!
//! Turns raw questionnaire answers into normalized facts, one condition at a
//! time, by dispatching on `condition_code` through a [`TransformRegistry`].
//!
//! # Absence propagation
//!
//! Every transform derives each fact independently. When the source answer
//! for a fact is missing, malformed, non-finite or out of range, the fact is
//! left out of the output. It is never written as `false`, `0` or `[]`.
//!
//! # Unregistered conditions
//!
//! Conditions without a registered transform go through [`IdentityTransform`]
//! and an `UnregisteredConditionTransform` diagnostic is recorded. They never
//! block evaluation.
//!
//! # Example
//!
//! ```rust,ignore
//! let registry = TransformRegistry::standard();
//! let output = registry.transform(&answers, &applicant, as_of);
//! let a1c = output.facts.lookup(&FieldRef::parse("diabetes.a1c_level").unwrap());
//! ```

mod cancer;
mod cardiac;
mod copd;
mod diabetes;
mod hypertension;
mod mental_health;
mod stroke;

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;

use crate::diagnostics::Diagnostic;
use crate::facts::{ApplicantProfile, ConditionAnswer, Fact, FactMap, FactValue, Responses};

pub use cancer::CancerTransform;
pub use cardiac::{HeartAttackTransform, HeartDiseaseTransform};
pub use copd::CopdTransform;
pub use diabetes::DiabetesTransform;
pub use hypertension::HypertensionTransform;
pub use mental_health::{MentalHealthCondition, MentalHealthTransform};
pub use stroke::StrokeTransform;

/// Inputs shared by every transform in one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformContext {
    /// Applicant's current age in whole years
    pub applicant_age: u32,
    /// Calendar date used for "years since" derivations
    pub as_of: NaiveDate,
}

/// Condition-specific normalization of raw answers
pub trait ConditionTransform: Send + Sync {
    /// Derives facts from one condition's raw answers
    fn transform(&self, responses: &Responses, ctx: &TransformContext) -> Fact;
}

/// Fallback that passes raw answers through unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityTransform;

impl ConditionTransform for IdentityTransform {
    fn transform(&self, responses: &Responses, _ctx: &TransformContext) -> Fact {
        responses
            .iter()
            .filter_map(|(name, value)| FactValue::from_raw(value).map(|v| (name.clone(), v)))
            .collect()
    }
}

/// Result of transforming every reported condition
#[derive(Debug, Clone)]
pub struct TransformOutput {
    /// Facts for all conditions plus the `client` scope
    pub facts: FactMap,
    /// Distinct condition codes in the order they were reported
    pub reported: Vec<String>,
    /// Fallbacks and duplicates encountered
    pub diagnostics: Vec<Diagnostic>,
}

/// Registry of condition transforms keyed by condition code
///
/// Built once at startup and shared read-only between evaluations.
#[derive(Clone, Default)]
pub struct TransformRegistry {
    transforms: HashMap<String, Arc<dyn ConditionTransform>>,
}

impl TransformRegistry {
    /// Creates an empty registry; every condition falls back to identity
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in condition transform
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register("diabetes", DiabetesTransform);
        registry.register("heart_disease", HeartDiseaseTransform);
        registry.register("heart_attack", HeartAttackTransform);
        registry.register("stroke", StrokeTransform);
        registry.register("high_blood_pressure", HypertensionTransform);
        registry.register("cancer", CancerTransform);
        registry.register("copd", CopdTransform);
        for condition in [
            MentalHealthCondition::Depression,
            MentalHealthCondition::Anxiety,
            MentalHealthCondition::Bipolar,
        ] {
            registry.register(condition.code(), MentalHealthTransform::new(condition));
        }
        registry
    }

    /// Registers (or replaces) the transform for a condition code
    pub fn register<T>(&mut self, condition_code: impl Into<String>, transform: T)
    where
        T: ConditionTransform + 'static,
    {
        self.transforms.insert(condition_code.into(), Arc::new(transform));
    }

    pub fn is_registered(&self, condition_code: &str) -> bool {
        self.transforms.contains_key(condition_code)
    }

    /// Registered condition codes, sorted
    pub fn condition_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.transforms.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }

    /// Transforms one condition's answers
    ///
    /// Returns the facts and whether the identity fallback was used.
    pub fn transform_condition(&self, answer: &ConditionAnswer, ctx: &TransformContext) -> (Fact, bool) {
        match self.transforms.get(&answer.condition_code) {
            Some(transform) => (transform.transform(&answer.responses, ctx), false),
            None => (IdentityTransform.transform(&answer.responses, ctx), true),
        }
    }

    /// Transforms every reported condition into one fact map
    ///
    /// # Arguments
    ///
    /// * `conditions` - Answers in the order the applicant reported them
    /// * `applicant` - Applicant attributes, exposed under the `client` scope
    /// * `as_of` - Evaluation date for date-derived facts
    ///
    /// # Returns
    ///
    /// A `TransformOutput`. When a condition code repeats, the first answer
    /// wins and a `DuplicateCondition` diagnostic is recorded.
    pub fn transform(
        &self,
        conditions: &[ConditionAnswer],
        applicant: &ApplicantProfile,
        as_of: NaiveDate,
    ) -> TransformOutput {
        let ctx = TransformContext {
            applicant_age: applicant.age,
            as_of,
        };
        let mut facts = FactMap::new(applicant.clone());
        let mut reported = Vec::with_capacity(conditions.len());
        let mut diagnostics = Vec::new();

        for answer in conditions {
            if facts.reports(&answer.condition_code) {
                diagnostics.push(
                    Diagnostic::DuplicateCondition {
                        condition_code: answer.condition_code.clone(),
                    }
                    .logged(),
                );
                continue;
            }

            let (fact, raw) = self.transform_condition(answer, &ctx);
            if raw {
                diagnostics.push(
                    Diagnostic::UnregisteredConditionTransform {
                        condition_code: answer.condition_code.clone(),
                    }
                    .logged(),
                );
            }

            reported.push(answer.condition_code.clone());
            facts.insert_condition(answer.condition_code.clone(), fact);
        }

        TransformOutput {
            facts,
            reported,
            diagnostics,
        }
    }
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("conditions", &self.condition_codes())
            .finish()
    }
}

/// Ejection fraction at or above which function is normal
pub(crate) const EF_NORMAL_MIN: f64 = 55.0;
/// Ejection fraction below which function is severely reduced
pub(crate) const EF_SEVERELY_REDUCED_BELOW: f64 = 35.0;

/// Inserts an ejection fraction and its normal / severely-reduced flags
pub(crate) fn insert_ejection_fraction(fact: &mut Fact, name: &str, ef: Option<f64>) {
    if let Some(ef) = ef {
        fact.insert(name, ef);
        fact.insert("ef_normal", ef >= EF_NORMAL_MIN);
        fact.insert("ef_severely_reduced", ef < EF_SEVERELY_REDUCED_BELOW);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::ResponseValue;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_identity_transform_passes_raw_answers() {
        let mut responses = Responses::new();
        responses.insert("severity".into(), ResponseValue::from("mild"));
        responses.insert("skipped".into(), ResponseValue::Null);
        let answer = ConditionAnswer::new("gout", responses);

        let output = TransformRegistry::standard().transform(&[answer], &ApplicantProfile::new(40), as_of());
        let fact = output.facts.condition("gout").unwrap();
        assert_eq!(fact.get("severity"), Some(&FactValue::Text("mild".into())));
        assert!(!fact.contains("skipped"));
        assert_eq!(
            output.diagnostics,
            vec![Diagnostic::UnregisteredConditionTransform {
                condition_code: "gout".into()
            }]
        );
    }

    #[test]
    fn test_duplicate_condition_keeps_first() {
        let mut first = Responses::new();
        first.insert("a1c_level".into(), ResponseValue::from(6.0));
        let mut second = Responses::new();
        second.insert("a1c_level".into(), ResponseValue::from(9.0));

        let output = TransformRegistry::standard().transform(
            &[
                ConditionAnswer::new("diabetes", first),
                ConditionAnswer::new("diabetes", second),
            ],
            &ApplicantProfile::new(40),
            as_of(),
        );

        assert_eq!(output.reported, vec!["diabetes".to_string()]);
        assert_eq!(
            output.facts.condition("diabetes").unwrap().get("a1c_level"),
            Some(&FactValue::Number(6.0))
        );
        assert!(matches!(
            output.diagnostics.as_slice(),
            [Diagnostic::DuplicateCondition { .. }]
        ));
    }

    #[test]
    fn test_standard_registry_covers_mental_health_codes() {
        let registry = TransformRegistry::standard();
        for code in ["depression", "anxiety", "bipolar", "diabetes", "copd"] {
            assert!(registry.is_registered(code), "{} should be registered", code);
        }
        assert!(!registry.is_registered("gout"));
    }
}
