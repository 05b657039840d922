//! COPD and emphysema answers

use super::{ConditionTransform, TransformContext};
use crate::facts::{Fact, Responses};
use crate::normalize::{self, mentions, token};

/// Transform for the `copd` condition
#[derive(Debug, Default, Clone, Copy)]
pub struct CopdTransform;

impl ConditionTransform for CopdTransform {
    fn transform(&self, responses: &Responses, ctx: &TransformContext) -> Fact {
        let mut fact = Fact::new();

        fact.insert_opt(
            "years_since_diagnosis",
            normalize::years_since_answer(responses, "diagnosis_date", ctx.as_of),
        );

        if let Some(severity) = normalize::text(responses, "severity") {
            let severity = severity.to_lowercase();
            fact.insert("is_mild", severity == "mild");
            fact.insert("is_moderate", severity == "moderate");
            fact.insert("is_severe", severity == "severe" || severity.contains("very severe"));
            fact.insert("severity", severity);
        }

        if let Some(oxygen) = normalize::text(responses, "oxygen_use") {
            fact.insert("requires_oxygen", oxygen != "No");
            fact.insert("continuous_oxygen", mentions(oxygen, "continuously"));
            fact.insert("nighttime_oxygen", mentions(oxygen, "night"));
            fact.insert("oxygen_use_raw", oxygen);
        }

        // Counted over the past two years
        if let Some(count) = normalize::text(responses, "hospitalizations").and_then(normalize::leading_count) {
            fact.insert("hospitalizations", f64::from(count));
            fact.insert("hospitalized_past_year", count >= 1);
            fact.insert("multiple_hospitalizations", count >= 2);
        }

        if let Some(smoking) = normalize::text(responses, "smoking_status") {
            fact.insert("is_current_smoker", mentions(smoking, "current"));
            fact.insert("is_former_smoker", mentions(smoking, "former"));
            fact.insert("never_smoked", mentions(smoking, "never"));
            fact.insert("smoking_status", token(smoking));
        }

        if let Some(count) = normalize::text(responses, "inhalers").and_then(normalize::leading_count) {
            fact.insert("inhaler_count", f64::from(count));
            fact.insert("on_multiple_inhalers", count >= 2);
        }

        fact
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{FactValue, ResponseValue};
    use chrono::NaiveDate;

    fn ctx() -> TransformContext {
        TransformContext {
            applicant_age: 65,
            as_of: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        }
    }

    #[test]
    fn test_oxygen_flags() {
        let mut responses = Responses::new();
        responses.insert("oxygen_use".into(), ResponseValue::from("Yes, at night only"));
        let fact = CopdTransform.transform(&responses, &ctx());

        assert_eq!(fact.get("requires_oxygen"), Some(&FactValue::Bool(true)));
        assert_eq!(fact.get("nighttime_oxygen"), Some(&FactValue::Bool(true)));
        assert_eq!(fact.get("continuous_oxygen"), Some(&FactValue::Bool(false)));
    }

    #[test]
    fn test_unparseable_count_is_absent() {
        let mut responses = Responses::new();
        responses.insert("hospitalizations".into(), ResponseValue::from("several"));
        let fact = CopdTransform.transform(&responses, &ctx());

        assert!(!fact.contains("hospitalizations"));
        assert!(!fact.contains("hospitalized_past_year"));
    }
}
