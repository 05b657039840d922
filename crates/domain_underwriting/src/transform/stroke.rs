//! Stroke and TIA answers

use super::{ConditionTransform, TransformContext};
use crate::facts::{Fact, Responses};
use crate::normalize::{self, canonical_labels, mentions, token};

const RESIDUAL_EFFECT_LABELS: &[(&str, &str)] = &[
    ("Speech difficulty", "speech_difficulty"),
    ("Paralysis/weakness", "paralysis_weakness"),
    ("Vision problems", "vision_problems"),
    ("Cognitive changes", "cognitive_changes"),
    ("None", "none"),
];

/// Transform for the `stroke` condition
#[derive(Debug, Default, Clone, Copy)]
pub struct StrokeTransform;

impl ConditionTransform for StrokeTransform {
    fn transform(&self, responses: &Responses, ctx: &TransformContext) -> Fact {
        let mut fact = Fact::new();

        if let Some(kind) = normalize::text(responses, "type") {
            let kind = kind.to_lowercase();
            fact.insert("is_tia", kind.contains("tia") || kind.contains("mini"));
            fact.insert("is_ischemic", kind.contains("ischemic"));
            fact.insert("is_hemorrhagic", kind.contains("hemorrhagic"));
            fact.insert("type", kind);
        }

        fact.insert_opt("event_date", normalize::date(responses, "date_of_event"));
        fact.insert_opt(
            "years_since_event",
            normalize::years_since_answer(responses, "date_of_event", ctx.as_of),
        );

        if let Some(count) = normalize::text(responses, "number_of_events").and_then(normalize::leading_count) {
            fact.insert("event_count", f64::from(count));
            fact.insert("multiple_events", count > 1);
        }

        if let Some(raw) = normalize::answered_list(responses, "residual_effects") {
            let effects = canonical_labels(&raw, RESIDUAL_EFFECT_LABELS);
            let has = |e: &str| effects.iter().any(|x| x == e);
            fact.insert("has_residual_effects", !effects.is_empty() && !has("none"));
            fact.insert("has_paralysis", has("paralysis_weakness"));
            fact.insert("has_speech_difficulty", has("speech_difficulty"));
            fact.insert("has_cognitive_changes", has("cognitive_changes"));
            fact.insert("has_vision_problems", has("vision_problems"));
            fact.insert("residual_effects", effects);
        }

        if let Some(cause) = normalize::text(responses, "cause_identified") {
            fact.insert("cause", token(cause));
            fact.insert("cause_is_afib", mentions(cause, "afib") || mentions(cause, "atrial"));
        }

        fact.insert_opt(
            "on_blood_thinners",
            normalize::text(responses, "on_blood_thinners").map(|answer| answer == "Yes"),
        );

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
            applicant_age: 70,
            as_of: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        }
    }

    #[test]
    fn test_tia_flags() {
        let mut responses = Responses::new();
        responses.insert("type".into(), ResponseValue::from("TIA (mini-stroke)"));
        let fact = StrokeTransform.transform(&responses, &ctx());

        assert_eq!(fact.get("is_tia"), Some(&FactValue::Bool(true)));
        assert_eq!(fact.get("is_hemorrhagic"), Some(&FactValue::Bool(false)));
    }

    #[test]
    fn test_years_since_event_from_date() {
        let mut responses = Responses::new();
        responses.insert("date_of_event".into(), ResponseValue::from("2019-06-01"));
        let fact = StrokeTransform.transform(&responses, &ctx());

        assert_eq!(fact.get("years_since_event"), Some(&FactValue::Number(5.0)));
    }

    #[test]
    fn test_future_event_date_is_absent() {
        let mut responses = Responses::new();
        responses.insert("date_of_event".into(), ResponseValue::from("2030-01-01"));
        let fact = StrokeTransform.transform(&responses, &ctx());

        assert!(!fact.contains("years_since_event"));
    }

    #[test]
    fn test_afib_cause() {
        let mut responses = Responses::new();
        responses.insert("cause_identified".into(), ResponseValue::from("Atrial fibrillation"));
        let fact = StrokeTransform.transform(&responses, &ctx());

        assert_eq!(fact.get("cause"), Some(&FactValue::Text("atrial_fibrillation".into())));
        assert_eq!(fact.get("cause_is_afib"), Some(&FactValue::Bool(true)));
    }
}
