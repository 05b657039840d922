//! Cancer answers

use super::{ConditionTransform, TransformContext};
use crate::facts::{Fact, Responses};
use crate::normalize::{self, mentions, token};

/// Cancer types rated as high risk regardless of stage
const HIGH_RISK_TYPES: &[&str] = &["pancreatic", "lung", "brain", "leukemia", "lymphoma"];

/// Transform for the `cancer` condition
#[derive(Debug, Default, Clone, Copy)]
pub struct CancerTransform;

impl ConditionTransform for CancerTransform {
    fn transform(&self, responses: &Responses, ctx: &TransformContext) -> Fact {
        let mut fact = Fact::new();

        if let Some(raw) = normalize::text(responses, "cancer_type") {
            let kind = token(raw);
            let skin = kind.contains("skin");
            let melanoma = kind.contains("melanoma");
            fact.insert(
                "is_high_risk_type",
                HIGH_RISK_TYPES.iter().any(|t| kind.contains(t)),
            );
            fact.insert("is_skin_cancer", skin);
            fact.insert("is_melanoma", melanoma);
            fact.insert("is_non_melanoma_skin", skin && kind.contains("non") && !melanoma);
            fact.insert("cancer_type", kind);
        }

        fact.insert_opt("diagnosis_date", normalize::date(responses, "diagnosis_date"));
        fact.insert_opt(
            "years_since_diagnosis",
            normalize::years_since_answer(responses, "diagnosis_date", ctx.as_of),
        );

        if let Some(raw) = normalize::text(responses, "stage_at_diagnosis") {
            fact.insert("stage_raw", raw);
            if let Some(stage) = parse_stage(raw) {
                fact.insert("stage", f64::from(stage));
                fact.insert("is_early_stage", stage <= 1);
                fact.insert("is_advanced_stage", stage >= 3);
                fact.insert("is_metastatic", stage == 4);
            }
        }

        if let Some(treatment) = normalize::answered_list(responses, "treatment") {
            let any = |needle: &str| treatment.iter().any(|t| mentions(t, needle));
            fact.insert("had_surgery", any("surgery"));
            fact.insert("had_chemo", any("chemo"));
            fact.insert("had_radiation", any("radiation"));
            fact.insert("had_immunotherapy", any("immunotherapy"));
            fact.insert("watchful_waiting", any("watchful"));
            fact.insert(
                "treatment",
                treatment.iter().map(|t| token(t)).collect::<Vec<_>>(),
            );
        }

        if let Some(status) = normalize::text(responses, "current_status") {
            fact.insert(
                "in_remission",
                mentions(status, "remission") || mentions(status, "no evidence"),
            );
            fact.insert("in_treatment", mentions(status, "in treatment"));
            fact.insert("has_recurrence", mentions(status, "recurrence"));
            fact.insert("is_stable", mentions(status, "stable"));
            fact.insert("current_status", token(status));
        }

        fact.insert_opt(
            "years_in_remission",
            normalize::years_since_answer(responses, "remission_date", ctx.as_of),
        );

        fact
    }
}

/// Parses a stage answer such as `"Stage 0 (in situ)"`, `"Stage IIIB"` or `"4"`
///
/// Roman numerals are matched as whole words so that letters inside other
/// words do not count.
pub fn parse_stage(raw: &str) -> Option<u32> {
    let lowered = raw.to_lowercase();
    if lowered.contains("in situ") {
        return Some(0);
    }
    for word in normalize::words(&lowered) {
        let numeral = word.trim_end_matches(['a', 'b', 'c']);
        let stage = match numeral {
            "0" => Some(0),
            "1" | "i" => Some(1),
            "2" | "ii" => Some(2),
            "3" | "iii" => Some(3),
            "4" | "iv" => Some(4),
            _ => None,
        };
        if stage.is_some() {
            return stage;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{FactValue, ResponseValue};
    use chrono::NaiveDate;

    #[test]
    fn test_parse_stage() {
        assert_eq!(parse_stage("Stage 0 (in situ)"), Some(0));
        assert_eq!(parse_stage("Stage I"), Some(1));
        assert_eq!(parse_stage("Stage IIIB"), Some(3));
        assert_eq!(parse_stage("Stage IV"), Some(4));
        assert_eq!(parse_stage("2"), Some(2));
        assert_eq!(parse_stage("Unknown"), None);
    }

    #[test]
    fn test_high_risk_type() {
        let mut responses = Responses::new();
        responses.insert("cancer_type".into(), ResponseValue::from("Lung"));
        let ctx = TransformContext {
            applicant_age: 50,
            as_of: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        let fact = CancerTransform.transform(&responses, &ctx);

        assert_eq!(fact.get("cancer_type"), Some(&FactValue::Text("lung".into())));
        assert_eq!(fact.get("is_high_risk_type"), Some(&FactValue::Bool(true)));
        assert_eq!(fact.get("is_skin_cancer"), Some(&FactValue::Bool(false)));
    }

    #[test]
    fn test_unparseable_stage_keeps_raw_only() {
        let mut responses = Responses::new();
        responses.insert("stage_at_diagnosis".into(), ResponseValue::from("Not sure"));
        let ctx = TransformContext {
            applicant_age: 50,
            as_of: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        let fact = CancerTransform.transform(&responses, &ctx);

        assert!(fact.contains("stage_raw"));
        assert!(!fact.contains("stage"));
        assert!(!fact.contains("is_early_stage"));
    }
}
