//! Diabetes answers
//!
//! | Fact | Source | Present when |
//! |---|---|---|
//! | `insulin_use` | `treatment` | treatment is non-blank |
//! | `a1c_level`, `is_controlled`, `good_control` | `a1c_level` | A1C is a finite number |
//! | `complications` | `complications` | list is non-empty |
//! | `years_since_diagnosis` | `diagnosis_age` | 0 <= diagnosis age <= applicant age |
//! | `type` | `type` | non-blank |

use once_cell::sync::Lazy;
use std::collections::HashMap;

use super::{ConditionTransform, TransformContext};
use crate::facts::{Fact, Responses};
use crate::normalize::{self, label_token};

/// A1C below which diabetes counts as controlled
pub const CONTROLLED_A1C_BELOW: f64 = 7.5;

/// Explicit-selection label for "no complications"
const NONE_LABEL: &str = "None";

/// Questionnaire treatment options, lowercased
static TREATMENT_INSULIN: Lazy<HashMap<&'static str, bool>> = Lazy::new(|| {
    HashMap::from([
        ("insulin only", true),
        ("insulin pump", true),
        ("oral medication + insulin", true),
        ("oral medication and insulin", true),
        ("oral medication only", false),
        ("diet and exercise only", false),
        ("diet only", false),
        ("no medication", false),
        ("no insulin", false),
        ("no treatment", false),
    ])
});

const COMPLICATION_LABELS: &[(&str, &str)] = &[
    ("Retinopathy (eye)", "retinopathy"),
    ("Neuropathy (nerve)", "neuropathy"),
    ("Nephropathy (kidney)", "nephropathy"),
    ("Amputation", "amputation"),
    ("Heart disease", "heart_disease"),
    (NONE_LABEL, ""),
];

/// Transform for the `diabetes` condition
#[derive(Debug, Default, Clone, Copy)]
pub struct DiabetesTransform;

impl ConditionTransform for DiabetesTransform {
    fn transform(&self, responses: &Responses, ctx: &TransformContext) -> Fact {
        let mut fact = Fact::new();

        fact.insert_opt(
            "insulin_use",
            normalize::text(responses, "treatment").map(insulin_use),
        );

        if let Some(a1c) = normalize::number(responses, "a1c_level") {
            let controlled = a1c < CONTROLLED_A1C_BELOW;
            fact.insert("a1c_level", a1c);
            fact.insert("is_controlled", controlled);
            fact.insert("good_control", controlled);
        }

        if let Some(raw) = normalize::string_list(responses, "complications") {
            // An empty selection is unanswered; an explicit "None" is an answer
            if !raw.is_empty() {
                fact.insert("complications", complications(&raw));
            }
        }

        fact.insert_opt(
            "years_since_diagnosis",
            normalize::number(responses, "diagnosis_age")
                .and_then(|age| years_since_diagnosis(age, ctx.applicant_age)),
        );

        fact.insert_opt("type", normalize::text(responses, "type"));

        fact
    }
}

/// Whether a treatment description implies insulin
///
/// Known questionnaire options are looked up first. Free text falls back to
/// word matching, with negations such as "no insulin" checked before the
/// word "insulin" itself.
pub fn insulin_use(treatment: &str) -> bool {
    if let Some(known) = TREATMENT_INSULIN.get(treatment.trim().to_lowercase().as_str()) {
        return *known;
    }

    let words = normalize::words(treatment);
    let negated = words.iter().any(|w| w == "noninsulin")
        || words.windows(2).any(|pair| {
            matches!(
                (pair[0].as_str(), pair[1].as_str()),
                ("no", "insulin") | ("without", "insulin") | ("non", "insulin") | ("no", "medication")
            )
        });
    if negated {
        return false;
    }

    words.iter().any(|w| w == "insulin" || w == "pump")
}

fn complications(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|label| {
            COMPLICATION_LABELS
                .iter()
                .find(|(known, _)| *known == label.trim())
                .map(|(_, canonical)| canonical.to_string())
                .unwrap_or_else(|| label_token(label))
        })
        .filter(|token| !token.is_empty())
        .collect()
}

fn years_since_diagnosis(diagnosis_age: f64, applicant_age: u32) -> Option<f64> {
    let applicant_age = f64::from(applicant_age);
    (diagnosis_age >= 0.0 && diagnosis_age <= applicant_age).then(|| applicant_age - diagnosis_age)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_treatment_labels() {
        assert!(insulin_use("Insulin only"));
        assert!(insulin_use("ORAL MEDICATION + INSULIN"));
        assert!(!insulin_use("No insulin"));
        assert!(!insulin_use("Diet only"));
    }

    #[test]
    fn test_free_text_negations() {
        assert!(!insulin_use("managed without insulin"));
        assert!(!insulin_use("non-insulin dependent"));
        assert!(!insulin_use("no medication at all"));
        assert!(insulin_use("nightly insulin injections"));
        assert!(insulin_use("uses a pump"));
        assert!(!insulin_use("metformin"));
    }

    #[test]
    fn test_complications_mapping() {
        let raw = vec![
            "Retinopathy (eye)".to_string(),
            "Foot Ulcer (left)".to_string(),
            "None".to_string(),
        ];
        assert_eq!(complications(&raw), vec!["retinopathy", "foot_ulcer"]);
    }

    #[test]
    fn test_years_since_diagnosis_guards() {
        assert_eq!(years_since_diagnosis(40.0, 55), Some(15.0));
        assert_eq!(years_since_diagnosis(55.0, 55), Some(0.0));
        assert_eq!(years_since_diagnosis(60.0, 55), None);
        assert_eq!(years_since_diagnosis(-1.0, 55), None);
    }
}
