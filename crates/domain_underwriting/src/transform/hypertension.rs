//! High blood pressure answers
//!
//! Readings arrive as `"systolic/diastolic"` text. Readings outside
//! 60-250 / 30-150 mmHg are treated as typos and produce no facts.

use super::{ConditionTransform, TransformContext};
use crate::facts::{Fact, Responses};
use crate::normalize::{self, canonical_labels};

const STAGE2_SYSTOLIC: u32 = 140;
const STAGE2_DIASTOLIC: u32 = 90;
const CRISIS_SYSTOLIC: u32 = 180;
const CRISIS_DIASTOLIC: u32 = 120;

const SYSTOLIC_RANGE: std::ops::RangeInclusive<u32> = 60..=250;
const DIASTOLIC_RANGE: std::ops::RangeInclusive<u32> = 30..=150;

const COMPLICATION_LABELS: &[(&str, &str)] = &[
    ("Heart disease", "heart_disease"),
    ("Kidney problems", "kidney_problems"),
    ("Eye problems", "eye_problems"),
    ("None", "none"),
];

/// A validated blood pressure reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BloodPressure {
    pub systolic: u32,
    pub diastolic: u32,
}

impl BloodPressure {
    /// Parses `"130/85"` (whitespace around the slash allowed)
    pub fn parse(reading: &str) -> Option<Self> {
        let (systolic, diastolic) = reading.trim().split_once('/')?;
        let systolic: u32 = systolic.trim().parse().ok()?;
        let diastolic: u32 = diastolic.trim().parse().ok()?;
        (SYSTOLIC_RANGE.contains(&systolic) && DIASTOLIC_RANGE.contains(&diastolic))
            .then_some(Self { systolic, diastolic })
    }

    pub fn is_stage2_or_higher(&self) -> bool {
        self.systolic >= STAGE2_SYSTOLIC || self.diastolic >= STAGE2_DIASTOLIC
    }

    pub fn is_crisis(&self) -> bool {
        self.systolic > CRISIS_SYSTOLIC || self.diastolic > CRISIS_DIASTOLIC
    }
}

/// Transform for the `high_blood_pressure` condition
#[derive(Debug, Default, Clone, Copy)]
pub struct HypertensionTransform;

impl ConditionTransform for HypertensionTransform {
    fn transform(&self, responses: &Responses, ctx: &TransformContext) -> Fact {
        let mut fact = Fact::new();

        fact.insert_opt(
            "years_since_diagnosis",
            normalize::years_since_answer(responses, "diagnosis_date", ctx.as_of),
        );

        if let Some(bp) = normalize::text(responses, "current_reading").and_then(BloodPressure::parse) {
            fact.insert("systolic", f64::from(bp.systolic));
            fact.insert("diastolic", f64::from(bp.diastolic));
            fact.insert("is_stage2_or_higher", bp.is_stage2_or_higher());
            fact.insert("is_crisis", bp.is_crisis());
        }

        if let Some(control) = normalize::text(responses, "controlled") {
            fact.insert(
                "bp_controlled",
                matches!(control, "Yes, consistently normal" | "Mostly controlled"),
            );
            fact.insert("well_controlled", control == "Yes, consistently normal");
            fact.insert("poorly_controlled", control == "Poorly controlled");
            fact.insert("control_status", control);
        }

        if let Some(count) = normalize::text(responses, "medication_count").and_then(normalize::leading_count) {
            fact.insert("medication_count", f64::from(count));
            fact.insert("on_multiple_medications", count >= 2);
            fact.insert("diet_only", count == 0);
        }

        if let Some(raw) = normalize::answered_list(responses, "complications") {
            let complications = canonical_labels(&raw, COMPLICATION_LABELS);
            let has = |c: &str| complications.iter().any(|x| x == c);
            fact.insert("has_complications", !complications.is_empty() && !has("none"));
            fact.insert("has_heart_complications", has("heart_disease"));
            fact.insert("has_kidney_complications", has("kidney_problems"));
            fact.insert("has_eye_complications", has("eye_problems"));
            fact.insert("complications", complications);
        }

        fact
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reading() {
        assert_eq!(
            BloodPressure::parse("130 / 85"),
            Some(BloodPressure { systolic: 130, diastolic: 85 })
        );
        assert_eq!(BloodPressure::parse("130-85"), None);
        assert_eq!(BloodPressure::parse("300/85"), None);
        assert_eq!(BloodPressure::parse("130/20"), None);
    }

    #[test]
    fn test_stage_thresholds() {
        let stage1 = BloodPressure { systolic: 135, diastolic: 85 };
        assert!(!stage1.is_stage2_or_higher());

        let stage2 = BloodPressure { systolic: 128, diastolic: 90 };
        assert!(stage2.is_stage2_or_higher());
        assert!(!stage2.is_crisis());

        let crisis = BloodPressure { systolic: 181, diastolic: 100 };
        assert!(crisis.is_crisis());
    }
}
