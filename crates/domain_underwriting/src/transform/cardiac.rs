//! Heart disease and heart attack answers

use super::{insert_ejection_fraction, ConditionTransform, TransformContext};
use crate::facts::{Fact, Responses};
use crate::normalize::{self, canonical_labels, mentions, token};

const PROCEDURE_LABELS: &[(&str, &str)] = &[
    ("Angioplasty/Stent", "angioplasty_stent"),
    ("Bypass Surgery (CABG)", "bypass_cabg"),
    ("Valve Replacement", "valve_replacement"),
    ("Pacemaker", "pacemaker"),
    ("Defibrillator (ICD)", "defibrillator"),
    ("None", "none"),
];

const MEDICATION_LABELS: &[(&str, &str)] = &[
    ("Beta Blocker", "beta_blocker"),
    ("ACE Inhibitor/ARB", "ace_inhibitor_arb"),
    ("Statin", "statin"),
    ("Blood Thinner", "blood_thinner"),
    ("Diuretic", "diuretic"),
    ("Nitrate", "nitrate"),
    ("Other", "other"),
    ("None", "none"),
];

const HEART_ATTACK_COMPLICATION_LABELS: &[(&str, &str)] = &[
    ("Heart failure", "heart_failure"),
    ("Arrhythmia", "arrhythmia"),
    ("Cardiogenic shock", "cardiogenic_shock"),
    ("None", "none"),
];

/// Answers that count as symptoms under control
const CONTROLLED_SYMPTOMS: &[&str] = &["Yes, fully controlled", "Mostly controlled"];

/// Transform for the `heart_disease` condition
#[derive(Debug, Default, Clone, Copy)]
pub struct HeartDiseaseTransform;

impl ConditionTransform for HeartDiseaseTransform {
    fn transform(&self, responses: &Responses, ctx: &TransformContext) -> Fact {
        let mut fact = Fact::new();

        fact.insert_opt("type", normalize::text(responses, "type"));
        fact.insert_opt(
            "years_since_diagnosis",
            normalize::years_since_answer(responses, "diagnosis_date", ctx.as_of),
        );

        if let Some(raw) = normalize::answered_list(responses, "procedures") {
            let procedures = canonical_labels(&raw, PROCEDURE_LABELS);
            let has = |p: &str| procedures.iter().any(|x| x == p);
            fact.insert("has_stent", has("angioplasty_stent"));
            fact.insert("has_bypass", has("bypass_cabg"));
            fact.insert("has_valve_replacement", has("valve_replacement"));
            fact.insert("has_pacemaker", has("pacemaker"));
            fact.insert("has_defibrillator", has("defibrillator"));
            fact.insert("no_procedures", procedures.is_empty() || has("none"));
            fact.insert("procedures", procedures);
        }

        insert_ejection_fraction(
            &mut fact,
            "ejection_fraction",
            normalize::number(responses, "ejection_fraction"),
        );

        if let Some(symptoms) = normalize::text(responses, "symptoms_controlled") {
            fact.insert("symptoms_controlled", CONTROLLED_SYMPTOMS.contains(&symptoms));
            fact.insert("symptoms_controlled_raw", symptoms);
        }

        if let Some(raw) = normalize::answered_list(responses, "medications") {
            let medications = canonical_labels(&raw, MEDICATION_LABELS);
            let on = |m: &str| medications.iter().any(|x| x == m);
            fact.insert("on_blood_thinner", on("blood_thinner"));
            fact.insert("on_beta_blocker", on("beta_blocker"));
            fact.insert("on_statin", on("statin"));
            fact.insert("on_ace_inhibitor", on("ace_inhibitor_arb"));
            fact.insert("medications", medications);
        }

        fact
    }
}

/// Transform for the `heart_attack` condition
#[derive(Debug, Default, Clone, Copy)]
pub struct HeartAttackTransform;

impl ConditionTransform for HeartAttackTransform {
    fn transform(&self, responses: &Responses, ctx: &TransformContext) -> Fact {
        let mut fact = Fact::new();

        fact.insert_opt(
            "years_since_event",
            normalize::years_since_answer(responses, "date_of_event", ctx.as_of),
        );

        if let Some(count) = normalize::text(responses, "number_of_events").and_then(normalize::leading_count) {
            fact.insert("event_count", f64::from(count));
            fact.insert("multiple_events", count > 1);
        }

        if let Some(treatment) = normalize::answered_list(responses, "treatment") {
            let had_stent = treatment
                .iter()
                .any(|t| mentions(t, "angioplasty") || mentions(t, "stent"));
            let had_bypass = treatment
                .iter()
                .any(|t| mentions(t, "bypass") || mentions(t, "cabg"));
            let medication_only = !had_stent
                && !had_bypass
                && treatment.iter().any(|t| mentions(t, "medication only"));
            fact.insert("had_stent", had_stent);
            fact.insert("had_bypass", had_bypass);
            fact.insert("medication_only", medication_only);
            fact.insert(
                "treatment",
                treatment.iter().map(|t| token(t)).collect::<Vec<_>>(),
            );
        }

        insert_ejection_fraction(
            &mut fact,
            "ejection_fraction_post",
            normalize::number(responses, "ejection_fraction_post"),
        );

        if let Some(raw) = normalize::answered_list(responses, "complications") {
            let complications = canonical_labels(&raw, HEART_ATTACK_COMPLICATION_LABELS);
            let has = |c: &str| complications.iter().any(|x| x == c);
            fact.insert("has_heart_failure", has("heart_failure"));
            fact.insert("has_arrhythmia", has("arrhythmia"));
            fact.insert("has_cardiogenic_shock", has("cardiogenic_shock"));
            fact.insert("has_complications", !complications.is_empty() && !has("none"));
            fact.insert("complications", complications);
        }

        if let Some(recovery) = normalize::text(responses, "full_recovery") {
            fact.insert("full_recovery", recovery == "Yes");
            fact.insert("partial_recovery", matches!(recovery, "Partial" | "Mostly"));
            fact.insert("recovery_status", recovery.to_lowercase());
        }

        fact
    }
}
