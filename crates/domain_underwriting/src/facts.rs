//! Questionnaire answers and normalized facts
//!
//! A `ConditionAnswer` is what the applicant typed into one questionnaire
//! section. A `Fact` is what the engine reasons about after normalization.
//! Every fact entry is optional: a missing entry means "not answered" and is
//! never replaced by `false`, an empty list or zero.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Scope under which applicant-level facts are addressed (`client.age`)
pub const CLIENT_SCOPE: &str = "client";

/// A raw questionnaire answer value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<ResponseValue>),
}

impl ResponseValue {
    /// Convenience constructor for a list of labels
    pub fn labels<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ResponseValue::List(items.into_iter().map(|s| ResponseValue::Text(s.into())).collect())
    }
}

impl From<&str> for ResponseValue {
    fn from(value: &str) -> Self {
        ResponseValue::Text(value.to_string())
    }
}

impl From<String> for ResponseValue {
    fn from(value: String) -> Self {
        ResponseValue::Text(value)
    }
}

impl From<f64> for ResponseValue {
    fn from(value: f64) -> Self {
        ResponseValue::Number(value)
    }
}

impl From<i64> for ResponseValue {
    fn from(value: i64) -> Self {
        ResponseValue::Number(value as f64)
    }
}

impl From<bool> for ResponseValue {
    fn from(value: bool) -> Self {
        ResponseValue::Bool(value)
    }
}

/// Raw answers for one condition, keyed by answer-field name
pub type Responses = BTreeMap<String, ResponseValue>;

/// One applicant-reported medical condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionAnswer {
    /// Stable condition identifier (e.g. `diabetes`)
    pub condition_code: String,
    /// Display name shown in the questionnaire
    #[serde(default)]
    pub condition_name: String,
    /// Answer-field name to raw value
    #[serde(default)]
    pub responses: Responses,
}

impl ConditionAnswer {
    pub fn new(condition_code: impl Into<String>, responses: Responses) -> Self {
        let condition_code = condition_code.into();
        Self {
            condition_name: condition_code.clone(),
            condition_code,
            responses,
        }
    }
}

/// A typed, normalized fact value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FactValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
    Date(NaiveDate),
}

impl FactValue {
    /// Human-readable name of the value's type
    pub fn kind(&self) -> &'static str {
        match self {
            FactValue::Bool(_) => "boolean",
            FactValue::Number(_) => "number",
            FactValue::Text(_) => "text",
            FactValue::List(_) => "list",
            FactValue::Date(_) => "date",
        }
    }

    /// Converts a raw answer verbatim; `Null` has no fact representation
    pub fn from_raw(value: &ResponseValue) -> Option<FactValue> {
        match value {
            ResponseValue::Null => None,
            ResponseValue::Bool(b) => Some(FactValue::Bool(*b)),
            ResponseValue::Number(n) => Some(FactValue::Number(*n)),
            ResponseValue::Text(s) => Some(FactValue::Text(s.clone())),
            ResponseValue::List(items) => Some(FactValue::List(
                items.iter().filter_map(raw_scalar_text).collect(),
            )),
        }
    }
}

fn raw_scalar_text(value: &ResponseValue) -> Option<String> {
    match value {
        ResponseValue::Text(s) => Some(s.clone()),
        ResponseValue::Number(n) => Some(n.to_string()),
        ResponseValue::Bool(b) => Some(b.to_string()),
        ResponseValue::Null | ResponseValue::List(_) => None,
    }
}

impl From<bool> for FactValue {
    fn from(value: bool) -> Self {
        FactValue::Bool(value)
    }
}

impl From<f64> for FactValue {
    fn from(value: f64) -> Self {
        FactValue::Number(value)
    }
}

impl From<&str> for FactValue {
    fn from(value: &str) -> Self {
        FactValue::Text(value.to_string())
    }
}

impl From<String> for FactValue {
    fn from(value: String) -> Self {
        FactValue::Text(value)
    }
}

impl From<Vec<String>> for FactValue {
    fn from(value: Vec<String>) -> Self {
        FactValue::List(value)
    }
}

impl From<NaiveDate> for FactValue {
    fn from(value: NaiveDate) -> Self {
        FactValue::Date(value)
    }
}

/// Normalized facts for one condition
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Fact(BTreeMap<String, FactValue>);

impl Fact {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a fact entry
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FactValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Sets a fact entry only when a value was derived
    pub fn insert_opt<V: Into<FactValue>>(&mut self, name: &str, value: Option<V>) {
        if let Some(value) = value {
            self.insert(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&FactValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FactValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, FactValue)> for Fact {
    fn from_iter<T: IntoIterator<Item = (String, FactValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Applicant gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Applicant-level attributes that rules may reference
///
/// Unknown attributes stay `None`; they are never defaulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantProfile {
    pub age: u32,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub tobacco: Option<bool>,
    #[serde(default)]
    pub bmi: Option<f64>,
    #[serde(default)]
    pub state: Option<String>,
}

impl ApplicantProfile {
    pub fn new(age: u32) -> Self {
        Self {
            age,
            gender: None,
            tobacco: None,
            bmi: None,
            state: None,
        }
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn with_tobacco(mut self, tobacco: bool) -> Self {
        self.tobacco = Some(tobacco);
        self
    }

    pub fn with_bmi(mut self, bmi: f64) -> Self {
        self.bmi = Some(bmi);
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Facts exposed under the `client` scope
    fn client_fact(&self) -> Fact {
        let mut fact = Fact::new();
        fact.insert("age", f64::from(self.age));
        fact.insert_opt("gender", self.gender.map(|g| g.as_str()));
        fact.insert_opt("tobacco", self.tobacco);
        fact.insert_opt("bmi", self.bmi.filter(|b| b.is_finite()));
        fact.insert_opt(
            "state",
            self.state
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_uppercase),
        );
        fact
    }
}

/// A fact address of the form `<scope>.<fact_name>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub scope: String,
    pub name: String,
}

impl FieldRef {
    /// Parses `condition_code.fact_name`; both halves must be non-empty
    pub fn parse(path: &str) -> Option<Self> {
        let (scope, name) = path.split_once('.')?;
        let (scope, name) = (scope.trim(), name.trim());
        if scope.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self {
            scope: scope.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.scope, self.name)
    }
}

/// All facts for one evaluation: per-condition facts plus the `client` scope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactMap {
    #[serde(skip)]
    applicant: ApplicantProfile,
    client: Fact,
    conditions: BTreeMap<String, Fact>,
}

impl FactMap {
    pub fn new(applicant: ApplicantProfile) -> Self {
        let client = applicant.client_fact();
        Self {
            applicant,
            client,
            conditions: BTreeMap::new(),
        }
    }

    pub fn applicant(&self) -> &ApplicantProfile {
        &self.applicant
    }

    pub fn client(&self) -> &Fact {
        &self.client
    }

    /// Adds facts for a reported condition, replacing any previous entry
    pub fn insert_condition(&mut self, condition_code: impl Into<String>, fact: Fact) {
        self.conditions.insert(condition_code.into(), fact);
    }

    pub fn condition(&self, condition_code: &str) -> Option<&Fact> {
        self.conditions.get(condition_code)
    }

    /// Whether the applicant reported the condition at all
    pub fn reports(&self, condition_code: &str) -> bool {
        self.conditions.contains_key(condition_code)
    }

    pub fn condition_codes(&self) -> impl Iterator<Item = &str> {
        self.conditions.keys().map(String::as_str)
    }

    /// Resolves a fact address; `None` means the fact is absent
    pub fn lookup(&self, field: &FieldRef) -> Option<&FactValue> {
        let scope = if field.scope == CLIENT_SCOPE {
            &self.client
        } else {
            self.conditions.get(&field.scope)?
        };
        scope.get(&field.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_ref_parsing() {
        let field = FieldRef::parse("diabetes.a1c_level").unwrap();
        assert_eq!(field.scope, "diabetes");
        assert_eq!(field.name, "a1c_level");
        assert_eq!(field.to_string(), "diabetes.a1c_level");

        assert!(FieldRef::parse("diabetes").is_none());
        assert!(FieldRef::parse(".a1c_level").is_none());
        assert!(FieldRef::parse("diabetes.").is_none());
    }

    #[test]
    fn test_client_scope_omits_unknown_attributes() {
        let facts = FactMap::new(ApplicantProfile::new(42));
        assert_eq!(facts.client().get("age"), Some(&FactValue::Number(42.0)));
        assert!(!facts.client().contains("gender"));
        assert!(!facts.client().contains("tobacco"));
    }

    #[test]
    fn test_lookup_missing_condition_is_absent() {
        let facts = FactMap::new(ApplicantProfile::new(42));
        let field = FieldRef::parse("stroke.is_tia").unwrap();
        assert!(facts.lookup(&field).is_none());
    }

    #[test]
    fn test_response_value_deserializes_untagged() {
        let raw: Responses = serde_json::from_str(
            r#"{"a": 7.5, "b": "Insulin only", "c": ["None"], "d": null, "e": true}"#,
        )
        .unwrap();
        assert_eq!(raw["a"], ResponseValue::Number(7.5));
        assert_eq!(raw["b"], ResponseValue::Text("Insulin only".into()));
        assert_eq!(raw["c"], ResponseValue::labels(["None"]));
        assert_eq!(raw["d"], ResponseValue::Null);
        assert_eq!(raw["e"], ResponseValue::Bool(true));
    }
}
