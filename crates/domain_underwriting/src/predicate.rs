//! Predicate Evaluator
//!
//! Rules carry their matching criteria as a tree of [`PredicateNode`]s.
//! Evaluation uses three-valued (Kleene) logic so that a missing answer
//! yields [`Tristate::Unknown`] rather than a wrong `False`.
//!
//! # Wire format
//!
//! ```text
//! {}                                              matches unconditionally
//! {"all": [ ... ]}  {"any": [ ... ]}  {"not": {...}}
//! {"type": "boolean", "field": "diabetes.is_controlled", "operator": "eq", "value": true}
//! {"type": "date", "field": "cancer.diagnosis_date", "operator": "years_since_gte", "value": 5}
//! {"type": "numeric", "field": "diabetes.a1c_level", "operator": "between", "value": [6, 8]}
//! {"type": "condition_presence", "field": "conditions", "operator": "includes_any", "value": ["stroke"]}
//! ```
//!
//! A document may also arrive wrapped as `{"version": 2, "root": <node>}`.
//!
//! Parsing never fails. JSON that cannot be interpreted becomes
//! [`PredicateNode::Invalid`], which evaluates to `Unknown` and reports the
//! reason through the evaluation trace.

use chrono::NaiveDate;
use core_kernel::{elapsed_between, parse_calendar_date, ElapsedUnit};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::fmt;
use std::ops::Not;

use crate::facts::{FactMap, FactValue, FieldRef};

/// Pseudo-field addressed by `condition_presence` nodes
pub const CONDITIONS_FIELD: &str = "conditions";

/// Three-valued truth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tristate {
    True,
    False,
    Unknown,
}

impl Tristate {
    /// Kleene conjunction: `False` dominates, then `Unknown`
    pub fn and(self, other: Tristate) -> Tristate {
        match (self, other) {
            (Tristate::False, _) | (_, Tristate::False) => Tristate::False,
            (Tristate::True, Tristate::True) => Tristate::True,
            _ => Tristate::Unknown,
        }
    }

    /// Kleene disjunction: `True` dominates, then `Unknown`
    pub fn or(self, other: Tristate) -> Tristate {
        match (self, other) {
            (Tristate::True, _) | (_, Tristate::True) => Tristate::True,
            (Tristate::False, Tristate::False) => Tristate::False,
            _ => Tristate::Unknown,
        }
    }

    pub fn is_true(self) -> bool {
        self == Tristate::True
    }

    pub fn is_unknown(self) -> bool {
        self == Tristate::Unknown
    }
}

impl Not for Tristate {
    type Output = Tristate;

    fn not(self) -> Tristate {
        match self {
            Tristate::True => Tristate::False,
            Tristate::False => Tristate::True,
            Tristate::Unknown => Tristate::Unknown,
        }
    }
}

impl From<bool> for Tristate {
    fn from(value: bool) -> Self {
        if value {
            Tristate::True
        } else {
            Tristate::False
        }
    }
}

/// What a leaf does when its fact is absent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullPolicy {
    /// Absence propagates as `Unknown`
    #[default]
    Unknown,
    /// Authored as `"true"`; not supported, evaluates as malformed
    AssumeTrue,
    /// Authored as `"false"`; not supported, evaluates as malformed
    AssumeFalse,
}

impl NullPolicy {
    fn parse(raw: Option<&Value>) -> Result<Self, String> {
        match raw {
            None | Some(Value::Null) => Ok(NullPolicy::Unknown),
            Some(Value::String(s)) if s == "unknown" => Ok(NullPolicy::Unknown),
            Some(Value::String(s)) if s == "true" => Ok(NullPolicy::AssumeTrue),
            Some(Value::String(s)) if s == "false" => Ok(NullPolicy::AssumeFalse),
            Some(other) => Err(format!("unsupported treatNullAs {}", other)),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            NullPolicy::Unknown => "unknown",
            NullPolicy::AssumeTrue => "true",
            NullPolicy::AssumeFalse => "false",
        }
    }
}

/// Numeric comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Comparison {
    fn parse(op: &str) -> Option<Self> {
        Some(match op {
            "eq" => Comparison::Eq,
            "neq" => Comparison::Neq,
            "lt" => Comparison::Lt,
            "lte" => Comparison::Lte,
            "gt" => Comparison::Gt,
            "gte" => Comparison::Gte,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Eq => "eq",
            Comparison::Neq => "neq",
            Comparison::Lt => "lt",
            Comparison::Lte => "lte",
            Comparison::Gt => "gt",
            Comparison::Gte => "gte",
        }
    }

    pub fn apply(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparison::Eq => lhs == rhs,
            Comparison::Neq => lhs != rhs,
            Comparison::Lt => lhs < rhs,
            Comparison::Lte => lhs <= rhs,
            Comparison::Gt => lhs > rhs,
            Comparison::Gte => lhs >= rhs,
        }
    }
}

/// Operator of a `numeric` leaf
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericOp {
    Compare(Comparison, f64),
    /// Inclusive on both ends
    Between(f64, f64),
}

/// Operator of a `string` leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOp {
    Eq,
    Neq,
    Contains,
    StartsWith,
    EndsWith,
}

impl TextOp {
    fn parse(op: &str) -> Option<Self> {
        Some(match op {
            "eq" => TextOp::Eq,
            "neq" => TextOp::Neq,
            "contains" => TextOp::Contains,
            "starts_with" => TextOp::StartsWith,
            "ends_with" => TextOp::EndsWith,
            _ => return None,
        })
    }

    fn as_str(&self) -> &'static str {
        match self {
            TextOp::Eq => "eq",
            TextOp::Neq => "neq",
            TextOp::Contains => "contains",
            TextOp::StartsWith => "starts_with",
            TextOp::EndsWith => "ends_with",
        }
    }
}

/// Operator of an `array` leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayOp {
    IncludesAny(Vec<String>),
    IncludesAll(Vec<String>),
    IsEmpty,
    IsNotEmpty,
}

/// A member of a `set` leaf's value list
#[derive(Debug, Clone, PartialEq)]
pub enum SetMember {
    Text(String),
    Number(f64),
}

impl SetMember {
    fn matches(&self, value: &FactValue) -> Option<bool> {
        match (self, value) {
            (SetMember::Text(a), FactValue::Text(b)) => Some(a == b),
            (SetMember::Number(a), FactValue::Number(b)) => Some(a == b),
            (SetMember::Text(_), FactValue::Number(_)) | (SetMember::Number(_), FactValue::Text(_)) => {
                Some(false)
            }
            _ => None,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            SetMember::Text(s) => json!(s),
            SetMember::Number(n) => json!(n),
        }
    }
}

/// One node of a predicate tree
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateNode {
    /// `{}`: matches unconditionally
    Always,
    All(Vec<PredicateNode>),
    Any(Vec<PredicateNode>),
    Not(Box<PredicateNode>),
    /// Elapsed calendar time since a date fact, compared to `value`
    Date {
        field: FieldRef,
        unit: ElapsedUnit,
        cmp: Comparison,
        value: f64,
        treat_null_as: NullPolicy,
    },
    Boolean {
        field: FieldRef,
        negate: bool,
        value: bool,
        treat_null_as: NullPolicy,
    },
    Numeric {
        field: FieldRef,
        op: NumericOp,
        treat_null_as: NullPolicy,
    },
    Text {
        field: FieldRef,
        op: TextOp,
        value: String,
        treat_null_as: NullPolicy,
    },
    Array {
        field: FieldRef,
        op: ArrayOp,
        treat_null_as: NullPolicy,
    },
    Set {
        field: FieldRef,
        negate: bool,
        values: Vec<SetMember>,
        treat_null_as: NullPolicy,
    },
    /// The only leaf for which absence is a definite answer
    NullCheck { field: FieldRef, expect_null: bool },
    /// Tests which conditions the applicant reported
    ConditionPresence { require_all: bool, codes: Vec<String> },
    /// JSON that could not be interpreted as a node
    Invalid { reason: String, raw: Value },
}

impl Default for PredicateNode {
    fn default() -> Self {
        PredicateNode::Always
    }
}

// ============================================================================
// Parsing
// ============================================================================

impl PredicateNode {
    /// Interprets a predicate document, unwrapping a `{version, root}` envelope
    pub fn from_json(value: &Value) -> PredicateNode {
        if let Value::Object(obj) = value {
            if obj.contains_key("version") {
                if let Some(root) = obj.get("root") {
                    return Self::parse_node(root);
                }
            }
        }
        Self::parse_node(value)
    }

    fn parse_node(value: &Value) -> PredicateNode {
        match Self::try_parse_node(value) {
            Ok(node) => node,
            Err(reason) => PredicateNode::Invalid {
                reason,
                raw: value.clone(),
            },
        }
    }

    fn try_parse_node(value: &Value) -> Result<PredicateNode, String> {
        let obj = value
            .as_object()
            .ok_or_else(|| format!("predicate node must be an object, got {}", value))?;

        if obj.is_empty() {
            return Ok(PredicateNode::Always);
        }

        let combinators: Vec<&str> = ["all", "any", "not"]
            .into_iter()
            .filter(|k| obj.contains_key(*k))
            .collect();

        match combinators.as_slice() {
            [] => {}
            [key] => {
                if obj.contains_key("type") {
                    return Err(format!("node mixes '{}' with a leaf 'type'", key));
                }
                return Self::parse_combinator(key, &obj[*key]);
            }
            _ => return Err(format!("node has more than one combinator: {}", combinators.join(", "))),
        }

        let kind = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| "node has neither a combinator nor a 'type'".to_string())?;

        let operator = obj
            .get("operator")
            .and_then(Value::as_str)
            .ok_or_else(|| format!("{} node is missing 'operator'", kind))?;

        let value = obj.get("value").unwrap_or(&Value::Null);

        if kind == "condition_presence" {
            return Self::parse_presence(obj, operator, value);
        }

        let field_path = obj
            .get("field")
            .and_then(Value::as_str)
            .ok_or_else(|| format!("{} node is missing 'field'", kind))?;
        let field = FieldRef::parse(field_path)
            .ok_or_else(|| format!("field '{}' must be <condition_code>.<fact_name>", field_path))?;

        if kind == "null_check" {
            let expect_null = match operator {
                "is_null" => true,
                "is_not_null" => false,
                other => return Err(format!("unknown null_check operator '{}'", other)),
            };
            return Ok(PredicateNode::NullCheck { field, expect_null });
        }

        let treat_null_as = NullPolicy::parse(obj.get("treatNullAs"))?;

        match kind {
            "date" => {
                let (unit, cmp) = parse_date_operator(operator)?;
                Ok(PredicateNode::Date {
                    field,
                    unit,
                    cmp,
                    value: number_value(value, operator)?,
                    treat_null_as,
                })
            }
            "boolean" => {
                let negate = match operator {
                    "eq" => false,
                    "neq" => true,
                    other => return Err(format!("unknown boolean operator '{}'", other)),
                };
                let value = value
                    .as_bool()
                    .ok_or_else(|| format!("boolean {} expects true or false, got {}", operator, value))?;
                Ok(PredicateNode::Boolean {
                    field,
                    negate,
                    value,
                    treat_null_as,
                })
            }
            "numeric" => {
                let op = if operator == "between" {
                    let bounds = value
                        .as_array()
                        .filter(|b| b.len() == 2)
                        .ok_or_else(|| "between expects [min, max]".to_string())?;
                    let min = number_value(&bounds[0], operator)?;
                    let max = number_value(&bounds[1], operator)?;
                    if min > max {
                        return Err(format!("between bounds out of order: [{}, {}]", min, max));
                    }
                    NumericOp::Between(min, max)
                } else {
                    let cmp = Comparison::parse(operator)
                        .ok_or_else(|| format!("unknown numeric operator '{}'", operator))?;
                    NumericOp::Compare(cmp, number_value(value, operator)?)
                };
                Ok(PredicateNode::Numeric {
                    field,
                    op,
                    treat_null_as,
                })
            }
            "string" => {
                let op = TextOp::parse(operator)
                    .ok_or_else(|| format!("unknown string operator '{}'", operator))?;
                let value = value
                    .as_str()
                    .ok_or_else(|| format!("string {} expects a string, got {}", operator, value))?;
                Ok(PredicateNode::Text {
                    field,
                    op,
                    value: value.to_string(),
                    treat_null_as,
                })
            }
            "array" => {
                let op = match operator {
                    "includes_any" => ArrayOp::IncludesAny(string_values(value, operator)?),
                    "includes_all" => ArrayOp::IncludesAll(string_values(value, operator)?),
                    "is_empty" => ArrayOp::IsEmpty,
                    "is_not_empty" => ArrayOp::IsNotEmpty,
                    other => return Err(format!("unknown array operator '{}'", other)),
                };
                Ok(PredicateNode::Array {
                    field,
                    op,
                    treat_null_as,
                })
            }
            "set" => {
                let negate = match operator {
                    "in" => false,
                    "not_in" => true,
                    other => return Err(format!("unknown set operator '{}'", other)),
                };
                let values = value
                    .as_array()
                    .ok_or_else(|| format!("set {} expects a list", operator))?
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => Ok(SetMember::Text(s.clone())),
                        Value::Number(n) => n
                            .as_f64()
                            .map(SetMember::Number)
                            .ok_or_else(|| format!("set member {} is not representable", n)),
                        other => Err(format!("set members must be strings or numbers, got {}", other)),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(PredicateNode::Set {
                    field,
                    negate,
                    values,
                    treat_null_as,
                })
            }
            other => Err(format!("unknown predicate type '{}'", other)),
        }
    }

    fn parse_combinator(key: &str, value: &Value) -> Result<PredicateNode, String> {
        match key {
            "not" => Ok(PredicateNode::Not(Box::new(Self::parse_node(value)))),
            _ => {
                let children: Vec<PredicateNode> = value
                    .as_array()
                    .ok_or_else(|| format!("'{}' expects a list of nodes", key))?
                    .iter()
                    .map(Self::parse_node)
                    .collect();
                Ok(if key == "all" {
                    PredicateNode::All(children)
                } else {
                    PredicateNode::Any(children)
                })
            }
        }
    }

    fn parse_presence(obj: &Map<String, Value>, operator: &str, value: &Value) -> Result<PredicateNode, String> {
        if let Some(field) = obj.get("field") {
            if field.as_str() != Some(CONDITIONS_FIELD) {
                return Err(format!("condition_presence field must be '{}'", CONDITIONS_FIELD));
            }
        }
        let require_all = match operator {
            "includes_any" => false,
            "includes_all" => true,
            other => return Err(format!("unknown condition_presence operator '{}'", other)),
        };
        Ok(PredicateNode::ConditionPresence {
            require_all,
            codes: string_values(value, operator)?,
        })
    }
}

fn parse_date_operator(operator: &str) -> Result<(ElapsedUnit, Comparison), String> {
    let unknown = || format!("unknown date operator '{}'", operator);
    let (unit, cmp) = operator.split_once("_since_").ok_or_else(unknown)?;
    let unit: ElapsedUnit = unit.parse().map_err(|_| unknown())?;
    let cmp = Comparison::parse(cmp)
        .filter(|c| *c != Comparison::Neq)
        .ok_or_else(unknown)?;
    Ok((unit, cmp))
}

fn number_value(value: &Value, operator: &str) -> Result<f64, String> {
    value
        .as_f64()
        .filter(|n| n.is_finite())
        .ok_or_else(|| format!("{} expects a number, got {}", operator, value))
}

fn string_values(value: &Value, operator: &str) -> Result<Vec<String>, String> {
    let items = value
        .as_array()
        .filter(|items| !items.is_empty())
        .ok_or_else(|| format!("{} expects a non-empty list of strings", operator))?;
    items
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| format!("{} expects strings, got {}", operator, v))
        })
        .collect()
}

// ============================================================================
// Serialization
// ============================================================================

impl PredicateNode {
    /// Renders the node back into its wire format
    pub fn to_json(&self) -> Value {
        fn leaf(kind: &str, field: &FieldRef, operator: &str, value: Value, policy: &NullPolicy) -> Value {
            let mut node = json!({
                "type": kind,
                "field": field.to_string(),
                "operator": operator,
            });
            if !value.is_null() {
                node["value"] = value;
            }
            if *policy != NullPolicy::Unknown {
                node["treatNullAs"] = json!(policy.as_str());
            }
            node
        }

        match self {
            PredicateNode::Always => json!({}),
            PredicateNode::All(children) => json!({ "all": children.iter().map(Self::to_json).collect::<Vec<_>>() }),
            PredicateNode::Any(children) => json!({ "any": children.iter().map(Self::to_json).collect::<Vec<_>>() }),
            PredicateNode::Not(child) => json!({ "not": child.to_json() }),
            PredicateNode::Date { field, unit, cmp, value, treat_null_as } => leaf(
                "date",
                field,
                &format!("{}_since_{}", unit, cmp.as_str()),
                json!(value),
                treat_null_as,
            ),
            PredicateNode::Boolean { field, negate, value, treat_null_as } => leaf(
                "boolean",
                field,
                if *negate { "neq" } else { "eq" },
                json!(value),
                treat_null_as,
            ),
            PredicateNode::Numeric { field, op, treat_null_as } => match op {
                NumericOp::Compare(cmp, v) => leaf("numeric", field, cmp.as_str(), json!(v), treat_null_as),
                NumericOp::Between(min, max) => leaf("numeric", field, "between", json!([min, max]), treat_null_as),
            },
            PredicateNode::Text { field, op, value, treat_null_as } => {
                leaf("string", field, op.as_str(), json!(value), treat_null_as)
            }
            PredicateNode::Array { field, op, treat_null_as } => {
                let (operator, value) = match op {
                    ArrayOp::IncludesAny(v) => ("includes_any", json!(v)),
                    ArrayOp::IncludesAll(v) => ("includes_all", json!(v)),
                    ArrayOp::IsEmpty => ("is_empty", Value::Null),
                    ArrayOp::IsNotEmpty => ("is_not_empty", Value::Null),
                };
                leaf("array", field, operator, value, treat_null_as)
            }
            PredicateNode::Set { field, negate, values, treat_null_as } => leaf(
                "set",
                field,
                if *negate { "not_in" } else { "in" },
                Value::Array(values.iter().map(SetMember::to_json).collect()),
                treat_null_as,
            ),
            PredicateNode::NullCheck { field, expect_null } => json!({
                "type": "null_check",
                "field": field.to_string(),
                "operator": if *expect_null { "is_null" } else { "is_not_null" },
            }),
            PredicateNode::ConditionPresence { require_all, codes } => json!({
                "type": "condition_presence",
                "field": CONDITIONS_FIELD,
                "operator": if *require_all { "includes_all" } else { "includes_any" },
                "value": codes,
            }),
            PredicateNode::Invalid { raw, .. } => raw.clone(),
        }
    }
}

impl Serialize for PredicateNode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PredicateNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(PredicateNode::from_json(&value))
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// Facts and clock for one evaluation
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub facts: &'a FactMap,
    /// Calendar date used as "now" by date operators
    pub as_of: NaiveDate,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(facts: &'a FactMap, as_of: NaiveDate) -> Self {
        Self { facts, as_of }
    }
}

/// What an evaluation could not decide, and why
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredicateTrace {
    /// Fact addresses that were absent when a leaf needed them
    pub missing_fields: Vec<String>,
    /// Malformed nodes and fact type mismatches
    pub issues: Vec<String>,
}

impl PredicateTrace {
    fn missing(&mut self, field: &FieldRef) -> Tristate {
        let field = field.to_string();
        if !self.missing_fields.contains(&field) {
            self.missing_fields.push(field);
        }
        Tristate::Unknown
    }

    fn issue(&mut self, issue: String) -> Tristate {
        self.issues.push(issue);
        Tristate::Unknown
    }

    fn mismatch(&mut self, kind: &str, field: &FieldRef, value: &FactValue) -> Tristate {
        self.issue(format!(
            "{} predicate on '{}' found a {} fact",
            kind,
            field,
            value.kind()
        ))
    }
}

impl PredicateNode {
    /// Evaluates the node against the facts in `ctx`
    pub fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Tristate {
        self.evaluate_traced(ctx, &mut PredicateTrace::default())
    }

    /// Evaluates the node, recording missing fields and malformed nodes
    ///
    /// Every child of a combinator is evaluated so the trace is complete.
    pub fn evaluate_traced(&self, ctx: &EvaluationContext<'_>, trace: &mut PredicateTrace) -> Tristate {
        match self {
            PredicateNode::Always => Tristate::True,
            PredicateNode::All(children) => children
                .iter()
                .map(|c| c.evaluate_traced(ctx, trace))
                .fold(Tristate::True, Tristate::and),
            PredicateNode::Any(children) => children
                .iter()
                .map(|c| c.evaluate_traced(ctx, trace))
                .fold(Tristate::False, Tristate::or),
            PredicateNode::Not(child) => !child.evaluate_traced(ctx, trace),
            PredicateNode::Invalid { reason, .. } => trace.issue(reason.clone()),
            PredicateNode::ConditionPresence { require_all, codes } => {
                let reported = |code: &String| ctx.facts.reports(code);
                Tristate::from(if *require_all {
                    codes.iter().all(reported)
                } else {
                    codes.iter().any(reported)
                })
            }
            PredicateNode::NullCheck { field, expect_null } => {
                Tristate::from(ctx.facts.lookup(field).is_none() == *expect_null)
            }
            PredicateNode::Date { field, treat_null_as, .. }
            | PredicateNode::Boolean { field, treat_null_as, .. }
            | PredicateNode::Numeric { field, treat_null_as, .. }
            | PredicateNode::Text { field, treat_null_as, .. }
            | PredicateNode::Array { field, treat_null_as, .. }
            | PredicateNode::Set { field, treat_null_as, .. } => {
                if *treat_null_as != NullPolicy::Unknown {
                    return trace.issue(format!(
                        "treatNullAs '{}' on '{}' is not supported",
                        treat_null_as.as_str(),
                        field
                    ));
                }
                match ctx.facts.lookup(field) {
                    None => trace.missing(field),
                    Some(value) => self.apply_leaf(field, value, ctx.as_of, trace),
                }
            }
        }
    }

    fn apply_leaf(&self, field: &FieldRef, value: &FactValue, as_of: NaiveDate, trace: &mut PredicateTrace) -> Tristate {
        match (self, value) {
            (PredicateNode::Date { unit, cmp, value: threshold, .. }, fact) => {
                let date = match fact {
                    FactValue::Date(d) => *d,
                    FactValue::Text(s) => match parse_calendar_date(s) {
                        Ok(d) => d,
                        Err(_) => {
                            return trace.issue(format!("'{}' is not a valid date: {}", field, s));
                        }
                    },
                    other => return trace.mismatch("date", field, other),
                };
                if date > as_of {
                    return trace.issue(format!("'{}' is after the as-of date: {}", field, date));
                }
                let elapsed = elapsed_between(date, as_of, *unit) as f64;
                Tristate::from(cmp.apply(elapsed, *threshold))
            }
            (PredicateNode::Boolean { negate, value: expected, .. }, FactValue::Bool(actual)) => {
                Tristate::from((actual == expected) != *negate)
            }
            (PredicateNode::Numeric { op, .. }, FactValue::Number(n)) => Tristate::from(match op {
                NumericOp::Compare(cmp, rhs) => cmp.apply(*n, *rhs),
                NumericOp::Between(min, max) => *n >= *min && *n <= *max,
            }),
            (PredicateNode::Text { op, value: expected, .. }, FactValue::Text(actual)) => {
                Tristate::from(match op {
                    TextOp::Eq => actual == expected,
                    TextOp::Neq => actual != expected,
                    TextOp::Contains => actual.contains(expected.as_str()),
                    TextOp::StartsWith => actual.starts_with(expected.as_str()),
                    TextOp::EndsWith => actual.ends_with(expected.as_str()),
                })
            }
            (PredicateNode::Array { op, .. }, FactValue::List(items)) => {
                let has = |v: &String| items.contains(v);
                Tristate::from(match op {
                    ArrayOp::IncludesAny(values) => values.iter().any(has),
                    ArrayOp::IncludesAll(values) => values.iter().all(has),
                    ArrayOp::IsEmpty => items.is_empty(),
                    ArrayOp::IsNotEmpty => !items.is_empty(),
                })
            }
            (PredicateNode::Set { negate, values, .. }, fact) => {
                let mut found = false;
                for member in values {
                    match member.matches(fact) {
                        Some(hit) => found |= hit,
                        None => return trace.mismatch("set", field, fact),
                    }
                }
                if values.is_empty() && !matches!(fact, FactValue::Text(_) | FactValue::Number(_)) {
                    return trace.mismatch("set", field, fact);
                }
                Tristate::from(found != *negate)
            }
            (node, fact) => trace.mismatch(node.kind(), field, fact),
        }
    }

    /// Wire name of the node kind
    pub fn kind(&self) -> &'static str {
        match self {
            PredicateNode::Always => "always",
            PredicateNode::All(_) => "all",
            PredicateNode::Any(_) => "any",
            PredicateNode::Not(_) => "not",
            PredicateNode::Date { .. } => "date",
            PredicateNode::Boolean { .. } => "boolean",
            PredicateNode::Numeric { .. } => "numeric",
            PredicateNode::Text { .. } => "string",
            PredicateNode::Array { .. } => "array",
            PredicateNode::Set { .. } => "set",
            PredicateNode::NullCheck { .. } => "null_check",
            PredicateNode::ConditionPresence { .. } => "condition_presence",
            PredicateNode::Invalid { .. } => "invalid",
        }
    }

    /// Whether the tree contains an uninterpretable node
    pub fn is_malformed(&self) -> bool {
        match self {
            PredicateNode::Invalid { .. } => true,
            PredicateNode::All(children) | PredicateNode::Any(children) => {
                children.iter().any(PredicateNode::is_malformed)
            }
            PredicateNode::Not(child) => child.is_malformed(),
            _ => false,
        }
    }
}

impl fmt::Display for PredicateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{ApplicantProfile, Fact};

    fn facts() -> FactMap {
        let mut facts = FactMap::new(ApplicantProfile::new(55));
        let mut diabetes = Fact::new();
        diabetes.insert("is_controlled", true);
        diabetes.insert("a1c_level", 6.5);
        diabetes.insert("complications", vec!["retinopathy".to_string()]);
        facts.insert_condition("diabetes", diabetes);
        facts
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn eval(node: Value) -> Tristate {
        let facts = facts();
        PredicateNode::from_json(&node).evaluate(&EvaluationContext::new(&facts, as_of()))
    }

    #[test]
    fn test_empty_node_matches() {
        assert_eq!(eval(json!({})), Tristate::True);
    }

    #[test]
    fn test_boolean_eq() {
        let node = json!({"type": "boolean", "field": "diabetes.is_controlled", "operator": "eq", "value": true});
        assert_eq!(eval(node), Tristate::True);
    }

    #[test]
    fn test_missing_fact_is_unknown() {
        let node = json!({"type": "boolean", "field": "diabetes.insulin_use", "operator": "eq", "value": false});
        assert_eq!(eval(node), Tristate::Unknown);
    }

    #[test]
    fn test_version_envelope_is_unwrapped() {
        let node = json!({"version": 2, "root": {"type": "numeric", "field": "diabetes.a1c_level", "operator": "lt", "value": 7}});
        assert_eq!(eval(node), Tristate::True);
    }

    #[test]
    fn test_unknown_operator_is_invalid() {
        let node = PredicateNode::from_json(&json!({"type": "boolean", "field": "diabetes.is_controlled", "operator": "gt", "value": true}));
        assert!(node.is_malformed());
    }

    #[test]
    fn test_type_mismatch_is_unknown_with_issue() {
        let facts = facts();
        let node = PredicateNode::from_json(&json!({"type": "boolean", "field": "diabetes.a1c_level", "operator": "eq", "value": true}));
        let mut trace = PredicateTrace::default();
        let result = node.evaluate_traced(&EvaluationContext::new(&facts, as_of()), &mut trace);
        assert_eq!(result, Tristate::Unknown);
        assert_eq!(trace.issues.len(), 1);
        assert!(trace.missing_fields.is_empty());
    }

    #[test]
    fn test_round_trip_preserves_wire_format() {
        let raw = json!({"type": "date", "field": "cancer.diagnosis_date", "operator": "years_since_gte", "value": 5.0});
        assert_eq!(PredicateNode::from_json(&raw).to_json(), raw);
    }
}
