//! Rule catalog model
//!
//! Rule sets are authored outside the engine and loaded as JSON. The field
//! names below are the catalog's wire names.

use core_kernel::{CarrierId, ProductId, RuleId, RuleSetId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::facts::Gender;
use crate::predicate::PredicateNode;

/// Default rule set variant
pub const DEFAULT_VARIANT: &str = "default";

/// Eligibility outcome of a rule
///
/// Ordered by severity: `Eligible < Refer < Ineligible`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    Eligible,
    Refer,
    Ineligible,
}

impl Eligibility {
    /// Severity rank, higher is more restrictive
    pub fn severity(&self) -> u8 {
        match self {
            Eligibility::Eligible => 0,
            Eligibility::Refer => 1,
            Eligibility::Ineligible => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Eligibility::Eligible => "eligible",
            Eligibility::Refer => "refer",
            Eligibility::Ineligible => "ineligible",
        }
    }
}

impl PartialOrd for Eligibility {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Eligibility {
    fn cmp(&self, other: &Self) -> Ordering {
        self.severity().cmp(&other.severity())
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Substandard table rating, `A` (table 1) through `P` (table 16)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TableRating {
    #[default]
    None,
    Table(u8),
}

impl TableRating {
    pub const MAX_TABLE: u8 = 16;

    /// Table number, 0 when unrated
    pub fn units(&self) -> u8 {
        match self {
            TableRating::None => 0,
            TableRating::Table(n) => *n,
        }
    }

    pub fn letter(&self) -> Option<char> {
        match self {
            TableRating::None => None,
            TableRating::Table(n) => Some(char::from(b'A' + n - 1)),
        }
    }
}

impl fmt::Display for TableRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.letter() {
            Some(letter) => write!(f, "{}", letter),
            None => f.write_str("none"),
        }
    }
}

impl FromStr for TableRating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            return Ok(TableRating::None);
        }
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => {
                let n = c.to_ascii_uppercase() as u8 - b'A' + 1;
                if n <= Self::MAX_TABLE {
                    Ok(TableRating::Table(n))
                } else {
                    Err(format!("table rating '{}' is beyond P", s))
                }
            }
            _ => Err(format!("invalid table rating '{}'", s)),
        }
    }
}

impl Serialize for TableRating {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TableRating {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            None => Ok(TableRating::None),
            Some(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Flat extra premium per thousand of coverage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatExtra {
    pub per_thousand: Decimal,
    /// Duration in years; `None` when the rule does not say
    pub years: Option<u32>,
}

impl FlatExtra {
    /// Largest per-thousand amount a catalog may carry
    pub const MAX_PER_THOUSAND: Decimal = dec!(1000);

    /// Whether the amount is non-negative and at most [`Self::MAX_PER_THOUSAND`]
    pub fn is_within_bounds(&self) -> bool {
        !self.per_thousand.is_sign_negative() && self.per_thousand <= Self::MAX_PER_THOUSAND
    }

    /// Duration used when composing, 1 year when unspecified
    pub fn effective_years(&self) -> u32 {
        self.years.unwrap_or(1)
    }

    /// Per-thousand amount multiplied by duration, saturating at `Decimal::MAX`
    pub fn total_cost(&self) -> Decimal {
        self.per_thousand
            .checked_mul(Decimal::from(self.effective_years()))
            .unwrap_or(Decimal::MAX)
    }
}

/// One underwriting rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub name: String,
    /// Higher wins
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub predicate: PredicateNode,
    #[serde(default = "default_predicate_version")]
    pub predicate_version: u32,
    pub outcome_eligibility: Eligibility,
    #[serde(default)]
    pub outcome_health_class: Option<String>,
    #[serde(default)]
    pub outcome_table_rating: TableRating,
    #[serde(default)]
    pub outcome_reason: Option<String>,
    #[serde(default)]
    pub outcome_concerns: Vec<String>,
    #[serde(default)]
    pub outcome_flat_extra_per_thousand: Option<Decimal>,
    #[serde(default)]
    pub outcome_flat_extra_years: Option<u32>,
    /// Inclusive applicant age band
    #[serde(default)]
    pub age_band_min: Option<u32>,
    #[serde(default)]
    pub age_band_max: Option<u32>,
    #[serde(default)]
    pub gender: Option<Gender>,
}

fn default_predicate_version() -> u32 {
    1
}

impl Rule {
    /// Creates an unconditional rule with the given outcome
    pub fn new(name: impl Into<String>, priority: i32, eligibility: Eligibility) -> Self {
        Self {
            id: RuleId::new(),
            name: name.into(),
            priority,
            predicate: PredicateNode::Always,
            predicate_version: default_predicate_version(),
            outcome_eligibility: eligibility,
            outcome_health_class: None,
            outcome_table_rating: TableRating::None,
            outcome_reason: None,
            outcome_concerns: Vec::new(),
            outcome_flat_extra_per_thousand: None,
            outcome_flat_extra_years: None,
            age_band_min: None,
            age_band_max: None,
            gender: None,
        }
    }

    /// Flat extra carried by the rule, if any
    pub fn flat_extra(&self) -> Option<FlatExtra> {
        self.outcome_flat_extra_per_thousand.map(|per_thousand| FlatExtra {
            per_thousand,
            years: self.outcome_flat_extra_years,
        })
    }

    /// Whether the applicant's age falls inside the rule's age band
    pub fn covers_age(&self, age: u32) -> bool {
        self.age_band_min.map_or(true, |min| age >= min) && self.age_band_max.map_or(true, |max| age <= max)
    }
}

/// Whether a rule set covers one condition or the whole application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSetScope {
    #[default]
    Condition,
    Global,
}

/// An ordered, versioned collection of rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub id: RuleSetId,
    pub carrier_id: CarrierId,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub scope: RuleSetScope,
    /// Condition covered by a condition-scoped set
    #[serde(default)]
    pub condition_code: Option<String>,
    #[serde(default = "default_variant")]
    pub variant: String,
    pub name: String,
    #[serde(default = "default_version")]
    pub version: u32,
    /// Declaration order breaks priority ties
    #[serde(default)]
    pub rules: Vec<Rule>,
}

fn default_variant() -> String {
    DEFAULT_VARIANT.to_string()
}

fn default_version() -> u32 {
    1
}

impl RuleSet {
    /// Creates an empty condition-scoped rule set
    pub fn for_condition(carrier_id: CarrierId, condition_code: impl Into<String>, version: u32) -> Self {
        let condition_code = condition_code.into();
        Self {
            id: RuleSetId::new(),
            carrier_id,
            product_id: None,
            scope: RuleSetScope::Condition,
            name: format!("{} rules", condition_code),
            condition_code: Some(condition_code),
            variant: default_variant(),
            version,
            rules: Vec::new(),
        }
    }

    /// Creates an empty global rule set
    pub fn global(carrier_id: CarrierId, name: impl Into<String>, version: u32) -> Self {
        Self {
            id: RuleSetId::new(),
            carrier_id,
            product_id: None,
            scope: RuleSetScope::Global,
            condition_code: None,
            variant: default_variant(),
            name: name.into(),
            version,
            rules: Vec::new(),
        }
    }

    /// Whether the set governs the given condition
    pub fn covers(&self, condition_code: &str) -> bool {
        self.scope == RuleSetScope::Condition && self.condition_code.as_deref() == Some(condition_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eligibility_severity_order() {
        assert!(Eligibility::Ineligible > Eligibility::Refer);
        assert!(Eligibility::Refer > Eligibility::Eligible);
        assert_eq!(
            [Eligibility::Refer, Eligibility::Ineligible, Eligibility::Eligible]
                .into_iter()
                .max(),
            Some(Eligibility::Ineligible)
        );
    }

    #[test]
    fn test_table_rating_parsing() {
        assert_eq!("none".parse::<TableRating>(), Ok(TableRating::None));
        assert_eq!("A".parse::<TableRating>(), Ok(TableRating::Table(1)));
        assert_eq!("p".parse::<TableRating>(), Ok(TableRating::Table(16)));
        assert!("Q".parse::<TableRating>().is_err());
        assert!("AB".parse::<TableRating>().is_err());
        assert_eq!(TableRating::Table(4).to_string(), "D");
    }

    #[test]
    fn test_flat_extra_defaults_to_one_year() {
        let extra = FlatExtra {
            per_thousand: dec!(2.50),
            years: None,
        };
        assert_eq!(extra.total_cost(), dec!(2.50));
    }

    #[test]
    fn test_rule_deserializes_with_defaults() {
        let rule: Rule = serde_json::from_value(serde_json::json!({
            "id": "018f2c5e-7d1a-7b3c-9a4e-1f2d3c4b5a69",
            "name": "Controlled diabetes",
            "predicate": {"type": "boolean", "field": "diabetes.is_controlled", "operator": "eq", "value": true},
            "outcome_eligibility": "eligible",
            "outcome_table_rating": "B",
            "outcome_flat_extra_per_thousand": "2.5"
        }))
        .unwrap();

        assert_eq!(rule.priority, 0);
        assert_eq!(rule.predicate_version, 1);
        assert_eq!(rule.outcome_table_rating, TableRating::Table(2));
        assert!(rule.outcome_concerns.is_empty());
        assert_eq!(rule.flat_extra().map(|f| f.per_thousand), Some(dec!(2.5)));
    }

    #[test]
    fn test_age_band_is_inclusive() {
        let mut rule = Rule::new("Band", 1, Eligibility::Eligible);
        rule.age_band_min = Some(18);
        rule.age_band_max = Some(60);
        assert!(rule.covers_age(18));
        assert!(rule.covers_age(60));
        assert!(!rule.covers_age(61));
    }
}
