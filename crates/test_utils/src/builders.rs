//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible defaults.
//! These builders allow tests to specify only the relevant fields while using
//! defaults for everything else.

use core_kernel::{CarrierId, ProductId, RuleId};
use domain_underwriting::{
    ConditionAnswer, Eligibility, Gender, PredicateNode, ResponseValue, Responses, Rule, RuleSet,
    RuleSetScope, TableRating,
};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::fixtures::IdFixtures;

/// Builder for constructing test rules
pub struct RuleBuilder {
    rule: Rule,
}

impl RuleBuilder {
    /// Creates an unconditional eligible rule with priority 0
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            rule: Rule::new(name, 0, Eligibility::Eligible),
        }
    }

    /// Sets the rule ID
    pub fn with_id(mut self, id: RuleId) -> Self {
        self.rule.id = id;
        self
    }

    /// Sets the priority
    pub fn priority(mut self, priority: i32) -> Self {
        self.rule.priority = priority;
        self
    }

    /// Sets the predicate from its JSON form
    pub fn when(mut self, predicate: Value) -> Self {
        self.rule.predicate = PredicateNode::from_json(&predicate);
        self
    }

    /// Sets the eligibility outcome
    pub fn outcome(mut self, eligibility: Eligibility) -> Self {
        self.rule.outcome_eligibility = eligibility;
        self
    }

    /// Shorthand for an eligible outcome with a health class
    pub fn eligible(self, health_class: impl Into<String>) -> Self {
        self.outcome(Eligibility::Eligible).health_class(health_class)
    }

    /// Shorthand for an ineligible outcome with a reason
    pub fn ineligible(self, reason: impl Into<String>) -> Self {
        self.outcome(Eligibility::Ineligible).reason(reason)
    }

    /// Shorthand for a refer outcome with a reason
    pub fn refer(self, reason: impl Into<String>) -> Self {
        self.outcome(Eligibility::Refer).reason(reason)
    }

    /// Sets the health class
    pub fn health_class(mut self, health_class: impl Into<String>) -> Self {
        self.rule.outcome_health_class = Some(health_class.into());
        self
    }

    /// Sets the table rating
    pub fn table(mut self, rating: TableRating) -> Self {
        self.rule.outcome_table_rating = rating;
        self
    }

    /// Sets the reason text
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.rule.outcome_reason = Some(reason.into());
        self
    }

    /// Adds a concern
    pub fn concern(mut self, concern: impl Into<String>) -> Self {
        self.rule.outcome_concerns.push(concern.into());
        self
    }

    /// Sets a flat extra
    pub fn flat_extra(mut self, per_thousand: Decimal, years: Option<u32>) -> Self {
        self.rule.outcome_flat_extra_per_thousand = Some(per_thousand);
        self.rule.outcome_flat_extra_years = years;
        self
    }

    /// Restricts the rule to an inclusive age band
    pub fn ages(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.rule.age_band_min = min;
        self.rule.age_band_max = max;
        self
    }

    /// Restricts the rule to one gender
    pub fn gender(mut self, gender: Gender) -> Self {
        self.rule.gender = Some(gender);
        self
    }

    /// Builds the rule
    pub fn build(self) -> Rule {
        self.rule
    }
}

/// Builder for constructing test rule sets
pub struct RuleSetBuilder {
    rule_set: RuleSet,
}

impl RuleSetBuilder {
    /// Creates a version-1 rule set for a condition under the fixture carrier
    pub fn for_condition(condition_code: impl Into<String>) -> Self {
        Self {
            rule_set: RuleSet::for_condition(IdFixtures::carrier_id(), condition_code, 1),
        }
    }

    /// Creates a version-1 global rule set under the fixture carrier
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            rule_set: RuleSet::global(IdFixtures::carrier_id(), name, 1),
        }
    }

    /// Sets the carrier
    pub fn carrier(mut self, carrier_id: CarrierId) -> Self {
        self.rule_set.carrier_id = carrier_id;
        self
    }

    /// Sets the product
    pub fn product(mut self, product_id: ProductId) -> Self {
        self.rule_set.product_id = Some(product_id);
        self
    }

    /// Sets the version
    pub fn version(mut self, version: u32) -> Self {
        self.rule_set.version = version;
        self
    }

    /// Sets the variant
    pub fn variant(mut self, variant: impl Into<String>) -> Self {
        self.rule_set.variant = variant.into();
        self
    }

    /// Appends a rule
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rule_set.rules.push(rule);
        self
    }

    /// Builds the rule set
    pub fn build(self) -> RuleSet {
        debug_assert!(
            self.rule_set.scope == RuleSetScope::Global || self.rule_set.condition_code.is_some()
        );
        self.rule_set
    }
}

/// Builder for constructing questionnaire answers
pub struct ConditionAnswerBuilder {
    condition_code: String,
    responses: Responses,
}

impl ConditionAnswerBuilder {
    /// Creates an empty answer for a condition
    pub fn new(condition_code: impl Into<String>) -> Self {
        Self {
            condition_code: condition_code.into(),
            responses: Responses::new(),
        }
    }

    /// Sets one answer field
    pub fn answer(mut self, field: impl Into<String>, value: impl Into<ResponseValue>) -> Self {
        self.responses.insert(field.into(), value.into());
        self
    }

    /// Sets a multi-select answer field
    pub fn labels<I, S>(mut self, field: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.responses.insert(field.into(), ResponseValue::labels(labels));
        self
    }

    /// Builds the answer
    pub fn build(self) -> ConditionAnswer {
        ConditionAnswer::new(self.condition_code, self.responses)
    }
}
