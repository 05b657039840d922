//! Underwriting Domain - Rule-driven eligibility decisions
//!
//! This crate turns an applicant's medical questionnaire answers into an
//! underwriting decision:
//! - **Fact Transformer** normalizes raw answers into typed facts
//! - **Predicate Evaluator** applies rule predicates with three-valued logic
//! - **Rule Resolver** picks the governing rule of each rule set
//! - **Decision Aggregator** combines conditions into one decision
//!
//! Missing information never silently passes or fails a rule. It evaluates
//! as unknown, and a condition whose rules are all unknown is referred for
//! manual review.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_underwriting::{EvaluationRequest, UnderwritingService};
//!
//! let service = UnderwritingService::new();
//! let decision = service.evaluate(&request, &rule_sets, as_of);
//! println!("{:?}", decision.eligibility());
//! ```

pub mod aggregator;
pub mod catalog;
pub mod diagnostics;
pub mod error;
pub mod facts;
pub mod normalize;
pub mod predicate;
pub mod resolver;
pub mod rules;
pub mod service;
pub mod transform;

pub use aggregator::{
    aggregate, AggregationConfig, ConditionOutcome, ConditionResolution, ConditionStatus, Decision,
    FlatExtraComposition, GoverningRule, SelectedOutcome,
};
pub use catalog::{CatalogError, InMemoryRuleCatalog, RuleCatalog, RuleSetQuery};
pub use diagnostics::Diagnostic;
pub use error::UnderwritingError;
pub use facts::{
    ApplicantProfile, ConditionAnswer, Fact, FactMap, FactValue, FieldRef, Gender, ResponseValue, Responses,
};
pub use predicate::{EvaluationContext, PredicateNode, PredicateTrace, Tristate};
pub use resolver::{resolve, resolve_rule_set, Resolution, ResolvedOutcome, RuleResult, RuleVerdict};
pub use rules::{Eligibility, FlatExtra, Rule, RuleSet, RuleSetScope, TableRating};
pub use service::{EvaluationRequest, UnderwritingService};
pub use transform::{ConditionTransform, IdentityTransform, TransformContext, TransformOutput, TransformRegistry};
