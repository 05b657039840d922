//! Core Kernel - Foundational types for the underwriting system
//!
//! This crate provides the building blocks shared by the engine and its
//! surrounding adapters:
//! - Strongly-typed catalog and evaluation identifiers
//! - Calendar arithmetic for elapsed-time predicates
//! - Jurisdiction timezone handling

pub mod temporal;
pub mod identifiers;
pub mod error;

pub use temporal::{
    Timezone, TemporalError, ElapsedUnit,
    elapsed_between, years_since, parse_calendar_date,
};
pub use identifiers::{CarrierId, ProductId, RuleSetId, RuleId, EvaluationId};
pub use error::CoreError;
