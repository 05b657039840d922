//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! underwriting engine test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built answers, dates and rule catalogs
//! - `builders`: Builder patterns for rules, rule sets and answers
//! - `assertions`: Custom assertion helpers for decisions and facts
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
