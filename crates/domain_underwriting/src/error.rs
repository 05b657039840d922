//! Underwriting domain errors
//!
//! Evaluation itself never fails: missing facts, malformed predicates and
//! uncovered conditions all become diagnostics on the `Decision`. These
//! errors cover the surrounding plumbing.

use thiserror::Error;

use crate::catalog::CatalogError;

/// Errors that can occur around an evaluation
#[derive(Debug, Error)]
pub enum UnderwritingError {
    /// Rule catalog could not be loaded or queried
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
