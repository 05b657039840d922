//! Rule catalog port
//!
//! The engine never talks to storage directly. Rule sets are fetched through
//! [`RuleCatalog`] and copied into plain structs before evaluation starts.
//!
//! # Example
//!
//! ```rust,ignore
//! let catalog = InMemoryRuleCatalog::from_file(Path::new("rules/catalog.json"))?;
//! let rule_sets = catalog.rule_sets(&RuleSetQuery::for_carrier(carrier_id)).await?;
//! ```

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use core_kernel::{CarrierId, ProductId, RuleSetId};

use crate::rules::{FlatExtra, RuleSet, RuleSetScope, DEFAULT_VARIANT};

/// Errors raised while loading or querying a rule catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog file could not be read
    #[error("Failed to read rule catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Catalog JSON could not be parsed
    #[error("Failed to parse rule catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two rule sets share an identifier
    #[error("Duplicate rule set id: {0}")]
    DuplicateRuleSet(RuleSetId),

    /// A rule set is structurally unusable
    #[error("Invalid rule set {id}: {reason}")]
    InvalidRuleSet { id: RuleSetId, reason: String },
}

/// Selects the rule sets that apply to one application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSetQuery {
    pub carrier_id: CarrierId,
    /// Product-specific sets plus sets with no product
    pub product_id: Option<ProductId>,
    /// Defaults to `"default"`
    pub variant: Option<String>,
}

impl RuleSetQuery {
    pub fn for_carrier(carrier_id: CarrierId) -> Self {
        Self {
            carrier_id,
            product_id: None,
            variant: None,
        }
    }

    pub fn with_product(mut self, product_id: ProductId) -> Self {
        self.product_id = Some(product_id);
        self
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    /// Whether a rule set applies to this query
    pub fn matches(&self, rule_set: &RuleSet) -> bool {
        let variant = self.variant.as_deref().unwrap_or(DEFAULT_VARIANT);
        rule_set.carrier_id == self.carrier_id
            && rule_set.variant == variant
            && match (rule_set.product_id, self.product_id) {
                (None, _) => true,
                (Some(set_product), Some(wanted)) => set_product == wanted,
                (Some(_), None) => false,
            }
    }
}

/// Source of approved rule sets
#[async_trait]
pub trait RuleCatalog: Send + Sync {
    /// Returns matching rule sets in catalog order
    async fn rule_sets(&self, query: &RuleSetQuery) -> Result<Vec<RuleSet>, CatalogError>;

    /// Returns every rule set for a carrier, regardless of product or variant
    async fn carrier_rule_sets(&self, carrier_id: CarrierId) -> Result<Vec<RuleSet>, CatalogError>;
}

/// Rule catalog held in memory, loaded from a JSON array of rule sets
#[derive(Debug, Default)]
pub struct InMemoryRuleCatalog {
    rule_sets: RwLock<Vec<RuleSet>>,
}

impl InMemoryRuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from already-parsed rule sets
    pub fn with_rule_sets(rule_sets: Vec<RuleSet>) -> Result<Self, CatalogError> {
        validate(&rule_sets)?;
        Ok(Self {
            rule_sets: RwLock::new(rule_sets),
        })
    }

    /// Parses a JSON array of rule sets
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let rule_sets: Vec<RuleSet> = serde_json::from_str(json)?;
        let malformed = rule_sets
            .iter()
            .flat_map(|set| set.rules.iter())
            .filter(|rule| rule.predicate.is_malformed())
            .count();
        info!(
            rule_sets = rule_sets.len(),
            malformed_predicates = malformed,
            "Loaded rule catalog"
        );
        Self::with_rule_sets(rule_sets)
    }

    /// Reads and parses a catalog file
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Adds a rule set at the end of the catalog
    pub async fn insert(&self, rule_set: RuleSet) -> Result<(), CatalogError> {
        let mut rule_sets = self.rule_sets.write().await;
        if rule_sets.iter().any(|s| s.id == rule_set.id) {
            return Err(CatalogError::DuplicateRuleSet(rule_set.id));
        }
        validate(std::slice::from_ref(&rule_set))?;
        rule_sets.push(rule_set);
        Ok(())
    }

    /// Snapshot of every rule set
    pub async fn all(&self) -> Vec<RuleSet> {
        self.rule_sets.read().await.clone()
    }
}

fn validate(rule_sets: &[RuleSet]) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for set in rule_sets {
        if !seen.insert(set.id) {
            return Err(CatalogError::DuplicateRuleSet(set.id));
        }
        if set.scope == RuleSetScope::Condition && set.condition_code.as_deref().map_or(true, str::is_empty) {
            return Err(CatalogError::InvalidRuleSet {
                id: set.id,
                reason: "condition-scoped rule set has no condition_code".to_string(),
            });
        }
        if let Some(rule) = set
            .rules
            .iter()
            .find(|rule| rule.flat_extra().is_some_and(|extra| !extra.is_within_bounds()))
        {
            return Err(CatalogError::InvalidRuleSet {
                id: set.id,
                reason: format!(
                    "rule '{}' has a flat extra outside 0..={} per thousand",
                    rule.name,
                    FlatExtra::MAX_PER_THOUSAND
                ),
            });
        }
    }
    Ok(())
}

#[async_trait]
impl RuleCatalog for InMemoryRuleCatalog {
    #[instrument(skip(self), fields(carrier_id = %query.carrier_id))]
    async fn rule_sets(&self, query: &RuleSetQuery) -> Result<Vec<RuleSet>, CatalogError> {
        let matched: Vec<RuleSet> = self
            .rule_sets
            .read()
            .await
            .iter()
            .filter(|set| query.matches(set))
            .cloned()
            .collect();
        debug!(count = matched.len(), "Fetched rule sets");
        Ok(matched)
    }

    async fn carrier_rule_sets(&self, carrier_id: CarrierId) -> Result<Vec<RuleSet>, CatalogError> {
        Ok(self
            .rule_sets
            .read()
            .await
            .iter()
            .filter(|set| set.carrier_id == carrier_id)
            .cloned()
            .collect())
    }
}
