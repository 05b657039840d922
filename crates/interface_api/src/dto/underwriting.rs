//! Underwriting DTOs

use chrono::NaiveDate;
use core_kernel::{CarrierId, ProductId, RuleSetId};
use domain_underwriting::{
    ApplicantProfile, ConditionAnswer, EvaluationRequest, Gender, RuleSet, RuleSetQuery, RuleSetScope,
};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Deserialize, Validate)]
pub struct EvaluateRequest {
    pub carrier_id: CarrierId,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    #[validate(length(min = 1, max = 64))]
    pub variant: Option<String>,
    /// Replays an evaluation as of a past date instead of today
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    #[validate(nested)]
    pub applicant: ApplicantRequest,
    #[serde(default)]
    #[validate(custom(function = "validate_conditions"))]
    pub conditions: Vec<ConditionAnswer>,
}

impl EvaluateRequest {
    pub fn query(&self) -> RuleSetQuery {
        let mut query = RuleSetQuery::for_carrier(self.carrier_id);
        if let Some(product_id) = self.product_id {
            query = query.with_product(product_id);
        }
        if let Some(variant) = &self.variant {
            query = query.with_variant(variant.clone());
        }
        query
    }

    pub fn into_evaluation(self) -> EvaluationRequest {
        EvaluationRequest {
            applicant: self.applicant.into(),
            conditions: self.conditions,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ApplicantRequest {
    #[validate(range(max = 120))]
    pub age: u32,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub tobacco: Option<bool>,
    #[serde(default)]
    #[validate(range(min = 5.0, max = 150.0))]
    pub bmi: Option<f64>,
    /// Two-letter state or province code
    #[serde(default)]
    #[validate(length(equal = 2))]
    pub state: Option<String>,
}

impl From<ApplicantRequest> for ApplicantProfile {
    fn from(request: ApplicantRequest) -> Self {
        ApplicantProfile {
            age: request.age,
            gender: request.gender,
            tobacco: request.tobacco,
            bmi: request.bmi,
            state: request.state,
        }
    }
}

fn validate_conditions(conditions: &[ConditionAnswer]) -> Result<(), ValidationError> {
    if conditions.iter().any(|c| c.condition_code.trim().is_empty()) {
        return Err(ValidationError::new("empty_condition_code"));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct RuleSetListQuery {
    pub carrier_id: CarrierId,
}

#[derive(Debug, Serialize)]
pub struct RuleSetSummary {
    pub id: RuleSetId,
    pub carrier_id: CarrierId,
    pub product_id: Option<ProductId>,
    pub scope: RuleSetScope,
    pub condition_code: Option<String>,
    pub variant: String,
    pub name: String,
    pub version: u32,
    pub rule_count: usize,
    /// Rules whose predicate failed to parse
    pub malformed_rules: usize,
}

impl From<&RuleSet> for RuleSetSummary {
    fn from(set: &RuleSet) -> Self {
        Self {
            id: set.id,
            carrier_id: set.carrier_id,
            product_id: set.product_id,
            scope: set.scope,
            condition_code: set.condition_code.clone(),
            variant: set.variant.clone(),
            name: set.name.clone(),
            version: set.version,
            rule_count: set.rules.len(),
            malformed_rules: set.rules.iter().filter(|r| r.predicate.is_malformed()).count(),
        }
    }
}
