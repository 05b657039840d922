//! Underwriting handlers

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use domain_underwriting::Decision;
use tracing::{field, instrument, Span};
use validator::Validate;

use crate::dto::underwriting::*;
use crate::{error::ApiError, AppState};

/// Evaluates one application against the carrier's rule sets
///
/// Bodies that are not a well-formed request are rejected with 400.
#[instrument(skip_all, fields(carrier_id = field::Empty))]
pub async fn evaluate(
    State(state): State<AppState>,
    payload: Result<Json<EvaluateRequest>, JsonRejection>,
) -> Result<Json<Decision>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    request.validate()?;
    Span::current().record("carrier_id", field::display(request.carrier_id));

    let query = request.query();
    let as_of = request
        .as_of
        .unwrap_or_else(|| state.config.timezone.today());
    let evaluation = request.into_evaluation();

    let decision = state
        .service
        .evaluate_with_catalog(state.catalog.as_ref(), &query, &evaluation, as_of)
        .await?;

    Ok(Json(decision))
}

/// Lists the rule sets loaded for a carrier
pub async fn list_rule_sets(
    State(state): State<AppState>,
    Query(query): Query<RuleSetListQuery>,
) -> Result<Json<Vec<RuleSetSummary>>, ApiError> {
    let rule_sets = state.catalog.carrier_rule_sets(query.carrier_id).await?;
    Ok(Json(rule_sets.iter().map(RuleSetSummary::from).collect()))
}
