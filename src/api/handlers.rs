//! HTTP request handlers for the incentive engine API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{
    IncentiveInput, calculate_driver_incentive_with, run_batch, score_employee,
    validate_formula, validate_incentive_input, validate_scorecard_input,
};
use crate::config::{ConfigLoader, validate_fuel_config, validate_scoring_rules};
use crate::error::EngineError;
use crate::models::{AuditWarning, IncentiveResult};

use super::request::{
    FormulaValidationRequest, IncentiveBatchRequest, IncentiveRequest, ScorecardRequest,
};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/incentives/calculate", post(calculate_incentive_handler))
        .route("/incentives/batch", post(incentive_batch_handler))
        .route("/scorecards/score", post(score_scorecard_handler))
        .route("/formulas/validate", post(validate_formula_handler))
        .with_state(state)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

fn error_response(error: EngineError) -> Response {
    let api_error: ApiErrorResponse = error.into();
    json_response(api_error.status, api_error.error)
}

fn rejection_response(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // The body text carries serde's description of the problem
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    json_response(StatusCode::BAD_REQUEST, error)
}

/// Converts a request into calculator input, validating any fuel tiers it
/// carries. Issues with those tiers are returned as warnings.
fn prepare_incentive(
    request: IncentiveRequest,
    config: &ConfigLoader,
) -> (IncentiveInput, Vec<AuditWarning>) {
    let mut input = request.into_input(config.formulas());
    let mut warnings = Vec::new();
    if let Some(fuel_config) = input.fuel_config.take() {
        let label = input.driver.driver_type.as_str();
        let (cleaned, fuel_warnings) = validate_fuel_config(label, fuel_config);
        input.fuel_config = Some(cleaned);
        warnings = fuel_warnings;
    }
    (input, warnings)
}

fn calculate_prepared(
    input: &IncentiveInput,
    request_warnings: &[AuditWarning],
    config: &ConfigLoader,
) -> IncentiveResult {
    let mut result = calculate_driver_incentive_with(input, config.fuel_tiers());
    result
        .audit_trace
        .warnings
        .extend(request_warnings.iter().cloned());
    result
}

/// Handler for POST /incentives/calculate.
///
/// Calculates one driver-month and returns the [`IncentiveResult`].
async fn calculate_incentive_handler(
    State(state): State<AppState>,
    payload: Result<Json<IncentiveRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing incentive request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let config = state.config();
    let (input, request_warnings) = prepare_incentive(request, config);
    if let Err(err) = validate_incentive_input(&input) {
        warn!(
            correlation_id = %correlation_id,
            error = %err,
            "Incentive request rejected"
        );
        return error_response(err);
    }

    let start_time = Instant::now();
    let result = calculate_prepared(&input, &request_warnings, config);
    info!(
        correlation_id = %correlation_id,
        driver_id = %result.driver_id,
        total_incentive = %result.total_incentive,
        warnings = result.audit_trace.warnings.len(),
        duration_us = start_time.elapsed().as_micros(),
        "Incentive calculated"
    );

    json_response(StatusCode::OK, result)
}

/// Handler for POST /incentives/batch.
///
/// Calculates every item independently. Items that fail validation are
/// listed as failures and the rest are still calculated.
async fn incentive_batch_handler(
    State(state): State<AppState>,
    payload: Result<Json<IncentiveBatchRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing incentive batch request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let config = state.config();
    let prepared: Vec<(IncentiveInput, Vec<AuditWarning>)> = request
        .items
        .into_iter()
        .map(|item| prepare_incentive(item, config))
        .collect();

    let start_time = Instant::now();
    let outcome = run_batch(
        &prepared,
        |(input, _)| input.driver.id.clone(),
        |(input, request_warnings)| {
            validate_incentive_input(input)?;
            Ok(calculate_prepared(input, request_warnings, config))
        },
    );
    info!(
        correlation_id = %correlation_id,
        succeeded = outcome.succeeded(),
        failed = outcome.failed(),
        duration_us = start_time.elapsed().as_micros(),
        "Incentive batch calculated"
    );

    json_response(StatusCode::OK, outcome)
}

/// Handler for POST /scorecards/score.
///
/// Scores one employee-month. Scoring rules supplied in the request are
/// validated first; otherwise the configured table is used.
async fn score_scorecard_handler(
    State(state): State<AppState>,
    payload: Result<Json<ScorecardRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing scorecard request");

    let mut request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let (scoring_rules, rule_warnings) = match request.scoring_rules.take() {
        Some(rules) => validate_scoring_rules(rules),
        None => (state.config().scoring_rules().to_vec(), Vec::new()),
    };
    let input = request.into_input(scoring_rules);
    if let Err(err) = validate_scorecard_input(&input) {
        warn!(
            correlation_id = %correlation_id,
            error = %err,
            "Scorecard request rejected"
        );
        return error_response(err);
    }

    let mut result = score_employee(&input);
    result.warnings.extend(rule_warnings);
    info!(
        correlation_id = %correlation_id,
        employee_id = %result.employee_id,
        total_weighted_score = %result.total_weighted_score,
        rating = %result.rating,
        "Scorecard scored"
    );

    json_response(StatusCode::OK, result)
}

/// Handler for POST /formulas/validate.
///
/// Parses an expression without evaluating it and reports the variables it
/// uses. Standing formula keys count as known variables.
async fn validate_formula_handler(
    State(state): State<AppState>,
    payload: Result<Json<FormulaValidationRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let known: Vec<&str> = state
        .config()
        .formulas()
        .iter()
        .map(|f| f.key.as_str())
        .chain(request.known_keys.iter().map(String::as_str))
        .collect();

    match validate_formula(&request.expression, &known) {
        Ok(check) => json_response(StatusCode::OK, check),
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "Formula rejected"
            );
            error_response(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::FormulaCheck;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        let config = ConfigLoader::load("./config/fleet").expect("Failed to load config");
        AppState::new(config)
    }

    async fn post(uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let router = create_router(create_test_state());
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("Content-Type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_validate_formula_reports_variables() {
        let (status, body) = post(
            "/formulas/validate",
            r#"{"expression": "safety_bonus + actual_km * trip_rate"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let check: FormulaCheck = serde_json::from_value(body).unwrap();
        assert_eq!(check.variables, vec!["actual_km", "safety_bonus", "trip_rate"]);
        assert_eq!(check.unknown_variables, vec!["trip_rate"]);
    }

    #[tokio::test]
    async fn test_validate_formula_known_keys_from_request() {
        let (status, body) = post(
            "/formulas/validate",
            r#"{"expression": "trip_rate * 2", "known_keys": ["trip_rate"]}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["unknown_variables"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_validate_formula_syntax_error_returns_400() {
        let (status, body) = post("/formulas/validate", r#"{"expression": "actual_km / /"}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_FORMULA");
        assert!(body["details"].as_str().unwrap().contains("position 12"));
    }

    #[tokio::test]
    async fn test_malformed_json_returns_400() {
        let (status, body) = post("/incentives/calculate", "{invalid json").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MALFORMED_JSON");
    }

    #[tokio::test]
    async fn test_missing_field_returns_validation_error() {
        let (status, body) = post("/scorecards/score", r#"{"employee_id": "emp_001"}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["message"].as_str().unwrap().contains("missing field"));
    }

    #[test]
    fn test_prepare_incentive_validates_supplied_tiers() {
        let request: IncentiveRequest = serde_json::from_str(
            r#"{
                "driver": {"id": "drv_001", "driver_type": "export", "base_salary": "5000"},
                "performance": {
                    "driver_id": "drv_001",
                    "year": 2025,
                    "month": 3,
                    "actual_kilometers": "3200"
                },
                "divisor": "10",
                "fuel_config": {
                    "tiers": [
                        {"min_efficiency": "2.0", "max_efficiency": "1.0", "bonus_amount": "5"},
                        {"min_efficiency": "1.0", "max_efficiency": "3.0", "bonus_amount": "15"}
                    ]
                }
            }"#,
        )
        .unwrap();

        let (input, warnings) = prepare_incentive(request, &ConfigLoader::default());

        let fuel_config = input.fuel_config.unwrap();
        assert_eq!(fuel_config.tiers.len(), 1);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("fuel_tiers.export[0]"));
    }
}
