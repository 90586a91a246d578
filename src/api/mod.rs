//! HTTP API module for the incentive engine.
//!
//! A stateless JSON adapter over the calculation functions. Every request
//! carries the records it needs; nothing is fetched or persisted.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    FormulaValidationRequest, IncentiveBatchRequest, IncentiveRequest, ScorecardRequest,
};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
