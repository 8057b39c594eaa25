//! Request body and query-string helpers.
//!
//! Handlers take `Result<Json<T>, JsonRejection>` (or `Query`) instead of the
//! bare extractor so that a malformed registration or a non-numeric `limit`
//! comes back in the service's `ErrorBody` shape rather than Axum's plain-text
//! rejection.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;

use crate::error::AppError;

/// Field rules checked after deserialization succeeds, e.g. slug shape or
/// amount precision on a registration.
pub trait Validate {
    /// `Err` carries the first broken rule, phrased for the API caller.
    fn validate(&self) -> Result<(), String>;
}

/// Unwrap a JSON body; syntax or shape errors become `400 BAD_REQUEST`.
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// [`extract_json`], then [`Validate`]; rule failures become
/// `400 VALIDATION_ERROR`.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let body = extract_json(result)?;
    body.validate().map_err(AppError::Validation)?;
    Ok(body)
}

/// Unwrap query parameters such as `?limit=&offset=`; parse errors become
/// `400 BAD_REQUEST`.
pub fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    result
        .map(|Query(params)| params)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}
