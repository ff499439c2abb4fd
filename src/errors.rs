use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Application-wide error taxonomy. Every failure is recovered at the request
/// boundary and rendered as a structured JSON body by the `ResponseError`
/// impl below; nothing propagates as an unhandled fault.
#[derive(Debug, Error)]
pub enum AppError {
  /// Missing, malformed or empty credential material (400).
  #[error("Authentication Failed: {0}")]
  Auth(String),

  /// The resolved role may not perform the requested operation (403).
  #[error("Permission Denied: {0}")]
  Forbidden(String),

  #[error("Validation Error: {0}")]
  Validation(String),

  /// Required request fields that were absent, reported per field name.
  #[error("Missing required fields")]
  MissingFields(Vec<String>),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  /// A query that matched nothing where the API reports that as a 404 with
  /// an `empty` body key instead of an `error` key.
  #[error("Empty Result: {0}")]
  EmptyResult(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  /// The order-placement transaction failed and was rolled back. Surfaced
  /// to the caller as a 400 with the underlying message.
  #[error("Order placement failed: {0}")]
  TransactionFailure(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    if err.is::<sqlx::Error>() {
      return AppError::Sqlx(err.downcast::<sqlx::Error>().unwrap());
    }
    AppError::Internal(err.to_string())
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Auth(_) | AppError::Validation(_) | AppError::MissingFields(_) | AppError::TransactionFailure(_) => {
        StatusCode::BAD_REQUEST
      }
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) | AppError::EmptyResult(_) => StatusCode::NOT_FOUND,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    tracing::error!(application_error = %self, "Responding with error");
    match self {
      AppError::Auth(m) => HttpResponse::BadRequest().json(json!({"error": m})),
      AppError::Forbidden(m) => HttpResponse::Forbidden().json(json!({"error": m})),
      AppError::Validation(m) => HttpResponse::BadRequest().json(json!({"error": m})),
      AppError::MissingFields(fields) => {
        let mut body = serde_json::Map::new();
        for field in fields {
          body.insert(field.clone(), json!(format!("{} is required", field)));
        }
        HttpResponse::BadRequest().json(body)
      }
      AppError::NotFound(m) => HttpResponse::NotFound().json(json!({"error": m})),
      AppError::EmptyResult(m) => HttpResponse::NotFound().json(json!({"empty": m})),
      AppError::Conflict(m) => HttpResponse::Conflict().json(json!({"error": m})),
      AppError::TransactionFailure(m) => HttpResponse::BadRequest().json(json!({"error": m})),
      AppError::Config(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "Configuration issue", "detail": m}))
      }
      AppError::Sqlx(_) => HttpResponse::InternalServerError().json(json!({"error": "Database operation failed"})),
      AppError::Internal(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "An internal error occurred", "detail": m}))
      }
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_codes_match_taxonomy() {
    assert_eq!(
      AppError::Auth("Missing authorization token".into()).status_code(),
      StatusCode::BAD_REQUEST
    );
    assert_eq!(
      AppError::Forbidden("Not a customer".into()).status_code(),
      StatusCode::FORBIDDEN
    );
    assert_eq!(
      AppError::NotFound("Token not found".into()).status_code(),
      StatusCode::NOT_FOUND
    );
    assert_eq!(
      AppError::EmptyResult("You have no orders".into()).status_code(),
      StatusCode::NOT_FOUND
    );
    assert_eq!(
      AppError::Conflict("User is already a manager".into()).status_code(),
      StatusCode::CONFLICT
    );
    assert_eq!(
      AppError::MissingFields(vec!["quantity".into()]).status_code(),
      StatusCode::BAD_REQUEST
    );
  }

  #[test]
  fn empty_result_renders_empty_key() {
    let resp = AppError::EmptyResult("You have no orders".into()).error_response();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[test]
  fn missing_fields_renders_one_entry_per_field() {
    let err = AppError::MissingFields(vec!["quantity".into(), "menuitem".into()]);
    let resp = err.error_response();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }
}
