use actix_web::http::header::AUTHORIZATION;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;

use crate::authz::Role;
use crate::errors::AppError;
use crate::models::User;
use crate::services::auth_service;
use crate::state::AppState;

/// Identity extractor for credential-gated endpoints.
///
/// Parses the `Authorization: Token <key>` header, resolves the key against
/// the token store and loads the user's role, so handlers receive a fully
/// resolved identity and never re-query group membership themselves.
#[derive(Debug)]
pub struct AuthenticatedUser {
  pub user: User,
  pub role: Role,
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let state = req.app_data::<web::Data<AppState>>().cloned();
    let header = req
      .headers()
      .get(AUTHORIZATION)
      .and_then(|value| value.to_str().ok())
      .map(str::to_owned);

    Box::pin(async move {
      let key = auth_service::parse_token_header(header.as_deref())?;
      let state = state.ok_or_else(|| AppError::Internal("Application state is not configured.".to_string()))?;
      let (user, role) = auth_service::resolve_token(&state.db_pool, &key).await?;
      Ok(AuthenticatedUser { user, role })
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::test::TestRequest;

  #[actix_rt::test]
  async fn missing_header_is_an_authentication_error() {
    let req = TestRequest::default().to_http_request();
    let err = AuthenticatedUser::from_request(&req, &mut Payload::None)
      .await
      .unwrap_err();
    assert!(matches!(err, AppError::Auth(m) if m == "Missing authorization token"));
  }

  #[actix_rt::test]
  async fn wrong_scheme_is_rejected_before_any_lookup() {
    let req = TestRequest::default()
      .insert_header((AUTHORIZATION, "Bearer deadbeef"))
      .to_http_request();
    let err = AuthenticatedUser::from_request(&req, &mut Payload::None)
      .await
      .unwrap_err();
    assert!(matches!(err, AppError::Auth(m) if m == "Invalid authorization token format"));
  }
}
