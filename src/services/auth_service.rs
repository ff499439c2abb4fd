//! Credential handling: password hashing, token issuance and the
//! per-request token-to-identity resolution consumed by every
//! credential-gated endpoint.

use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::authz::Role;
use crate::errors::AppError;
use crate::models::User;
use crate::services::group_service;

/// Scheme prefix expected on the `Authorization` header.
const TOKEN_PREFIX: &str = "Token ";

#[instrument(name = "auth_service::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String, AppError> {
  if password.is_empty() {
    return Err(AppError::Validation("Password cannot be empty.".to_string()));
  }

  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

#[instrument(name = "auth_service::verify_password", skip_all, err(Display))]
pub fn verify_password(stored_hash: &str, provided_password: &str) -> Result<bool, AppError> {
  let parsed_hash =
    PasswordHash::new(stored_hash).map_err(|e| AppError::Internal(format!("Invalid stored password hash: {}", e)))?;

  match Argon2::default().verify_password(provided_password.as_bytes(), &parsed_hash) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => Ok(false),
    Err(e) => Err(AppError::Internal(format!("Password verification failed: {}", e))),
  }
}

/// Extracts the token key from a raw `Authorization` header value.
///
/// The three failure modes are deliberately distinct so clients can tell a
/// missing header from a malformed one from an unknown token:
/// missing and malformed are 400s here; an unknown key becomes a 404 in
/// [`resolve_token`].
pub fn parse_token_header(header: Option<&str>) -> Result<String, AppError> {
  let header = header.ok_or_else(|| AppError::Auth("Missing authorization token".to_string()))?;

  let key = header
    .strip_prefix(TOKEN_PREFIX)
    .ok_or_else(|| AppError::Auth("Invalid authorization token format".to_string()))?;

  if key.is_empty() {
    return Err(AppError::Auth("Invalid authorization token format".to_string()));
  }

  Ok(key.to_string())
}

/// Resolves a token key to the owning user and their role, in one pass.
#[instrument(name = "auth_service::resolve_token", skip_all, err(Display))]
pub async fn resolve_token(pool: &PgPool, key: &str) -> Result<(User, Role), AppError> {
  let user: User = sqlx::query_as(
    "SELECT u.id, u.username, u.email, u.password_hash, u.created_at \
     FROM users u JOIN auth_tokens t ON t.user_id = u.id WHERE t.key = $1",
  )
  .bind(key)
  .fetch_optional(pool)
  .await?
  .ok_or_else(|| AppError::NotFound("Token not found".to_string()))?;

  let group_names = group_service::group_names_for_user(pool, user.id).await?;
  let role = Role::from_group_names(&group_names);

  debug!(user_id = user.id, ?role, "Resolved bearer token.");
  Ok((user, role))
}

/// Returns the user's token, creating one on first login. A user keeps the
/// same token across logins until it is revoked.
#[instrument(name = "auth_service::issue_token", skip(pool), err(Display))]
pub async fn issue_token(pool: &PgPool, user_id: i64) -> Result<String, AppError> {
  let key = Uuid::new_v4().simple().to_string();

  let issued: (String,) = sqlx::query_as(
    "INSERT INTO auth_tokens (key, user_id) VALUES ($1, $2) \
     ON CONFLICT (user_id) DO UPDATE SET key = auth_tokens.key \
     RETURNING key",
  )
  .bind(&key)
  .bind(user_id)
  .fetch_one(pool)
  .await?;

  Ok(issued.0)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_rejects_missing_header() {
    let err = parse_token_header(None).unwrap_err();
    assert!(matches!(err, AppError::Auth(m) if m == "Missing authorization token"));
  }

  #[test]
  fn parse_rejects_wrong_scheme() {
    for bad in ["Bearer abc123", "token abc123", "abc123", "Token"] {
      let err = parse_token_header(Some(bad)).unwrap_err();
      assert!(matches!(err, AppError::Auth(m) if m == "Invalid authorization token format"));
    }
  }

  #[test]
  fn parse_rejects_empty_key() {
    let err = parse_token_header(Some("Token ")).unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));
  }

  #[test]
  fn parse_accepts_well_formed_header() {
    let key = parse_token_header(Some("Token deadbeefcafe")).unwrap();
    assert_eq!(key, "deadbeefcafe");
  }

  #[test]
  fn password_hash_round_trip() {
    let hash = hash_password("hunter2").unwrap();
    assert!(verify_password(&hash, "hunter2").unwrap());
    assert!(!verify_password(&hash, "hunter3").unwrap());
  }

  #[test]
  fn empty_password_is_rejected() {
    assert!(matches!(hash_password(""), Err(AppError::Validation(_))));
  }
}
