//! Group membership queries and roster mutations. The role groups are plain
//! rows in `groups`; a user's role is derived from membership (see
//! [`crate::authz::Role`]).

use sqlx::PgPool;
use tracing::instrument;

use crate::errors::AppError;
use crate::models::{Group, User};

pub async fn group_names_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<String>, AppError> {
  let names: Vec<(String,)> = sqlx::query_as(
    "SELECT g.name FROM groups g JOIN user_groups ug ON ug.group_id = g.id WHERE ug.user_id = $1",
  )
  .bind(user_id)
  .fetch_all(pool)
  .await?;

  Ok(names.into_iter().map(|(n,)| n).collect())
}

pub async fn find_group_by_name(pool: &PgPool, name: &str) -> Result<Option<Group>, AppError> {
  let group = sqlx::query_as::<_, Group>("SELECT id, name FROM groups WHERE name = $1")
    .bind(name)
    .fetch_optional(pool)
    .await?;
  Ok(group)
}

pub async fn user_in_group(pool: &PgPool, user_id: i64, group_name: &str) -> Result<bool, AppError> {
  let row: Option<(i64,)> = sqlx::query_as(
    "SELECT 1::BIGINT FROM user_groups ug JOIN groups g ON g.id = ug.group_id \
     WHERE ug.user_id = $1 AND g.name = $2",
  )
  .bind(user_id)
  .bind(group_name)
  .fetch_optional(pool)
  .await?;
  Ok(row.is_some())
}

/// Members of a named group, for the roster listings.
pub async fn members_of_group(pool: &PgPool, group_name: &str) -> Result<Vec<User>, AppError> {
  let users = sqlx::query_as::<_, User>(
    "SELECT u.id, u.username, u.email, u.password_hash, u.created_at \
     FROM users u \
     JOIN user_groups ug ON ug.user_id = u.id \
     JOIN groups g ON g.id = ug.group_id \
     WHERE g.name = $1 ORDER BY u.id",
  )
  .bind(group_name)
  .fetch_all(pool)
  .await?;
  Ok(users)
}

/// Any single member of the group, if one exists. Used by order placement to
/// require that a Delivery Crew user exists system-wide.
pub async fn find_any_member(pool: &PgPool, group_name: &str) -> Result<Option<User>, AppError> {
  let user = sqlx::query_as::<_, User>(
    "SELECT u.id, u.username, u.email, u.password_hash, u.created_at \
     FROM users u \
     JOIN user_groups ug ON ug.user_id = u.id \
     JOIN groups g ON g.id = ug.group_id \
     WHERE g.name = $1 ORDER BY u.id LIMIT 1",
  )
  .bind(group_name)
  .fetch_optional(pool)
  .await?;
  Ok(user)
}

#[instrument(name = "group_service::add_member", skip(pool), err(Display))]
pub async fn add_member(pool: &PgPool, user_id: i64, group_id: i64) -> Result<(), AppError> {
  sqlx::query("INSERT INTO user_groups (user_id, group_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
    .bind(user_id)
    .bind(group_id)
    .execute(pool)
    .await?;
  Ok(())
}

#[instrument(name = "group_service::remove_member", skip(pool), err(Display))]
pub async fn remove_member(pool: &PgPool, user_id: i64, group_id: i64) -> Result<(), AppError> {
  sqlx::query("DELETE FROM user_groups WHERE user_id = $1 AND group_id = $2")
    .bind(user_id)
    .bind(group_id)
    .execute(pool)
    .await?;
  Ok(())
}
