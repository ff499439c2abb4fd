//! Group records and the Manager / Delivery Crew rosters. Everything here is
//! Manager-only; the two role rosters share one implementation parameterized
//! by group name.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::authz::{self, Action, Resource};
use crate::errors::AppError;
use crate::models::group::{DELIVERY_CREW_GROUP, MANAGER_GROUP};
use crate::models::{Group, User};
use crate::services::group_service;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
pub struct GroupPayload {
  pub name: String,
}

#[derive(Deserialize, Debug)]
pub struct RosterAddPayload {
  pub id: Option<i64>,
}

#[derive(Deserialize, Debug)]
pub struct MemberAddPayload {
  pub group_name: Option<String>,
}

// --- Generic group records ---

#[instrument(name = "handler::list_groups", skip(app_state, auth), fields(user_id = auth.user.id))]
pub async fn list_groups(app_state: web::Data<AppState>, auth: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  authz::authorize(auth.role, Action::Read, Resource::GroupRoster)?;

  let groups: Vec<Group> = sqlx::query_as("SELECT id, name FROM groups ORDER BY id")
    .fetch_all(&app_state.db_pool)
    .await?;
  Ok(HttpResponse::Ok().json(groups))
}

#[instrument(name = "handler::create_group", skip(app_state, auth, payload), fields(user_id = auth.user.id))]
pub async fn create_group(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  payload: web::Json<GroupPayload>,
) -> Result<HttpResponse, AppError> {
  authz::authorize(auth.role, Action::Write, Resource::GroupRoster)?;

  let group: Group = sqlx::query_as("INSERT INTO groups (name) VALUES ($1) RETURNING id, name")
    .bind(&payload.name)
    .fetch_one(&app_state.db_pool)
    .await
    .map_err(|e| match &e {
      sqlx::Error::Database(db) if db.is_unique_violation() => {
        AppError::Validation("group with this name already exists".to_string())
      }
      _ => AppError::Sqlx(e),
    })?;

  info!(group_id = group.id, "Group created.");
  Ok(HttpResponse::Created().json(group))
}

#[instrument(name = "handler::get_group", skip(app_state, auth), fields(user_id = auth.user.id))]
pub async fn get_group(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  authz::authorize(auth.role, Action::Read, Resource::GroupRoster)?;
  let group_id = path.into_inner();

  let group: Group = sqlx::query_as("SELECT id, name FROM groups WHERE id = $1")
    .bind(group_id)
    .fetch_optional(&app_state.db_pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Group not found".to_string()))?;
  Ok(HttpResponse::Ok().json(group))
}

#[instrument(name = "handler::update_group", skip(app_state, auth, payload), fields(user_id = auth.user.id))]
pub async fn update_group(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<i64>,
  payload: web::Json<GroupPayload>,
) -> Result<HttpResponse, AppError> {
  authz::authorize(auth.role, Action::Write, Resource::GroupRoster)?;
  let group_id = path.into_inner();

  let group: Group = sqlx::query_as("UPDATE groups SET name = $1 WHERE id = $2 RETURNING id, name")
    .bind(&payload.name)
    .bind(group_id)
    .fetch_optional(&app_state.db_pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Group not found".to_string()))?;
  Ok(HttpResponse::Ok().json(group))
}

#[instrument(name = "handler::delete_group", skip(app_state, auth), fields(user_id = auth.user.id))]
pub async fn delete_group(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  authz::authorize(auth.role, Action::Write, Resource::GroupRoster)?;
  let group_id = path.into_inner();

  let result = sqlx::query("DELETE FROM groups WHERE id = $1")
    .bind(group_id)
    .execute(&app_state.db_pool)
    .await?;

  if result.rows_affected() == 0 {
    return Err(AppError::NotFound("Group not found".to_string()));
  }
  Ok(HttpResponse::NoContent().finish())
}

// --- Role rosters ---

async fn roster_list(app_state: &AppState, auth: &AuthenticatedUser, group_name: &str) -> Result<HttpResponse, AppError> {
  authz::authorize(auth.role, Action::Read, Resource::GroupRoster)?;
  let members = group_service::members_of_group(&app_state.db_pool, group_name).await?;
  Ok(HttpResponse::Ok().json(members))
}

/// Adds the user named in the request body to a role group. Re-adding an
/// existing member is a conflict, not a silent no-op.
async fn roster_add(
  app_state: &AppState,
  auth: &AuthenticatedUser,
  payload: &RosterAddPayload,
  group_name: &str,
  conflict_message: &str,
) -> Result<HttpResponse, AppError> {
  authz::authorize(auth.role, Action::Write, Resource::GroupRoster)?;

  let user_id = payload.id.ok_or_else(|| AppError::Validation("No id was sent".to_string()))?;

  let user: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
    .bind(user_id)
    .fetch_optional(&app_state.db_pool)
    .await?;
  if user.is_none() {
    return Err(AppError::NotFound(format!("User with id {} was not found", user_id)));
  }

  if group_service::user_in_group(&app_state.db_pool, user_id, group_name).await? {
    return Err(AppError::Conflict(conflict_message.to_string()));
  }

  let group = group_service::find_group_by_name(&app_state.db_pool, group_name)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("{} group does not exist", group_name)))?;

  group_service::add_member(&app_state.db_pool, user_id, group.id).await?;

  info!(user_id, group = group_name, "User added to role group.");
  Ok(HttpResponse::Ok().json(json!({
    "message": format!("User {} added to {}'s group.", user_id, group_name)
  })))
}

async fn member_get(app_state: &AppState, auth: &AuthenticatedUser, user_id: i64, group_name: &str) -> Result<HttpResponse, AppError> {
  authz::authorize(auth.role, Action::Read, Resource::GroupRoster)?;

  let member: User = sqlx::query_as(
    "SELECT u.id, u.username, u.email, u.password_hash, u.created_at \
     FROM users u \
     JOIN user_groups ug ON ug.user_id = u.id \
     JOIN groups g ON g.id = ug.group_id \
     WHERE u.id = $1 AND g.name = $2",
  )
  .bind(user_id)
  .bind(group_name)
  .fetch_optional(&app_state.db_pool)
  .await?
  .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

  Ok(HttpResponse::Ok().json(member))
}

/// Adds the user in the path to a group named in the body, defaulting to the
/// roster's own group when none is supplied.
async fn member_add(
  app_state: &AppState,
  auth: &AuthenticatedUser,
  user_id: i64,
  payload: &MemberAddPayload,
  default_group: &str,
) -> Result<HttpResponse, AppError> {
  authz::authorize(auth.role, Action::Write, Resource::GroupRoster)?;

  let group_name = payload.group_name.as_deref().unwrap_or(default_group);

  let user: User = sqlx::query_as("SELECT id, username, email, password_hash, created_at FROM users WHERE id = $1")
    .bind(user_id)
    .fetch_optional(&app_state.db_pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

  let group = group_service::find_group_by_name(&app_state.db_pool, group_name)
    .await?
    .ok_or_else(|| AppError::NotFound("Group not found".to_string()))?;

  group_service::add_member(&app_state.db_pool, user.id, group.id).await?;

  Ok(HttpResponse::Created().json(json!({
    "message": format!("User {} added to group {}.", user.username, group.name)
  })))
}

async fn member_remove(
  app_state: &AppState,
  auth: &AuthenticatedUser,
  user_id: i64,
  group_name: &str,
) -> Result<HttpResponse, AppError> {
  authz::authorize(auth.role, Action::Write, Resource::GroupRoster)?;

  let user: User = sqlx::query_as("SELECT id, username, email, password_hash, created_at FROM users WHERE id = $1")
    .bind(user_id)
    .fetch_optional(&app_state.db_pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

  let group = group_service::find_group_by_name(&app_state.db_pool, group_name)
    .await?
    .ok_or_else(|| AppError::NotFound("Group not found".to_string()))?;

  group_service::remove_member(&app_state.db_pool, user.id, group.id).await?;

  Ok(HttpResponse::Ok().json(json!({
    "message": format!("User {} removed from group {}.", user.username, group.name)
  })))
}

// --- Manager roster routes ---

#[instrument(name = "handler::list_managers", skip(app_state, auth), fields(user_id = auth.user.id))]
pub async fn list_managers(app_state: web::Data<AppState>, auth: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  roster_list(&app_state, &auth, MANAGER_GROUP).await
}

#[instrument(name = "handler::add_manager", skip(app_state, auth, payload), fields(user_id = auth.user.id))]
pub async fn add_manager(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  payload: web::Json<RosterAddPayload>,
) -> Result<HttpResponse, AppError> {
  roster_add(&app_state, &auth, &payload, MANAGER_GROUP, "User is already a manager").await
}

#[instrument(name = "handler::get_manager", skip(app_state, auth), fields(user_id = auth.user.id))]
pub async fn get_manager(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  member_get(&app_state, &auth, path.into_inner(), MANAGER_GROUP).await
}

#[instrument(name = "handler::add_manager_member", skip(app_state, auth, payload), fields(user_id = auth.user.id))]
pub async fn add_manager_member(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<i64>,
  payload: web::Json<MemberAddPayload>,
) -> Result<HttpResponse, AppError> {
  member_add(&app_state, &auth, path.into_inner(), &payload, MANAGER_GROUP).await
}

#[instrument(name = "handler::remove_manager", skip(app_state, auth), fields(user_id = auth.user.id))]
pub async fn remove_manager(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  member_remove(&app_state, &auth, path.into_inner(), MANAGER_GROUP).await
}

// --- Delivery crew roster routes ---

#[instrument(name = "handler::list_delivery_crew", skip(app_state, auth), fields(user_id = auth.user.id))]
pub async fn list_delivery_crew(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  roster_list(&app_state, &auth, DELIVERY_CREW_GROUP).await
}

#[instrument(name = "handler::add_delivery_crew", skip(app_state, auth, payload), fields(user_id = auth.user.id))]
pub async fn add_delivery_crew(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  payload: web::Json<RosterAddPayload>,
) -> Result<HttpResponse, AppError> {
  roster_add(&app_state, &auth, &payload, DELIVERY_CREW_GROUP, "User is already a delivery crew").await
}

#[instrument(name = "handler::get_delivery_crew_member", skip(app_state, auth), fields(user_id = auth.user.id))]
pub async fn get_delivery_crew_member(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  member_get(&app_state, &auth, path.into_inner(), DELIVERY_CREW_GROUP).await
}

#[instrument(name = "handler::add_delivery_crew_member", skip(app_state, auth, payload), fields(user_id = auth.user.id))]
pub async fn add_delivery_crew_member(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<i64>,
  payload: web::Json<MemberAddPayload>,
) -> Result<HttpResponse, AppError> {
  member_add(&app_state, &auth, path.into_inner(), &payload, DELIVERY_CREW_GROUP).await
}

#[instrument(name = "handler::remove_delivery_crew_member", skip(app_state, auth), fields(user_id = auth.user.id))]
pub async fn remove_delivery_crew_member(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  member_remove(&app_state, &auth, path.into_inner(), DELIVERY_CREW_GROUP).await
}
