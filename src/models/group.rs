use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Name of the group whose members hold the Manager role.
pub const MANAGER_GROUP: &str = "Manager";
/// Name of the group whose members hold the Delivery Crew role.
pub const DELIVERY_CREW_GROUP: &str = "Delivery Crew";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Group {
  pub id: i64,
  pub name: String,
}
