use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Order status is an open small integer: business logic only distinguishes
/// `PENDING` and `DELIVERED`; any other value a staff member writes is
/// stored and passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderStatus(pub i16);

impl OrderStatus {
  pub const PENDING: OrderStatus = OrderStatus(0);
  pub const DELIVERED: OrderStatus = OrderStatus(1);

  pub fn is_delivered(self) -> bool {
    self == Self::DELIVERED
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
  pub id: i64,
  pub user_id: i64,
  pub delivery_crew_id: Option<i64>,
  pub status: OrderStatus,
  /// Sum of the order's item prices at creation time. Never recomputed,
  /// regardless of later menu price edits.
  pub total: Decimal,
  pub date: NaiveDate,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_delivered_is_terminal() {
    assert!(!OrderStatus::PENDING.is_delivered());
    assert!(OrderStatus::DELIVERED.is_delivered());
    // Unrecognized values pass through without being treated as delivered.
    assert!(!OrderStatus(7).is_delivered());
  }
}
