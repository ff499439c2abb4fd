use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// One pending selection in a customer's cart. Unique per (user, menu item);
/// `price` always equals `quantity * unit_price`, with `unit_price`
/// snapshotted from the menu item at the time the line was created.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CartLine {
  pub id: i64,
  pub user_id: i64,
  pub menuitem_id: i64,
  pub quantity: i32,
  pub unit_price: Decimal,
  pub price: Decimal,
}
