use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// Immutable line item of an order. All fields are copied verbatim from the
/// cart line at order creation and never updated afterwards.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderItem {
  pub id: i64,
  pub order_id: i64,
  pub menuitem_id: i64,
  pub quantity: i32,
  pub unit_price: Decimal,
  pub price: Decimal,
}
