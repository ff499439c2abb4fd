use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MenuItem {
  pub id: i64,
  pub title: String,
  pub price: Decimal,
  pub featured: bool,
  pub category_id: i64,
}

/// Read shape for menu item endpoints: the raw row joined with its
/// category's title, mirroring what clients see.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MenuItemRow {
  pub id: i64,
  pub title: String,
  pub price: Decimal,
  pub featured: bool,
  pub category_name: String,
}
