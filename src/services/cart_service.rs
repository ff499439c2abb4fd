//! The cart manager: a customer's pending selections before order placement.
//!
//! Side effects are confined to `cart_lines` rows; orders are never touched
//! from here.

use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::models::CartLine;

/// Whether an add created a fresh line or replaced the quantity on an
/// existing one. The two cases produce different success messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartAddOutcome {
  Inserted,
  Replaced,
}

/// Line price is always quantity times the snapshotted unit price.
pub fn compute_line_price(quantity: i32, unit_price: Decimal) -> Decimal {
  Decimal::from(quantity) * unit_price
}

/// Coerces the `quantity` request field to a positive integer.
///
/// Clients send quantity as either a JSON number or a numeric string; both
/// are accepted. Anything that does not parse as an integer is a 400, as is
/// any value below one.
pub fn coerce_quantity(raw: &Value) -> Result<i32, AppError> {
  let quantity = match raw {
    Value::Number(n) => n
      .as_i64()
      .ok_or_else(|| AppError::Validation("Quantity must be a valid integer".to_string()))?,
    Value::String(s) => s
      .trim()
      .parse::<i64>()
      .map_err(|_| AppError::Validation("Quantity must be a valid integer".to_string()))?,
    _ => return Err(AppError::Validation("Quantity must be a valid integer".to_string())),
  };

  if quantity <= 0 {
    return Err(AppError::Validation(
      "Quantity must be a positive number greater than zero".to_string(),
    ));
  }

  i32::try_from(quantity).map_err(|_| AppError::Validation("Quantity must be a valid integer".to_string()))
}

#[instrument(name = "cart_service::view_cart", skip(pool))]
pub async fn view_cart(pool: &PgPool, user_id: i64) -> Result<Vec<CartLine>, AppError> {
  let lines = sqlx::query_as::<_, CartLine>(
    "SELECT id, user_id, menuitem_id, quantity, unit_price, price \
     FROM cart_lines WHERE user_id = $1 ORDER BY id",
  )
  .bind(user_id)
  .fetch_all(pool)
  .await?;
  Ok(lines)
}

/// Adds a menu item to the user's cart, or replaces the quantity if a line
/// for that item already exists.
///
/// On first add the unit price is snapshotted from the current menu item
/// price; on replace the stored snapshot is kept and only quantity and line
/// price change. Later menu price edits never leak into an existing line.
#[instrument(name = "cart_service::add_item", skip(pool), err(Display))]
pub async fn add_item(
  pool: &PgPool,
  user_id: i64,
  menuitem_id: i64,
  quantity: i32,
) -> Result<CartAddOutcome, AppError> {
  let menu_price: Option<(Decimal,)> = sqlx::query_as("SELECT price FROM menu_items WHERE id = $1")
    .bind(menuitem_id)
    .fetch_optional(pool)
    .await?;

  let menu_price = match menu_price {
    Some((price,)) => price,
    None => return Err(AppError::Validation("Menu item does not exists".to_string())),
  };

  let existing: Option<CartLine> = sqlx::query_as(
    "SELECT id, user_id, menuitem_id, quantity, unit_price, price \
     FROM cart_lines WHERE user_id = $1 AND menuitem_id = $2",
  )
  .bind(user_id)
  .bind(menuitem_id)
  .fetch_optional(pool)
  .await?;

  match existing {
    Some(line) => {
      let new_price = compute_line_price(quantity, line.unit_price);
      sqlx::query("UPDATE cart_lines SET quantity = $1, price = $2 WHERE id = $3")
        .bind(quantity)
        .bind(new_price)
        .bind(line.id)
        .execute(pool)
        .await?;

      info!(user_id, menuitem_id, quantity, "Replaced quantity on existing cart line.");
      Ok(CartAddOutcome::Replaced)
    }
    None => {
      let price = compute_line_price(quantity, menu_price);
      sqlx::query(
        "INSERT INTO cart_lines (user_id, menuitem_id, quantity, unit_price, price) \
         VALUES ($1, $2, $3, $4, $5)",
      )
      .bind(user_id)
      .bind(menuitem_id)
      .bind(quantity)
      .bind(menu_price)
      .bind(price)
      .execute(pool)
      .await?;

      info!(user_id, menuitem_id, quantity, "Added new cart line.");
      Ok(CartAddOutcome::Inserted)
    }
  }
}

/// Deletes every line in the user's cart. Idempotent; returns the number of
/// lines removed so the handler can distinguish "emptied" from "was already
/// empty".
#[instrument(name = "cart_service::clear_cart", skip(pool), err(Display))]
pub async fn clear_cart(pool: &PgPool, user_id: i64) -> Result<u64, AppError> {
  let result = sqlx::query("DELETE FROM cart_lines WHERE user_id = $1")
    .bind(user_id)
    .execute(pool)
    .await?;
  Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;
  use serde_json::json;

  #[test]
  fn line_price_is_quantity_times_unit_price() {
    assert_eq!(compute_line_price(3, dec!(2.50)), dec!(7.50));
    assert_eq!(compute_line_price(1, dec!(9.99)), dec!(9.99));
    // Decimal math stays exact where floats would drift.
    assert_eq!(compute_line_price(7, dec!(0.10)), dec!(0.70));
  }

  #[test]
  fn quantity_accepts_numbers_and_numeric_strings() {
    assert_eq!(coerce_quantity(&json!(4)).unwrap(), 4);
    assert_eq!(coerce_quantity(&json!("4")).unwrap(), 4);
    assert_eq!(coerce_quantity(&json!(" 12 ")).unwrap(), 12);
  }

  #[test]
  fn quantity_rejects_non_integers() {
    for bad in [json!("four"), json!(2.5), json!(true), json!(null), json!([])] {
      let err = coerce_quantity(&bad).unwrap_err();
      assert!(matches!(err, AppError::Validation(m) if m == "Quantity must be a valid integer"));
    }
  }

  #[test]
  fn quantity_rejects_zero_and_negatives() {
    for bad in [json!(0), json!(-3), json!("0")] {
      let err = coerce_quantity(&bad).unwrap_err();
      assert!(
        matches!(err, AppError::Validation(m) if m == "Quantity must be a positive number greater than zero")
      );
    }
  }
}
