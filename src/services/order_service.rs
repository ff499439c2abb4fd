//! The order lifecycle engine: cart-to-order placement, role-branched
//! visibility, and role-gated mutation of existing orders.
//!
//! Order placement is the only multi-row atomic operation in the system and
//! runs inside a single database transaction; the store's isolation is the
//! sole concurrency-control mechanism.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::authz::Role;
use crate::errors::AppError;
use crate::models::group::DELIVERY_CREW_GROUP;
use crate::models::{CartLine, Order, OrderItem, OrderStatus, User};
use crate::services::group_service;

const SELECT_ORDER: &str = "SELECT id, user_id, delivery_crew_id, status, total, date FROM orders";

/// Lists the orders visible to the requester.
///
/// Customers see their own orders, delivery crew the orders assigned to
/// them, managers everything. An empty result is reported as a 404 with a
/// role-specific message rather than an empty 200 list.
#[instrument(name = "order_service::list_orders", skip(pool), err(Display))]
pub async fn list_orders(pool: &PgPool, user_id: i64, role: Role) -> Result<Vec<Order>, AppError> {
  let (orders, empty_message): (Vec<Order>, &str) = match role {
    Role::Customer => (
      sqlx::query_as(&format!("{} WHERE user_id = $1 ORDER BY id", SELECT_ORDER))
        .bind(user_id)
        .fetch_all(pool)
        .await?,
      "You have no orders",
    ),
    Role::DeliveryCrew => (
      sqlx::query_as(&format!("{} WHERE delivery_crew_id = $1 ORDER BY id", SELECT_ORDER))
        .bind(user_id)
        .fetch_all(pool)
        .await?,
      "No orders were found for this Delivery Crew user",
    ),
    Role::Manager => (
      sqlx::query_as(&format!("{} ORDER BY id", SELECT_ORDER))
        .fetch_all(pool)
        .await?,
      "No orders were yet placed",
    ),
  };

  if orders.is_empty() {
    return Err(AppError::EmptyResult(empty_message.to_string()));
  }
  Ok(orders)
}

/// Places an order from the user's cart.
///
/// Requires that at least one Delivery Crew user exists system-wide and
/// that the cart is non-empty. The order row, its items and the cart
/// deletion commit together or not at all; a failure anywhere inside the
/// transaction leaves no order, no items and an untouched cart.
#[instrument(name = "order_service::create_order", skip(pool, user), fields(user_id = user.id), err(Display))]
pub async fn create_order(pool: &PgPool, user: &User) -> Result<Order, AppError> {
  if group_service::find_any_member(pool, DELIVERY_CREW_GROUP).await?.is_none() {
    return Err(AppError::NotFound("No Delivery Crew user was found. Add one".to_string()));
  }

  let mut tx = pool.begin().await?;

  // FOR UPDATE serializes two concurrent placements over the same cart:
  // the second blocks here, then sees the emptied cart and gets the 404.
  let cart: Vec<CartLine> = sqlx::query_as(
    "SELECT id, user_id, menuitem_id, quantity, unit_price, price \
     FROM cart_lines WHERE user_id = $1 ORDER BY id FOR UPDATE",
  )
  .bind(user.id)
  .fetch_all(&mut *tx)
  .await
  .map_err(|e| AppError::TransactionFailure(e.to_string()))?;

  if cart.is_empty() {
    return Err(AppError::EmptyResult("No cart items were found for the user".to_string()));
  }

  let total: Decimal = cart.iter().map(|line| line.price).sum();

  let order: Order = sqlx::query_as(
    "INSERT INTO orders (user_id, status, total, date) VALUES ($1, $2, $3, CURRENT_DATE) \
     RETURNING id, user_id, delivery_crew_id, status, total, date",
  )
  .bind(user.id)
  .bind(OrderStatus::PENDING)
  .bind(total)
  .fetch_one(&mut *tx)
  .await
  .map_err(|e| AppError::TransactionFailure(e.to_string()))?;

  let mut items: Vec<OrderItem> = Vec::with_capacity(cart.len());
  for line in &cart {
    let item: OrderItem = sqlx::query_as(
      "INSERT INTO order_items (order_id, menuitem_id, quantity, unit_price, price) \
       VALUES ($1, $2, $3, $4, $5) \
       RETURNING id, order_id, menuitem_id, quantity, unit_price, price",
    )
    .bind(order.id)
    .bind(line.menuitem_id)
    .bind(line.quantity)
    .bind(line.unit_price)
    .bind(line.price)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| AppError::TransactionFailure(e.to_string()))?;
    items.push(item);
  }

  sqlx::query("DELETE FROM cart_lines WHERE user_id = $1")
    .bind(user.id)
    .execute(&mut *tx)
    .await
    .map_err(|e| AppError::TransactionFailure(e.to_string()))?;

  tx.commit().await.map_err(|e| AppError::TransactionFailure(e.to_string()))?;

  info!(order_id = order.id, %total, items = items.len(), "Order placed from cart.");
  Ok(order)
}

/// Fetches a single order, restricted by the requester's role.
///
/// Managers are not served by this path and receive a 403; they list orders
/// through [`list_orders`] instead.
#[instrument(name = "order_service::retrieve_order", skip(pool), err(Display))]
pub async fn retrieve_order(pool: &PgPool, user_id: i64, role: Role, order_id: i64) -> Result<Order, AppError> {
  match role {
    Role::Customer => sqlx::query_as(&format!("{} WHERE id = $1 AND user_id = $2", SELECT_ORDER))
      .bind(order_id)
      .bind(user_id)
      .fetch_optional(pool)
      .await?
      .ok_or_else(|| AppError::NotFound("No orders were found for this customer".to_string())),
    Role::DeliveryCrew => sqlx::query_as(&format!("{} WHERE id = $1 AND delivery_crew_id = $2", SELECT_ORDER))
      .bind(order_id)
      .bind(user_id)
      .fetch_optional(pool)
      .await?
      .ok_or_else(|| {
        AppError::NotFound("No order with this specific id was found for this Delivery Crew".to_string())
      }),
    Role::Manager => Err(AppError::Forbidden("Unauthorized".to_string())),
  }
}

/// Fields a staff member asked to change on an order, after role gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateFields {
  pub status: Option<OrderStatus>,
  pub delivery_crew_id: Option<i64>,
}

/// Applies the role gate to a requested update: delivery crew may only
/// change status, so any `delivery_crew` they supply is discarded before
/// the emptiness check. Managers keep both fields.
pub fn resolve_update_fields(role: Role, status: Option<i16>, delivery_crew: Option<i64>) -> UpdateFields {
  let delivery_crew_id = match role {
    Role::DeliveryCrew => None,
    _ => delivery_crew,
  };
  UpdateFields {
    status: status.map(OrderStatus),
    delivery_crew_id,
  }
}

/// Updates status and/or assignment on an existing order.
///
/// The caller has already passed the staff-only policy check; this gates
/// the delivery-crew field by role, validates the assignee and persists the
/// change. Order items are never touched.
#[instrument(name = "order_service::update_order", skip(pool), err(Display))]
pub async fn update_order(
  pool: &PgPool,
  role: Role,
  order_id: i64,
  status: Option<i16>,
  delivery_crew: Option<i64>,
) -> Result<(), AppError> {
  let order: Order = sqlx::query_as(&format!("{} WHERE id = $1", SELECT_ORDER))
    .bind(order_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("No orders were found".to_string()))?;

  let fields = resolve_update_fields(role, status, delivery_crew);

  if fields.status.is_none() && fields.delivery_crew_id.is_none() {
    return Err(AppError::Validation(
      "Nothing to update. Missing either status or delivery_crew".to_string(),
    ));
  }

  if let Some(crew_id) = fields.delivery_crew_id {
    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
      .bind(crew_id)
      .fetch_optional(pool)
      .await?;
    if exists.is_none() {
      return Err(AppError::NotFound("User not found".to_string()));
    }
    if !group_service::user_in_group(pool, crew_id, DELIVERY_CREW_GROUP).await? {
      return Err(AppError::Validation("User is not in Delivery Crew group".to_string()));
    }
  }

  let new_status = fields.status.unwrap_or(order.status);
  let new_crew = fields.delivery_crew_id.or(order.delivery_crew_id);

  sqlx::query("UPDATE orders SET status = $1, delivery_crew_id = $2 WHERE id = $3")
    .bind(new_status)
    .bind(new_crew)
    .bind(order_id)
    .execute(pool)
    .await?;

  info!(order_id, ?fields, "Order updated.");
  Ok(())
}

/// Deletes an order; items go with it via the cascading foreign key.
#[instrument(name = "order_service::delete_order", skip(pool), err(Display))]
pub async fn delete_order(pool: &PgPool, order_id: i64) -> Result<(), AppError> {
  let result = sqlx::query("DELETE FROM orders WHERE id = $1")
    .bind(order_id)
    .execute(pool)
    .await?;

  if result.rows_affected() == 0 {
    return Err(AppError::NotFound("No orders were found".to_string()));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;

  fn line(id: i64, quantity: i32, unit_price: Decimal) -> CartLine {
    CartLine {
      id,
      user_id: 1,
      menuitem_id: id,
      quantity,
      unit_price,
      price: Decimal::from(quantity) * unit_price,
    }
  }

  #[test]
  fn order_total_is_sum_of_line_prices() {
    let cart = vec![line(1, 2, dec!(3.25)), line(2, 1, dec!(10.00)), line(3, 4, dec!(0.99))];
    let total: Decimal = cart.iter().map(|l| l.price).sum();
    assert_eq!(total, dec!(20.46));
  }

  #[test]
  fn delivery_crew_cannot_reassign_orders() {
    let fields = resolve_update_fields(Role::DeliveryCrew, Some(1), Some(42));
    assert_eq!(fields.status, Some(OrderStatus::DELIVERED));
    assert_eq!(fields.delivery_crew_id, None);
  }

  #[test]
  fn delivery_crew_update_with_only_assignment_becomes_empty() {
    // Once the forbidden field is discarded there is nothing left to apply,
    // which the service then rejects as a validation error.
    let fields = resolve_update_fields(Role::DeliveryCrew, None, Some(42));
    assert_eq!(fields.status, None);
    assert_eq!(fields.delivery_crew_id, None);
  }

  #[test]
  fn manager_may_change_both_fields() {
    let fields = resolve_update_fields(Role::Manager, Some(1), Some(42));
    assert_eq!(fields.status, Some(OrderStatus::DELIVERED));
    assert_eq!(fields.delivery_crew_id, Some(42));
  }

  #[test]
  fn unrecognized_status_values_pass_through() {
    let fields = resolve_update_fields(Role::Manager, Some(7), None);
    assert_eq!(fields.status, Some(OrderStatus(7)));
    assert!(!fields.status.unwrap().is_delivered());
  }
}
