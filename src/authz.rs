//! Role resolution and the table-driven authorization policy.
//!
//! The role is resolved once per request from the authenticated user's group
//! memberships and passed explicitly into every operation; handlers never
//! re-query group names.

use crate::errors::AppError;
use crate::models::group::{DELIVERY_CREW_GROUP, MANAGER_GROUP};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
  /// Authenticated user with no role-group membership.
  Customer,
  DeliveryCrew,
  Manager,
}

impl Role {
  /// Manager membership wins if a user somehow ended up in both groups.
  pub fn from_group_names<S: AsRef<str>>(names: &[S]) -> Role {
    if names.iter().any(|n| n.as_ref() == MANAGER_GROUP) {
      Role::Manager
    } else if names.iter().any(|n| n.as_ref() == DELIVERY_CREW_GROUP) {
      Role::DeliveryCrew
    } else {
      Role::Customer
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  Read,
  Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
  /// Menu categories and menu items.
  Menu,
  /// Group records and the Manager / Delivery Crew rosters.
  GroupRoster,
  Cart,
  OrderCreate,
  /// Status / assignment updates on an existing order.
  OrderMutate,
  OrderDelete,
}

/// Single policy check: may `role` perform `action` on `resource`?
///
/// Order listing and single-order retrieval are role-branched inside the
/// order service rather than flat allow/deny decisions, so they do not
/// appear here.
pub fn authorize(role: Role, action: Action, resource: Resource) -> Result<(), AppError> {
  let allowed = match (resource, action) {
    (Resource::Menu, Action::Read) => true,
    (Resource::Menu, Action::Write) => role == Role::Manager,
    (Resource::GroupRoster, _) => role == Role::Manager,
    (Resource::Cart, _) => role == Role::Customer,
    (Resource::OrderCreate, _) => role == Role::Customer,
    (Resource::OrderMutate, _) => matches!(role, Role::Manager | Role::DeliveryCrew),
    (Resource::OrderDelete, _) => role == Role::Manager,
  };

  if allowed {
    Ok(())
  } else {
    Err(AppError::Forbidden(denial_message(resource).to_string()))
  }
}

fn denial_message(resource: Resource) -> &'static str {
  match resource {
    Resource::OrderCreate => "Not a customer",
    Resource::OrderMutate => "Only staff can update orders",
    Resource::OrderDelete => "Only managers can delete orders",
    Resource::Menu | Resource::GroupRoster | Resource::Cart => {
      "You do not have permission to perform this action."
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn role_resolution_from_group_names() {
    assert_eq!(Role::from_group_names::<&str>(&[]), Role::Customer);
    assert_eq!(Role::from_group_names(&["Delivery Crew"]), Role::DeliveryCrew);
    assert_eq!(Role::from_group_names(&["Manager"]), Role::Manager);
    // Manager membership takes precedence over Delivery Crew.
    assert_eq!(Role::from_group_names(&["Delivery Crew", "Manager"]), Role::Manager);
    // Unknown group names confer no role.
    assert_eq!(Role::from_group_names(&["Kitchen"]), Role::Customer);
  }

  #[test]
  fn anyone_reads_menu_but_only_manager_writes() {
    for role in [Role::Customer, Role::DeliveryCrew, Role::Manager] {
      assert!(authorize(role, Action::Read, Resource::Menu).is_ok());
    }
    assert!(authorize(Role::Manager, Action::Write, Resource::Menu).is_ok());
    assert!(authorize(Role::Customer, Action::Write, Resource::Menu).is_err());
    assert!(authorize(Role::DeliveryCrew, Action::Write, Resource::Menu).is_err());
  }

  #[test]
  fn rosters_are_manager_only_in_both_directions() {
    for action in [Action::Read, Action::Write] {
      assert!(authorize(Role::Manager, action, Resource::GroupRoster).is_ok());
      assert!(authorize(Role::Customer, action, Resource::GroupRoster).is_err());
      assert!(authorize(Role::DeliveryCrew, action, Resource::GroupRoster).is_err());
    }
  }

  #[test]
  fn cart_is_for_customers_only() {
    assert!(authorize(Role::Customer, Action::Read, Resource::Cart).is_ok());
    assert!(authorize(Role::Customer, Action::Write, Resource::Cart).is_ok());
    assert!(authorize(Role::Manager, Action::Read, Resource::Cart).is_err());
    assert!(authorize(Role::DeliveryCrew, Action::Write, Resource::Cart).is_err());
  }

  #[test]
  fn order_creation_is_customer_only() {
    assert!(authorize(Role::Customer, Action::Write, Resource::OrderCreate).is_ok());
    for role in [Role::Manager, Role::DeliveryCrew] {
      let err = authorize(role, Action::Write, Resource::OrderCreate).unwrap_err();
      assert!(matches!(err, AppError::Forbidden(m) if m == "Not a customer"));
    }
  }

  #[test]
  fn order_mutation_is_staff_only_and_deletion_manager_only() {
    assert!(authorize(Role::Manager, Action::Write, Resource::OrderMutate).is_ok());
    assert!(authorize(Role::DeliveryCrew, Action::Write, Resource::OrderMutate).is_ok());
    let err = authorize(Role::Customer, Action::Write, Resource::OrderMutate).unwrap_err();
    assert!(matches!(err, AppError::Forbidden(m) if m == "Only staff can update orders"));

    assert!(authorize(Role::Manager, Action::Write, Resource::OrderDelete).is_ok());
    let err = authorize(Role::DeliveryCrew, Action::Write, Resource::OrderDelete).unwrap_err();
    assert!(matches!(err, AppError::Forbidden(m) if m == "Only managers can delete orders"));
  }
}
