//! Data structures representing database entities.

pub mod cart_line;
pub mod category;
pub mod group;
pub mod menu_item;
pub mod order;
pub mod order_item;
pub mod user;

pub use cart_line::CartLine;
pub use category::Category;
pub use group::Group;
pub use menu_item::{MenuItem, MenuItemRow};
pub use order::{Order, OrderStatus};
pub use order_item::OrderItem;
pub use user::User;
