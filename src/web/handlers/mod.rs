pub mod auth_handlers;
pub mod cart_handlers;
pub mod category_handlers;
pub mod group_handlers;
pub mod menu_handlers;
pub mod order_handlers;
