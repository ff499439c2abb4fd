use actix_web::web;

use crate::web::handlers::{
  auth_handlers, cart_handlers, category_handlers, group_handlers, menu_handlers, order_handlers,
};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api")
      .route("/health", web::get().to(health_check_handler))
      // Identity surface
      .route("/users", web::post().to(auth_handlers::register))
      .route("/users/me", web::get().to(auth_handlers::current_user))
      .route("/token/login", web::post().to(auth_handlers::login))
      // Menu categories
      .route("/menu-categories", web::get().to(category_handlers::list_categories))
      .route("/menu-categories", web::post().to(category_handlers::create_category))
      .route("/menu-categories/{id}", web::get().to(category_handlers::get_category))
      .route("/menu-categories/{id}", web::put().to(category_handlers::update_category))
      .route("/menu-categories/{id}", web::patch().to(category_handlers::patch_category))
      .route("/menu-categories/{id}", web::delete().to(category_handlers::delete_category))
      // Menu items
      .route("/menu-items", web::get().to(menu_handlers::list_menu_items))
      .route("/menu-items", web::post().to(menu_handlers::create_menu_item))
      .route("/menu-items/{id}", web::get().to(menu_handlers::get_menu_item))
      .route("/menu-items/{id}", web::put().to(menu_handlers::update_menu_item))
      .route("/menu-items/{id}", web::patch().to(menu_handlers::patch_menu_item))
      .route("/menu-items/{id}", web::delete().to(menu_handlers::delete_menu_item))
      // Groups and rosters
      .route("/groups", web::get().to(group_handlers::list_groups))
      .route("/groups", web::post().to(group_handlers::create_group))
      .route(
        "/groups/managers/users",
        web::get().to(group_handlers::list_managers),
      )
      .route(
        "/groups/managers/users",
        web::post().to(group_handlers::add_manager),
      )
      .route(
        "/groups/managers/users/{id}",
        web::get().to(group_handlers::get_manager),
      )
      .route(
        "/groups/managers/users/{id}",
        web::post().to(group_handlers::add_manager_member),
      )
      .route(
        "/groups/managers/users/{id}",
        web::delete().to(group_handlers::remove_manager),
      )
      .route(
        "/groups/delivery-crew/users",
        web::get().to(group_handlers::list_delivery_crew),
      )
      .route(
        "/groups/delivery-crew/users",
        web::post().to(group_handlers::add_delivery_crew),
      )
      .route(
        "/groups/delivery-crew/users/{id}",
        web::get().to(group_handlers::get_delivery_crew_member),
      )
      .route(
        "/groups/delivery-crew/users/{id}",
        web::post().to(group_handlers::add_delivery_crew_member),
      )
      .route(
        "/groups/delivery-crew/users/{id}",
        web::delete().to(group_handlers::remove_delivery_crew_member),
      )
      .route("/groups/{id}", web::get().to(group_handlers::get_group))
      .route("/groups/{id}", web::put().to(group_handlers::update_group))
      .route("/groups/{id}", web::patch().to(group_handlers::update_group))
      .route("/groups/{id}", web::delete().to(group_handlers::delete_group))
      // Cart
      .route("/cart/menu-items", web::get().to(cart_handlers::get_cart))
      .route("/cart/menu-items", web::post().to(cart_handlers::add_to_cart))
      .route("/cart/menu-items", web::delete().to(cart_handlers::clear_cart))
      // Orders
      .route("/orders", web::get().to(order_handlers::list_orders))
      .route("/orders", web::post().to(order_handlers::place_order))
      .route("/orders/{id}", web::get().to(order_handlers::get_order))
      .route("/orders/{id}", web::put().to(order_handlers::update_order))
      .route("/orders/{id}", web::patch().to(order_handlers::update_order))
      .route("/orders/{id}", web::delete().to(order_handlers::delete_order)),
  );
}
