// apps/storefront/src/web/routes.rs

use actix_web::web;

use crate::web::handlers::{
  auth_handlers, cart_handlers, checkout_handlers, order_handlers, product_handlers, profile_handlers,
};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Proof uploads are capped at 5 MB; leave room for the request itself.
const PROOF_BODY_LIMIT: usize = 6 * 1024 * 1024;

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/auth")
          .route("/signup", web::post().to(auth_handlers::signup_handler))
          .route("/signin", web::post().to(auth_handlers::signin_handler))
          .route("/signout", web::post().to(auth_handlers::signout_handler)),
      )
      .route("/products", web::get().to(product_handlers::list_products_handler))
      .service(
        web::scope("/cart")
          .route("", web::get().to(cart_handlers::get_cart_handler))
          .route("", web::delete().to(cart_handlers::clear_cart_handler))
          .route("/items", web::post().to(cart_handlers::add_item_handler))
          .route("/items/{product_id}", web::patch().to(cart_handlers::update_item_handler))
          .route("/items/{product_id}", web::delete().to(cart_handlers::remove_item_handler))
          .route("/checkout", web::post().to(cart_handlers::proceed_to_checkout_handler)),
      )
      .service(
        web::scope("/checkout")
          .route("", web::get().to(checkout_handlers::get_checkout_handler))
          .route("/orders", web::post().to(checkout_handlers::place_order_handler)),
      )
      .service(
        web::scope("/orders")
          .app_data(web::PayloadConfig::new(PROOF_BODY_LIMIT))
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("/{order_id}/payment", web::get().to(order_handlers::get_payment_handler))
          .route("/{order_id}/payment-proof", web::post().to(order_handlers::submit_proof_handler))
          .route(
            "/{order_id}/simulate-payment",
            web::post().to(order_handlers::simulate_payment_handler),
          )
          .route("/{order_id}/ratings", web::get().to(order_handlers::get_ratings_handler))
          .route("/{order_id}/ratings", web::post().to(order_handlers::submit_ratings_handler)),
      )
      .service(
        web::scope("/profile")
          .route("", web::get().to(profile_handlers::get_profile_handler))
          .route("", web::put().to(profile_handlers::update_profile_handler)),
      ),
  );
}
