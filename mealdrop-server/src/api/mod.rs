//! HTTP API
//!
//! Catalog routes are public; everything under /api/customer,
//! /api/restaurant and /api/driver requires a bearer token. Role
//! enforcement happens in the handlers, which resolve the principal to
//! its role-specific row before touching any order data.

use axum::routing::{get, post};
use axum::{middleware, Router};
use tower_http::trace::TraceLayer;

use crate::auth::auth_middleware;
use crate::state::AppState;

mod catalog;
mod customer;
mod driver;
mod health;
mod restaurant;

pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health::health))
        .route("/api/restaurants", get(catalog::list_restaurants))
        .route("/api/restaurants/{id}/meals", get(catalog::restaurant_meals));

    let customer = Router::new()
        .route("/api/customer/orders", post(customer::place_order))
        .route("/api/customer/orders/latest", get(customer::latest_order))
        .route(
            "/api/customer/orders/driver-location",
            get(customer::driver_location),
        );

    let restaurant = Router::new()
        .route(
            "/api/restaurant/orders/{id}/ready",
            post(restaurant::mark_ready),
        )
        .route(
            "/api/restaurant/orders/notification",
            get(restaurant::notification),
        );

    let driver = Router::new()
        .route("/api/driver/orders/ready", get(driver::ready_orders))
        .route("/api/driver/orders/pick", post(driver::pick_order))
        .route("/api/driver/orders/complete", post(driver::complete_order))
        .route("/api/driver/orders/latest", get(driver::latest_order))
        .route("/api/driver/location", post(driver::update_location))
        .route("/api/driver/revenue", get(driver::revenue));

    let protected = customer
        .merge(restaurant)
        .merge(driver)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    public
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
