//! Customer endpoints

use axum::extract::State;
use axum::{Extension, Json};
use serde::Serialize;
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{GeoPoint, Order, OrderItem};

use crate::auth::{Principal, Role};
use crate::db::{customers, drivers, orders};
use crate::error::ServiceError;
use crate::services::placement::{self, PlaceOrderRequest};
use crate::state::AppState;

async fn resolve_customer(
    state: &AppState,
    principal: &Principal,
) -> Result<shared::models::Customer, ServiceError> {
    principal.require_role(Role::Customer)?;
    customers::find_by_user(&state.pool, principal.user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CustomerNotFound).into())
}

#[derive(Debug, Serialize)]
pub struct PlacedOrder {
    pub order_id: i64,
}

pub async fn place_order(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<ApiResponse<PlacedOrder>, ServiceError> {
    principal.require_role(Role::Customer)?;
    let order_id = placement::place_order(
        &state.pool,
        state.gateway.as_ref(),
        &state.currency,
        principal.user_id,
        req,
    )
    .await?;
    Ok(ApiResponse::success(PlacedOrder { order_id }))
}

#[derive(Debug, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

pub async fn latest_order(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<ApiResponse<OrderWithItems>, ServiceError> {
    let customer = resolve_customer(&state, &principal).await?;
    let order = orders::latest_for_customer(&state.pool, customer.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    let items = orders::items_for_order(&state.pool, order.id).await?;
    Ok(ApiResponse::success(OrderWithItems { order, items }))
}

#[derive(Debug, Serialize)]
pub struct DriverLocation {
    pub order_id: i64,
    pub location: Option<GeoPoint>,
}

/// Position of the driver carrying the customer's current delivery.
/// `location` is null until the driver has reported coordinates.
pub async fn driver_location(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<ApiResponse<DriverLocation>, ServiceError> {
    let customer = resolve_customer(&state, &principal).await?;
    let order = orders::on_the_way_for_customer(&state.pool, customer.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    let driver_id = order
        .driver_id
        .ok_or_else(|| AppError::new(ErrorCode::DriverNotFound))?;
    let driver = drivers::find_driver(&state.pool, driver_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::DriverNotFound))?;
    Ok(ApiResponse::success(DriverLocation {
        order_id: order.id,
        location: driver.location(),
    }))
}
