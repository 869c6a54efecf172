//! Driver endpoints

use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{GeoPoint, Order};
use shared::util::now_millis;

use crate::auth::{Principal, Role};
use crate::db::{drivers, orders};
use crate::error::ServiceError;
use crate::services::revenue::{self, WeekRevenue};
use crate::state::AppState;

async fn resolve_driver(
    state: &AppState,
    principal: &Principal,
) -> Result<shared::models::Driver, ServiceError> {
    principal.require_role(Role::Driver)?;
    drivers::find_by_user(&state.pool, principal.user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::DriverNotFound).into())
}

#[derive(Debug, Serialize)]
pub struct OrdersPayload {
    pub orders: Vec<Order>,
}

pub async fn ready_orders(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<ApiResponse<OrdersPayload>, ServiceError> {
    resolve_driver(&state, &principal).await?;
    let orders = orders::list_ready_unassigned(&state.pool).await?;
    Ok(ApiResponse::success(OrdersPayload { orders }))
}

#[derive(Debug, Deserialize)]
pub struct OrderRef {
    pub order_id: i64,
}

/// Claim a READY order. The conditional UPDATE is the race arbiter;
/// exactly one concurrent driver wins, and a driver with a delivery
/// already underway cannot win a second one.
pub async fn pick_order(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<OrderRef>,
) -> Result<ApiResponse<()>, ServiceError> {
    let driver = resolve_driver(&state, &principal).await?;

    if orders::claim_order(&state.pool, req.order_id, driver.id, now_millis()).await? {
        return Ok(ApiResponse::ok());
    }

    // Claim lost; re-read to say why.
    if orders::driver_has_on_the_way(&state.pool, driver.id).await? {
        return Err(AppError::new(ErrorCode::DriverBusy).into());
    }
    let order = orders::find_order(&state.pool, req.order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    if order.driver_id.is_some() {
        return Err(AppError::new(ErrorCode::OrderAlreadyPicked).into());
    }
    Err(AppError::new(ErrorCode::InvalidTransition)
        .with_detail("status", format!("{:?}", order.status))
        .into())
}

pub async fn complete_order(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<OrderRef>,
) -> Result<ApiResponse<()>, ServiceError> {
    let driver = resolve_driver(&state, &principal).await?;

    if orders::complete_order(&state.pool, req.order_id, driver.id).await? {
        return Ok(ApiResponse::ok());
    }

    let order = orders::find_order(&state.pool, req.order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    if order.driver_id != Some(driver.id) {
        return Err(AppError::new(ErrorCode::NotOrderOwner).into());
    }
    Err(AppError::new(ErrorCode::InvalidTransition)
        .with_detail("status", format!("{:?}", order.status))
        .into())
}

pub async fn latest_order(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<ApiResponse<Order>, ServiceError> {
    let driver = resolve_driver(&state, &principal).await?;
    let order = orders::latest_for_driver(&state.pool, driver.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    Ok(ApiResponse::success(order))
}

#[derive(Debug, Deserialize)]
pub struct LocationUpdate {
    pub lat: f64,
    pub lng: f64,
}

pub async fn update_location(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<LocationUpdate>,
) -> Result<ApiResponse<()>, ServiceError> {
    let driver = resolve_driver(&state, &principal).await?;
    let point = GeoPoint::new(req.lat, req.lng)?;
    drivers::update_location(&state.pool, driver.id, point.lat, point.lng).await?;
    Ok(ApiResponse::ok())
}

#[derive(Debug, Deserialize)]
pub struct RevenueQuery {
    /// Reference instant (Unix millis); defaults to now
    pub at: Option<i64>,
}

pub async fn revenue(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(q): Query<RevenueQuery>,
) -> Result<ApiResponse<WeekRevenue>, ServiceError> {
    let driver = resolve_driver(&state, &principal).await?;
    let at = q.at.unwrap_or_else(now_millis);
    let revenue = revenue::weekly_revenue(&state.pool, driver.id, at).await?;
    Ok(ApiResponse::success(revenue))
}
