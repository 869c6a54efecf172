//! Restaurant endpoints

use axum::extract::{Path, Query, State};
use axum::Extension;
use serde::{Deserialize, Serialize};
use shared::error::{ApiResponse, AppError, ErrorCode};

use crate::auth::{Principal, Role};
use crate::db::{orders, restaurants};
use crate::error::ServiceError;
use crate::state::AppState;

async fn resolve_restaurant(
    state: &AppState,
    principal: &Principal,
) -> Result<shared::models::Restaurant, ServiceError> {
    principal.require_role(Role::Restaurant)?;
    restaurants::find_by_user(&state.pool, principal.user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::RestaurantProfileNotFound).into())
}

/// Flip one of this restaurant's orders from COOKING to READY.
///
/// The guarded UPDATE decides the happy path; a miss is re-fetched once
/// to report why it failed.
pub async fn mark_ready(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(order_id): Path<i64>,
) -> Result<ApiResponse<()>, ServiceError> {
    let restaurant = resolve_restaurant(&state, &principal).await?;

    if orders::mark_ready(&state.pool, order_id, restaurant.id).await? {
        return Ok(ApiResponse::ok());
    }

    let order = orders::find_order(&state.pool, order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    if order.restaurant_id != restaurant.id {
        return Err(AppError::new(ErrorCode::NotOrderOwner).into());
    }
    Err(AppError::new(ErrorCode::InvalidTransition)
        .with_detail("status", format!("{:?}", order.status))
        .into())
}

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    pub since: i64,
}

#[derive(Debug, Serialize)]
pub struct NotificationPayload {
    pub count: i64,
}

/// Poll-based order notification: how many orders arrived after `since`
pub async fn notification(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(q): Query<NotificationQuery>,
) -> Result<ApiResponse<NotificationPayload>, ServiceError> {
    let restaurant = resolve_restaurant(&state, &principal).await?;
    let count = orders::count_created_since(&state.pool, restaurant.id, q.since).await?;
    Ok(ApiResponse::success(NotificationPayload { count }))
}
