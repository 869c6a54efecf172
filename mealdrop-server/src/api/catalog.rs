//! Public catalog endpoints

use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{Meal, Restaurant};

use crate::db::{meals, restaurants};
use crate::error::ServiceError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CatalogPage {
    pub before_id: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RestaurantsPayload {
    pub restaurants: Vec<Restaurant>,
}

#[derive(Debug, Serialize)]
pub struct MealsPayload {
    pub meals: Vec<Meal>,
}

pub async fn list_restaurants(
    State(state): State<AppState>,
    Query(page): Query<CatalogPage>,
) -> Result<ApiResponse<RestaurantsPayload>, ServiceError> {
    let restaurants =
        restaurants::list_restaurants(&state.pool, page.before_id, page.limit).await?;
    Ok(ApiResponse::success(RestaurantsPayload { restaurants }))
}

pub async fn restaurant_meals(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<ApiResponse<MealsPayload>, ServiceError> {
    if restaurants::find_restaurant(&state.pool, id).await?.is_none() {
        return Err(AppError::new(ErrorCode::RestaurantNotFound).into());
    }
    let meals = meals::list_meals(&state.pool, id).await?;
    Ok(ApiResponse::success(MealsPayload { meals }))
}
