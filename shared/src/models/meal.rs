//! Meal model

use serde::{Deserialize, Serialize};

/// Meal entity. Belongs to exactly one restaurant.
///
/// `price` is in minor currency units (cents) to avoid floating-point
/// rounding in totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Meal {
    pub id: i64,
    pub restaurant_id: i64,
    pub name: String,
    pub description: String,
    /// Price in minor currency units
    pub price: i64,
    /// Creation timestamp (Unix millis)
    pub created_at: i64,
}
