//! Driver model

use crate::error::{AppError, ErrorCode};
use serde::{Deserialize, Serialize};

/// Driver entity, linked 1:1 to a user account.
///
/// Location is a structured coordinate pair, not free text; both fields
/// are null until the driver reports a position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Driver {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Creation timestamp (Unix millis)
    pub created_at: i64,
}

impl Driver {
    /// Last reported position, if any
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        }
    }
}

/// Validated geographic coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Build a coordinate, rejecting out-of-range or non-finite values.
    pub fn new(lat: f64, lng: f64) -> Result<Self, AppError> {
        if !lat.is_finite() || !lng.is_finite() || !(-90.0..=90.0).contains(&lat)
            || !(-180.0..=180.0).contains(&lng)
        {
            return Err(AppError::new(ErrorCode::InvalidCoordinates)
                .with_detail("lat", lat.to_string())
                .with_detail("lng", lng.to_string()));
        }
        Ok(Self { lat, lng })
    }
}
