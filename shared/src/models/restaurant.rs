//! Restaurant model

use serde::{Deserialize, Serialize};

/// Restaurant entity. Owned by exactly one user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Restaurant {
    pub id: i64,
    /// Owning user account
    pub user_id: i64,
    pub name: String,
    pub phone: String,
    pub address: String,
    /// Creation timestamp (Unix millis)
    pub created_at: i64,
}
