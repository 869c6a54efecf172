//! Customer model

use serde::{Deserialize, Serialize};

/// Customer entity, linked 1:1 to a user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    /// Creation timestamp (Unix millis)
    pub created_at: i64,
}
