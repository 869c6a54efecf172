//! Shared types for the Mealdrop platform
//!
//! Common types used across crates: the unified error system,
//! domain models (restaurants, meals, orders, drivers) and small
//! utilities.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use models::order::{Order, OrderItem, OrderStatus};
