//! Order model and status state machine

use crate::error::{AppError, ErrorCode};
use serde::{Deserialize, Serialize};

/// Order status.
///
/// The lifecycle is strictly linear; `allowed_next` is the single
/// source of truth for transitions and every mutation goes through
/// [`OrderStatus::transition_to`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i16)]
pub enum OrderStatus {
    Cooking = 1,
    Ready = 2,
    OnTheWay = 3,
    Delivered = 4,
}

impl OrderStatus {
    /// The only status reachable from this one, if any
    pub const fn allowed_next(&self) -> Option<OrderStatus> {
        match self {
            Self::Cooking => Some(Self::Ready),
            Self::Ready => Some(Self::OnTheWay),
            Self::OnTheWay => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }

    /// Terminal state: nothing may follow Delivered
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// Validate a transition, rejecting regressive or skipping moves.
    pub fn transition_to(&self, next: OrderStatus) -> Result<OrderStatus, AppError> {
        if self.allowed_next() == Some(next) {
            Ok(next)
        } else {
            Err(AppError::new(ErrorCode::InvalidTransition)
                .with_detail("from", format!("{self:?}"))
                .with_detail("to", format!("{next:?}")))
        }
    }

    /// Numeric value as stored in the database
    #[inline]
    pub const fn as_i16(&self) -> i16 {
        *self as i16
    }
}

impl TryFrom<i16> for OrderStatus {
    type Error = AppError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Cooking),
            2 => Ok(Self::Ready),
            3 => Ok(Self::OnTheWay),
            4 => Ok(Self::Delivered),
            other => Err(AppError::internal(format!("invalid order status: {other}"))),
        }
    }
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub restaurant_id: i64,
    /// Null until a driver claims the order
    pub driver_id: Option<i64>,
    pub address: String,
    /// Total in minor currency units; equals the sum of item subtotals
    pub total: i64,
    pub status: OrderStatus,
    /// Creation timestamp (Unix millis)
    pub created_at: i64,
    /// Claim timestamp (Unix millis), null until picked up
    pub picked_at: Option<i64>,
}

/// Order line item.
///
/// `subtotal` snapshots `meal.price * quantity` at order time; later
/// price changes never touch existing orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub meal_id: i64,
    pub quantity: i32,
    /// Snapshotted price * quantity in minor currency units
    pub subtotal: i64,
}

/// One line of a submitted cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartLine {
    pub meal_id: i64,
    pub quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_transitions_allowed() {
        assert_eq!(
            OrderStatus::Cooking.transition_to(OrderStatus::Ready).unwrap(),
            OrderStatus::Ready
        );
        assert_eq!(
            OrderStatus::Ready.transition_to(OrderStatus::OnTheWay).unwrap(),
            OrderStatus::OnTheWay
        );
        assert_eq!(
            OrderStatus::OnTheWay
                .transition_to(OrderStatus::Delivered)
                .unwrap(),
            OrderStatus::Delivered
        );
    }

    #[test]
    fn test_skipping_transitions_rejected() {
        assert!(OrderStatus::Cooking.transition_to(OrderStatus::OnTheWay).is_err());
        assert!(OrderStatus::Cooking.transition_to(OrderStatus::Delivered).is_err());
        assert!(OrderStatus::Ready.transition_to(OrderStatus::Delivered).is_err());
    }

    #[test]
    fn test_regressive_transitions_rejected() {
        assert!(OrderStatus::Ready.transition_to(OrderStatus::Cooking).is_err());
        assert!(OrderStatus::OnTheWay.transition_to(OrderStatus::Ready).is_err());
        assert!(OrderStatus::Delivered.transition_to(OrderStatus::OnTheWay).is_err());
    }

    #[test]
    fn test_self_transition_rejected() {
        for s in [
            OrderStatus::Cooking,
            OrderStatus::Ready,
            OrderStatus::OnTheWay,
            OrderStatus::Delivered,
        ] {
            assert!(s.transition_to(s).is_err());
        }
    }

    #[test]
    fn test_delivered_is_terminal() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Delivered.allowed_next().is_none());
        assert!(!OrderStatus::OnTheWay.is_terminal());
    }

    #[test]
    fn test_transition_error_code() {
        let err = OrderStatus::Delivered
            .transition_to(OrderStatus::Cooking)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
    }

    #[test]
    fn test_i16_roundtrip() {
        for s in [
            OrderStatus::Cooking,
            OrderStatus::Ready,
            OrderStatus::OnTheWay,
            OrderStatus::Delivered,
        ] {
            assert_eq!(OrderStatus::try_from(s.as_i16()).unwrap(), s);
        }
        assert!(OrderStatus::try_from(0).is_err());
        assert!(OrderStatus::try_from(5).is_err());
    }

    #[test]
    fn test_status_serde_names() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::OnTheWay).unwrap(),
            "\"ON_THE_WAY\""
        );
        let s: OrderStatus = serde_json::from_str("\"COOKING\"").unwrap();
        assert_eq!(s, OrderStatus::Cooking);
    }
}
