//! Unified error codes for the Mealdrop platform
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Catalog errors
//! - 7xxx: Delivery errors
//! - 8xxx: Account errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Customer already has an undelivered order
    ActiveOrderExists = 4002,
    /// Order has already been picked up by another driver
    OrderAlreadyPicked = 4003,
    /// Order is empty
    OrderEmpty = 4004,
    /// Status transition not allowed
    InvalidTransition = 4005,
    /// Payment captured but order commit failed (reconciliation required)
    OrderCommitFailed = 4006,
    /// Order belongs to a different actor
    NotOrderOwner = 4007,

    // ==================== 5xxx: Payment ====================
    /// Payment charge was declined
    PaymentFailed = 5001,
    /// Payment outcome unknown (timeout / transport failure)
    PaymentUnresolved = 5002,
    /// Refund attempt failed
    PaymentRefundFailed = 5003,
    /// Duplicate idempotency key
    DuplicatePaymentRequest = 5004,

    // ==================== 6xxx: Catalog ====================
    /// Restaurant not found
    RestaurantNotFound = 6001,
    /// Meal not found
    MealNotFound = 6002,
    /// Meal belongs to a different restaurant
    MealWrongRestaurant = 6003,

    // ==================== 7xxx: Delivery ====================
    /// Driver already has an active delivery
    DriverBusy = 7001,
    /// Latitude/longitude out of range
    InvalidCoordinates = 7002,

    // ==================== 8xxx: Account ====================
    /// Customer profile not found
    CustomerNotFound = 8001,
    /// Driver profile not found
    DriverNotFound = 8002,
    /// Restaurant profile not found
    RestaurantProfileNotFound = 8003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid credentials",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Specific role is required",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::ActiveOrderExists => "Your last order must be delivered first",
            ErrorCode::OrderAlreadyPicked => "Order has been picked up by another driver",
            ErrorCode::OrderEmpty => "Order is empty",
            ErrorCode::InvalidTransition => "Order status transition not allowed",
            ErrorCode::OrderCommitFailed => "Order could not be recorded after payment",
            ErrorCode::NotOrderOwner => "Order belongs to a different account",

            // Payment
            ErrorCode::PaymentFailed => "Payment was declined",
            ErrorCode::PaymentUnresolved => "Payment outcome unknown, will be reconciled",
            ErrorCode::PaymentRefundFailed => "Refund attempt failed",
            ErrorCode::DuplicatePaymentRequest => "Duplicate payment request",

            // Catalog
            ErrorCode::RestaurantNotFound => "Restaurant not found",
            ErrorCode::MealNotFound => "Meal not found",
            ErrorCode::MealWrongRestaurant => "Meal belongs to a different restaurant",

            // Delivery
            ErrorCode::DriverBusy => "Driver already has an active delivery",
            ErrorCode::InvalidCoordinates => "Coordinates are out of range",

            // Account
            ErrorCode::CustomerNotFound => "Customer profile not found",
            ErrorCode::DriverNotFound => "Driver profile not found",
            ErrorCode::RestaurantProfileNotFound => "Restaurant profile not found",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::ActiveOrderExists),
            4003 => Ok(ErrorCode::OrderAlreadyPicked),
            4004 => Ok(ErrorCode::OrderEmpty),
            4005 => Ok(ErrorCode::InvalidTransition),
            4006 => Ok(ErrorCode::OrderCommitFailed),
            4007 => Ok(ErrorCode::NotOrderOwner),

            // Payment
            5001 => Ok(ErrorCode::PaymentFailed),
            5002 => Ok(ErrorCode::PaymentUnresolved),
            5003 => Ok(ErrorCode::PaymentRefundFailed),
            5004 => Ok(ErrorCode::DuplicatePaymentRequest),

            // Catalog
            6001 => Ok(ErrorCode::RestaurantNotFound),
            6002 => Ok(ErrorCode::MealNotFound),
            6003 => Ok(ErrorCode::MealWrongRestaurant),

            // Delivery
            7001 => Ok(ErrorCode::DriverBusy),
            7002 => Ok(ErrorCode::InvalidCoordinates),

            // Account
            8001 => Ok(ErrorCode::CustomerNotFound),
            8002 => Ok(ErrorCode::DriverNotFound),
            8003 => Ok(ErrorCode::RestaurantProfileNotFound),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        // General
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::NotFound.code(), 3);

        // Auth
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::TokenExpired.code(), 1003);
        assert_eq!(ErrorCode::TokenInvalid.code(), 1004);

        // Order
        assert_eq!(ErrorCode::OrderNotFound.code(), 4001);
        assert_eq!(ErrorCode::ActiveOrderExists.code(), 4002);
        assert_eq!(ErrorCode::OrderAlreadyPicked.code(), 4003);
        assert_eq!(ErrorCode::InvalidTransition.code(), 4005);
        assert_eq!(ErrorCode::OrderCommitFailed.code(), 4006);

        // Payment
        assert_eq!(ErrorCode::PaymentFailed.code(), 5001);
        assert_eq!(ErrorCode::PaymentUnresolved.code(), 5002);

        // Catalog
        assert_eq!(ErrorCode::RestaurantNotFound.code(), 6001);
        assert_eq!(ErrorCode::MealNotFound.code(), 6002);

        // Delivery
        assert_eq!(ErrorCode::DriverBusy.code(), 7001);
        assert_eq!(ErrorCode::InvalidCoordinates.code(), 7002);

        // System
        assert_eq!(ErrorCode::InternalError.code(), 9001);
        assert_eq!(ErrorCode::DatabaseError.code(), 9002);
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(0), Ok(ErrorCode::Success));
        assert_eq!(ErrorCode::try_from(1001), Ok(ErrorCode::NotAuthenticated));
        assert_eq!(ErrorCode::try_from(4002), Ok(ErrorCode::ActiveOrderExists));
        assert_eq!(ErrorCode::try_from(5001), Ok(ErrorCode::PaymentFailed));
        assert_eq!(ErrorCode::try_from(9001), Ok(ErrorCode::InternalError));
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(3001), Err(InvalidErrorCode(3001)));
        assert_eq!(ErrorCode::try_from(10000), Err(InvalidErrorCode(10000)));
    }

    #[test]
    fn test_serialize_as_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::NotFound).unwrap(), "3");
        assert_eq!(
            serde_json::to_string(&ErrorCode::OrderNotFound).unwrap(),
            "4001"
        );
    }

    #[test]
    fn test_deserialize_roundtrip() {
        let codes = [
            ErrorCode::Success,
            ErrorCode::NotAuthenticated,
            ErrorCode::ActiveOrderExists,
            ErrorCode::PaymentUnresolved,
            ErrorCode::InternalError,
        ];
        for code in codes {
            let json = serde_json::to_string(&code).unwrap();
            let parsed: ErrorCode = serde_json::from_str(&json).unwrap();
            assert_eq!(code, parsed);
        }
    }

    #[test]
    fn test_deserialize_invalid() {
        let result: Result<ErrorCode, _> = serde_json::from_str("999");
        assert!(result.is_err());
    }

    #[test]
    fn test_message() {
        assert_eq!(ErrorCode::OrderNotFound.message(), "Order not found");
        assert_eq!(
            ErrorCode::ActiveOrderExists.message(),
            "Your last order must be delivered first"
        );
        assert_eq!(ErrorCode::InternalError.message(), "Internal server error");
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ErrorCode::Success), "0");
        assert_eq!(format!("{}", ErrorCode::OrderNotFound), "4001");
    }
}
