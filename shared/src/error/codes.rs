//! Unified error codes for Dine
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Cart errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Menu errors (65xx: file upload)
//! - 7xxx: Table errors
//! - 8xxx: User / review errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Serialized as a bare `u16` so the web frontend can switch on it.
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
    NotAuthenticated = 1001,
    InvalidCredentials = 1002,
    TokenExpired = 1003,
    TokenInvalid = 1004,
    AccountDisabled = 1007,

    // ==================== 2xxx: Permission ====================
    PermissionDenied = 2001,
    AdminRequired = 2003,
    CannotDeleteSelf = 2005,

    // ==================== 3xxx: Cart ====================
    /// Item is not in the table's cart
    CartItemNotFound = 3001,

    // ==================== 4xxx: Order ====================
    OrderNotFound = 4001,
    /// Requested status change is not an edge of the lifecycle
    InvalidStatusTransition = 4002,
    /// Only pending orders can be deleted
    OrderNotDeletable = 4003,
    OrderEmpty = 4007,
    ReviewNotFound = 4101,

    // ==================== 5xxx: Payment ====================
    PaymentFailed = 5001,
    /// Payment gateway rejected the request or was unreachable
    PaymentGatewayError = 5002,
    /// Gateway notification is missing required fields
    InvalidNotification = 5003,
    /// Gateway notification signature does not match
    InvalidSignature = 5004,
    /// Gateway transaction status string is not recognised
    UnknownTransactionStatus = 5005,

    // ==================== 6xxx: Menu ====================
    MenuItemNotFound = 6001,
    MenuItemInvalidPrice = 6002,
    MenuItemOutOfStock = 6003,
    NutritionEstimateFailed = 6004,

    // ==================== 65xx: File Upload ====================
    FileTooLarge = 6501,
    UnsupportedFileFormat = 6502,
    InvalidImageFile = 6503,
    NoFileProvided = 6504,
    EmptyFile = 6505,
    FileStorageFailed = 6509,

    // ==================== 7xxx: Table ====================
    TableNotFound = 7001,
    TableNumberExists = 7002,
    QrGenerationFailed = 7003,
    /// Scanned QR code was replaced or deleted
    QrCodeExpired = 7004,

    // ==================== 8xxx: User ====================
    UserNotFound = 8001,
    UsernameExists = 8002,

    // ==================== 9xxx: System ====================
    InternalError = 9001,
    DatabaseError = 9002,
    NetworkError = 9003,
    TimeoutError = 9004,
    ConfigError = 9005,
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

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
            ErrorCode::InvalidCredentials => "Invalid username or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountDisabled => "Account is disabled",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::AdminRequired => "Administrator role is required",
            ErrorCode::CannotDeleteSelf => "Cannot delete the current user",

            // Cart
            ErrorCode::CartItemNotFound => "Item not found in cart",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::InvalidStatusTransition => "Order status transition is not allowed",
            ErrorCode::OrderNotDeletable => "Only pending orders can be deleted",
            ErrorCode::OrderEmpty => "Order is empty",
            ErrorCode::ReviewNotFound => "Review not found",

            // Payment
            ErrorCode::PaymentFailed => "Payment processing failed",
            ErrorCode::PaymentGatewayError => "Payment gateway error",
            ErrorCode::InvalidNotification => "Invalid payment notification",
            ErrorCode::InvalidSignature => "Invalid payment notification signature",
            ErrorCode::UnknownTransactionStatus => "Unknown transaction status",

            // Menu
            ErrorCode::MenuItemNotFound => "Menu item not found",
            ErrorCode::MenuItemInvalidPrice => "Menu item has invalid price",
            ErrorCode::MenuItemOutOfStock => "Menu item is out of stock",
            ErrorCode::NutritionEstimateFailed => "Nutrition estimate failed",

            // File Upload
            ErrorCode::FileTooLarge => "File is too large",
            ErrorCode::UnsupportedFileFormat => "Unsupported file format",
            ErrorCode::InvalidImageFile => "Invalid image file",
            ErrorCode::NoFileProvided => "No file provided",
            ErrorCode::EmptyFile => "Empty file provided",
            ErrorCode::FileStorageFailed => "Failed to store file",

            // Table
            ErrorCode::TableNotFound => "Table not found",
            ErrorCode::TableNumberExists => "Table number already exists",
            ErrorCode::QrGenerationFailed => "Failed to generate QR code",
            ErrorCode::QrCodeExpired => "QR code is no longer valid",

            // User
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::UsernameExists => "Username already exists",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
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
            1007 => Ok(ErrorCode::AccountDisabled),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2003 => Ok(ErrorCode::AdminRequired),
            2005 => Ok(ErrorCode::CannotDeleteSelf),

            // Cart
            3001 => Ok(ErrorCode::CartItemNotFound),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::InvalidStatusTransition),
            4003 => Ok(ErrorCode::OrderNotDeletable),
            4007 => Ok(ErrorCode::OrderEmpty),
            4101 => Ok(ErrorCode::ReviewNotFound),

            // Payment
            5001 => Ok(ErrorCode::PaymentFailed),
            5002 => Ok(ErrorCode::PaymentGatewayError),
            5003 => Ok(ErrorCode::InvalidNotification),
            5004 => Ok(ErrorCode::InvalidSignature),
            5005 => Ok(ErrorCode::UnknownTransactionStatus),

            // Menu
            6001 => Ok(ErrorCode::MenuItemNotFound),
            6002 => Ok(ErrorCode::MenuItemInvalidPrice),
            6003 => Ok(ErrorCode::MenuItemOutOfStock),
            6004 => Ok(ErrorCode::NutritionEstimateFailed),

            // File Upload
            6501 => Ok(ErrorCode::FileTooLarge),
            6502 => Ok(ErrorCode::UnsupportedFileFormat),
            6503 => Ok(ErrorCode::InvalidImageFile),
            6504 => Ok(ErrorCode::NoFileProvided),
            6505 => Ok(ErrorCode::EmptyFile),
            6509 => Ok(ErrorCode::FileStorageFailed),

            // Table
            7001 => Ok(ErrorCode::TableNotFound),
            7002 => Ok(ErrorCode::TableNumberExists),
            7003 => Ok(ErrorCode::QrGenerationFailed),
            7004 => Ok(ErrorCode::QrCodeExpired),

            // User
            8001 => Ok(ErrorCode::UserNotFound),
            8002 => Ok(ErrorCode::UsernameExists),

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
