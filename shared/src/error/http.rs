//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::CartItemNotFound
            | Self::OrderNotFound
            | Self::ReviewNotFound
            | Self::MenuItemNotFound
            | Self::TableNotFound
            | Self::UserNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::OrderNotDeletable
            | Self::TableNumberExists
            | Self::UsernameExists => StatusCode::CONFLICT,

            // 422 Unprocessable (business rules)
            Self::InvalidStatusTransition | Self::OrderEmpty | Self::MenuItemOutOfStock => {
                StatusCode::UNPROCESSABLE_ENTITY
            }

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::AccountDisabled => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied
            | Self::AdminRequired
            | Self::CannotDeleteSelf
            | Self::InvalidSignature
            | Self::QrCodeExpired => StatusCode::FORBIDDEN,

            // 413 Payload Too Large
            Self::FileTooLarge => StatusCode::PAYLOAD_TOO_LARGE,

            // 502 Bad Gateway (upstream provider failed)
            Self::PaymentFailed | Self::PaymentGatewayError => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::NetworkError | Self::TimeoutError => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::Unknown
            | Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError
            | Self::NutritionEstimateFailed
            | Self::QrGenerationFailed
            | Self::FileStorageFailed => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
