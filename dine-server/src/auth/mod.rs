//! Authentication and authorization
//!
//! - [`JwtService`] - token issue/validation
//! - [`CurrentUser`] - authenticated user context
//! - [`require_auth`] - authentication middleware
//! - [`require_permission`] - permission middleware

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod permissions;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{TOKEN_COOKIE, require_admin, require_auth, require_permission};
