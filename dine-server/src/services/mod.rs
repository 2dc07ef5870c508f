//! Service layer: outbound integrations and pure helpers
//!
//! - [`PaymentGateway`] - checkout sessions and transaction status (Midtrans)
//! - [`NutritionEstimator`] - composition to nutrition facts
//! - [`qr`] - table QR code rendering

pub mod nutrition;
pub mod payment;
pub mod qr;

pub use nutrition::{
    FallbackEstimator, GenerativeEstimator, KeywordEstimator, NutritionError, NutritionEstimator,
};
pub use payment::{
    GatewayNotification, MidtransGateway, PaymentError, PaymentGateway, SnapTransaction,
};
