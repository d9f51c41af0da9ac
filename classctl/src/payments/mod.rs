//! Payment gateway abstraction layer.
//!
//! This module defines the `PaymentGateway` trait which abstracts payment
//! processing across providers. Order creation and signature verification are
//! the only two operations the platform needs: everything else (card entry,
//! 3DS, wallets) happens on the gateway's hosted checkout.

use async_trait::async_trait;
use axum::http::StatusCode;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::config::PaymentConfig;

pub mod dummy;
pub mod razorpay;
pub mod signing;

/// Create a payment gateway from configuration.
///
/// This is the single point where config turns into a gateway instance.
/// Adding a new provider requires adding a match arm here.
pub fn create_gateway(config: &PaymentConfig) -> Arc<dyn PaymentGateway> {
    match config {
        PaymentConfig::Razorpay { key_id, key_secret } => Arc::new(razorpay::RazorpayGateway::new(key_id.clone(), key_secret.clone())),
        PaymentConfig::Dummy {} => Arc::new(dummy::DummyGateway::default()),
    }
}

/// Result type for payment gateway operations
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Errors that can occur during payment processing
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment gateway API error: {0}")]
    GatewayApi(String),

    #[error("Signature verification failed")]
    InvalidSignature,

    #[error("Invalid payment data: {0}")]
    InvalidData(String),
}

impl From<PaymentError> for StatusCode {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::InvalidSignature | PaymentError::InvalidData(_) => StatusCode::BAD_REQUEST,
            PaymentError::GatewayApi(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PaymentError> for crate::errors::Error {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::InvalidSignature => crate::errors::Error::BadRequest {
                message: "Signature verification failed".to_string(),
            },
            PaymentError::InvalidData(message) => crate::errors::Error::BadRequest { message },
            PaymentError::GatewayApi(detail) => crate::errors::Error::Internal {
                operation: format!("payment gateway call: {detail}"),
            },
        }
    }
}

/// An order registered with the gateway, to be settled by the client-side
/// checkout flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayOrder {
    /// Gateway-assigned order id (e.g. "order_JXy...")
    pub order_id: String,
    /// Amount in minor units (paise for INR)
    pub amount_minor: i64,
    pub currency: String,
}

/// Convert a decimal major-unit amount to minor units (rupees -> paise).
pub fn to_minor_units(amount: Decimal) -> std::result::Result<i64, PaymentError> {
    use rust_decimal::prelude::ToPrimitive;

    (amount * Decimal::from(100))
        .round()
        .to_i64()
        .ok_or_else(|| PaymentError::InvalidData(format!("amount out of range: {amount}")))
}

/// Abstract payment gateway interface.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Public key id the browser checkout needs to open the payment widget.
    fn key_id(&self) -> &str;

    /// Register an order with the gateway.
    ///
    /// # Arguments
    /// * `amount` - major units (e.g. rupees)
    /// * `currency` - ISO currency code
    /// * `receipt` - merchant-side receipt reference
    async fn create_order(&self, amount: Decimal, currency: &str, receipt: &str) -> Result<GatewayOrder>;

    /// Verify the signature the gateway's checkout returned for a captured
    /// payment. Must be constant-time with respect to the signature value.
    fn verify_payment_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_minor_units() {
        assert_eq!(to_minor_units(Decimal::new(49999, 2)).unwrap(), 49999); // 499.99
        assert_eq!(to_minor_units(Decimal::from(1500)).unwrap(), 150000);
        assert_eq!(to_minor_units(Decimal::ZERO).unwrap(), 0);
    }

    #[test]
    fn test_payment_error_status_codes() {
        assert_eq!(StatusCode::from(PaymentError::InvalidSignature), StatusCode::BAD_REQUEST);
        assert_eq!(
            StatusCode::from(PaymentError::GatewayApi("down".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
