//! Razorpay payment gateway.
//!
//! Orders are registered through the Orders REST API with basic auth;
//! checkout signatures are verified locally with the key secret. Amounts on
//! the wire are minor units (paise).

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{signing, to_minor_units, GatewayOrder, PaymentError, PaymentGateway, Result};

const ORDERS_URL: &str = "https://api.razorpay.com/v1/orders";

pub struct RazorpayGateway {
    key_id: String,
    key_secret: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
    amount: i64,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    description: String,
}

impl RazorpayGateway {
    pub fn new(key_id: String, key_secret: String) -> Self {
        Self {
            key_id,
            key_secret,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    #[instrument(skip(self), fields(receipt = %receipt))]
    async fn create_order(&self, amount: Decimal, currency: &str, receipt: &str) -> Result<GatewayOrder> {
        let body = CreateOrderBody {
            amount: to_minor_units(amount)?,
            currency,
            receipt,
        };

        let response = self
            .client
            .post(ORDERS_URL)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| PaymentError::GatewayApi(format!("order create request: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let description = response
                .json::<ErrorResponse>()
                .await
                .map(|e| e.error.description)
                .unwrap_or_else(|_| "unreadable error body".to_string());
            return Err(PaymentError::GatewayApi(format!("order create returned {status}: {description}")));
        }

        let order: OrderResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::GatewayApi(format!("order create response: {e}")))?;

        tracing::info!("Created razorpay order {}", order.id);

        Ok(GatewayOrder {
            order_id: order.id,
            amount_minor: order.amount,
            currency: order.currency,
        })
    }

    fn verify_payment_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> Result<()> {
        if signing::verify_payment(order_id, payment_id, signature, &self.key_secret) {
            Ok(())
        } else {
            Err(PaymentError::InvalidSignature)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_verification_roundtrip() {
        let gateway = RazorpayGateway::new("rzp_test_key".to_string(), "rzp_test_secret".to_string());

        let signature = signing::sign_payment("order_abc", "pay_def", "rzp_test_secret");
        assert!(gateway.verify_payment_signature("order_abc", "pay_def", &signature).is_ok());

        let err = gateway.verify_payment_signature("order_abc", "pay_def", "tampered").unwrap_err();
        assert!(matches!(err, PaymentError::InvalidSignature));
    }

    #[test]
    fn test_key_id_exposed_for_checkout() {
        let gateway = RazorpayGateway::new("rzp_test_key".to_string(), "secret".to_string());
        assert_eq!(gateway.key_id(), "rzp_test_key");
    }
}
