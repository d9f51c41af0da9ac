//! No-op payment gateway for development and tests.
//!
//! Orders get a locally generated id and signatures are verified against a
//! fixed secret, so a full order -> checkout -> verify cycle can be exercised
//! without touching the network.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{signing, to_minor_units, GatewayOrder, PaymentError, PaymentGateway, Result};

pub const DUMMY_KEY_ID: &str = "dummy_key";
pub const DUMMY_KEY_SECRET: &str = "dummy_secret";

#[derive(Default)]
pub struct DummyGateway {}

#[async_trait]
impl PaymentGateway for DummyGateway {
    fn key_id(&self) -> &str {
        DUMMY_KEY_ID
    }

    async fn create_order(&self, amount: Decimal, currency: &str, _receipt: &str) -> Result<GatewayOrder> {
        Ok(GatewayOrder {
            order_id: format!("order_dummy_{}", Uuid::new_v4().simple()),
            amount_minor: to_minor_units(amount)?,
            currency: currency.to_string(),
        })
    }

    fn verify_payment_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> Result<()> {
        if signing::verify_payment(order_id, payment_id, signature, DUMMY_KEY_SECRET) {
            Ok(())
        } else {
            Err(PaymentError::InvalidSignature)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_full_cycle_without_network() {
        let gateway = DummyGateway::default();

        let order = gateway.create_order(Decimal::from(999), "INR", "ord_test").await.unwrap();
        assert!(order.order_id.starts_with("order_dummy_"));
        assert_eq!(order.amount_minor, 99900);

        // Simulate the checkout returning a signature
        let signature = signing::sign_payment(&order.order_id, "pay_test", DUMMY_KEY_SECRET);
        assert!(gateway.verify_payment_signature(&order.order_id, "pay_test", &signature).is_ok());
        assert!(gateway.verify_payment_signature(&order.order_id, "pay_test", "bad").is_err());
    }
}
