//! HMAC-SHA256 signing for Razorpay payment verification.
//!
//! Razorpay signs a captured checkout payment as:
//! `hex(hmac_sha256(key_secret, "{order_id}|{payment_id}"))`
//! and returns it to the browser, which forwards it to the verify endpoint.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the expected signature for an (order, payment) pair.
pub fn sign_payment(order_id: &str, payment_id: &str, secret: &str) -> String {
    let signed_content = format!("{order_id}|{payment_id}");

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(signed_content.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a payment signature.
///
/// Returns `true` if the signature matches the (order, payment) pair.
pub fn verify_payment(order_id: &str, payment_id: &str, signature: &str, secret: &str) -> bool {
    let expected = sign_payment(order_id, payment_id, secret);

    // Use constant-time comparison to prevent timing attacks
    constant_time_eq(signature.as_bytes(), expected.as_bytes())
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_is_deterministic() {
        let s1 = sign_payment("order_abc", "pay_def", "secret");
        let s2 = sign_payment("order_abc", "pay_def", "secret");
        assert_eq!(s1, s2);
        // hex-encoded SHA256 HMAC is 64 chars
        assert_eq!(s1.len(), 64);
        assert!(s1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_sign_and_verify() {
        let secret = "rzp_test_secret";
        let signature = sign_payment("order_123", "pay_456", secret);

        assert!(verify_payment("order_123", "pay_456", &signature, secret));

        // Wrong payment id should fail
        assert!(!verify_payment("order_123", "pay_999", &signature, secret));

        // Wrong order id should fail
        assert!(!verify_payment("order_999", "pay_456", &signature, secret));

        // Wrong secret should fail
        assert!(!verify_payment("order_123", "pay_456", &signature, "other_secret"));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        assert!(!verify_payment("order_123", "pay_456", "", "secret"));
        assert!(!verify_payment("order_123", "pay_456", "not-hex-and-wrong-length", "secret"));
    }
}
