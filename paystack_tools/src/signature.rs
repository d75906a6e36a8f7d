//! Webhook authentication.
//!
//! Paystack signs every webhook with an HMAC-SHA512 of the raw request body, keyed with the merchant secret key, and
//! sends the hex digest in the `x-paystack-signature` header.
use hmac::{Hmac, Mac};
use log::trace;
use sha2::Sha512;

pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

type HmacSha512 = Hmac<Sha512>;

/// Calculates the hex-encoded HMAC-SHA512 of `data` keyed with `secret`.
pub fn calculate_signature(secret: &str, data: &[u8]) -> String {
    // Hmac accepts keys of any length, so this cannot fail
    let mut mac = match HmacSha512::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC accepts keys of any size"),
    };
    mac.update(data);
    hex::encode(mac.finalize().into_bytes())
}

/// Checks `signature` (hex) against the HMAC-SHA512 of `data`. The comparison is constant-time.
pub fn verify_signature(secret: &str, data: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        trace!("🔐️ Signature is not valid hex");
        return false;
    };
    let mut mac = match HmacSha512::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(data);
    mac.verify_slice(&expected).is_ok()
}
