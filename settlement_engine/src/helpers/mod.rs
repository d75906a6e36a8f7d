mod cas;
mod order_number;

pub use cas::{retry_on_conflict, CasAttempt, DEFAULT_CAS_ATTEMPTS};
pub use order_number::{is_valid_order_number, new_order_number};

/// Claimed prices come from the client as floating point numbers. Anything within a kobo of the authoritative value is
/// considered a match.
pub const PRICE_EPSILON: f64 = 0.01;

pub fn prices_match(claimed: f64, authoritative: f64) -> bool {
    (claimed - authoritative).abs() <= PRICE_EPSILON
}
