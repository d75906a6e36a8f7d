use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};

use crate::db_types::OrderNumber;

const SUFFIX_LEN: usize = 6;

/// Generates a new order number of the form `ORD-<unix millis>-<6 uppercase alphanumerics>`.
pub fn new_order_number() -> OrderNumber {
    let millis = Utc::now().timestamp_millis();
    let suffix = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect::<String>();
    OrderNumber(format!("ORD-{millis}-{suffix}"))
}

pub fn is_valid_order_number(s: &str) -> bool {
    let mut parts = s.splitn(3, '-');
    let (Some("ORD"), Some(millis), Some(suffix)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !millis.is_empty()
        && millis.chars().all(|c| c.is_ascii_digit())
        && suffix.len() == SUFFIX_LEN
        && suffix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}
