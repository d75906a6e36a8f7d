pub mod paystack;
pub mod payouts;
