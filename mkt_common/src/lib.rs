pub mod helpers;
mod naira;
pub mod op;
mod secret;

pub use naira::{Naira, NairaConversionError, NAIRA_CURRENCY_CODE};
pub use secret::Secret;
