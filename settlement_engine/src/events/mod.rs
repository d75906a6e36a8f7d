mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler, HookFuture};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
