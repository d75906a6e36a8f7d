//! Fire-and-forget settlement events.
//!
//! The payment flow publishes events onto a bounded channel and carries on. A single [`EventHandler`] per event type
//! drains the channel and runs the registered hook for every event in its own task. Hooks see the event and nothing
//! else; anything they need (a database handle, a gateway client) must be captured when the hook is built.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

/// The future returned by an event hook.
pub type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

pub type Handler<E> = Arc<dyn Fn(E) -> HookFuture + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    name: &'static str,
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(name: &'static str, buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, listener) = mpsc::channel(buffer_size);
        Self { name, listener, sender, handler }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Runs until every producer has been dropped, then waits for the hooks that are still running.
    ///
    /// A hook that panics is logged and does not take the handler down with it.
    pub async fn start_handler(self) {
        let Self { name, mut listener, sender, handler } = self;
        debug!("📬️ Starting {name} event handler");
        // Only producers handed out by `subscribe` keep the channel open
        drop(sender);
        let mut jobs = JoinSet::new();
        while let Some(ev) = listener.recv().await {
            trace!("📬️ {name} event received");
            jobs.spawn((handler)(ev));
            // Reap finished jobs so the set does not grow without bound on a long-lived server
            while let Some(done) = jobs.try_join_next() {
                log_job_result(name, done);
            }
        }
        if !jobs.is_empty() {
            debug!("📬️ Waiting for {} {name} hooks to complete", jobs.len());
        }
        while let Some(done) = jobs.join_next().await {
            log_job_result(name, done);
        }
        debug!("📬️ {name} event handler has shut down");
    }
}

fn log_job_result(name: &str, result: Result<(), tokio::task::JoinError>) {
    match result {
        Ok(()) => trace!("📬️ {name} event handled"),
        Err(e) if e.is_panic() => error!("📬️ A {name} hook panicked. The event has been dropped. {e}"),
        Err(e) => warn!("📬️ A {name} hook was cancelled. {e}"),
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to send event. The handler has gone away. {e}");
        }
    }
}
