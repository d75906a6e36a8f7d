use std::sync::Arc;

use log::*;

use crate::events::{EventHandler, EventProducer, Handler, HookFuture, OrderPaidEvent, StockAlertEvent};

/// The publishing side of every registered hook. An empty list means nobody is listening for that event.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_paid_producer: Vec<EventProducer<OrderPaidEvent>>,
    pub stock_alert_producer: Vec<EventProducer<StockAlertEvent>>,
}

impl EventProducers {
    pub async fn publish_order_paid(&self, event: OrderPaidEvent) {
        for producer in &self.order_paid_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_stock_alert(&self, event: StockAlertEvent) {
        for producer in &self.stock_alert_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_order_paid: Option<EventHandler<OrderPaidEvent>>,
    pub on_stock_alert: Option<EventHandler<StockAlertEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_paid = hooks.on_order_paid.map(|f| EventHandler::new("order_paid", buffer_size, f));
        let on_stock_alert = hooks.on_stock_alert.map(|f| EventHandler::new("stock_alert", buffer_size, f));
        Self { on_order_paid, on_stock_alert }
    }

    pub fn producers(&self) -> EventProducers {
        EventProducers {
            order_paid_producer: self.on_order_paid.iter().map(EventHandler::subscribe).collect(),
            stock_alert_producer: self.on_stock_alert.iter().map(EventHandler::subscribe).collect(),
        }
    }

    /// Spawns a task for each registered handler. Handlers stop by themselves once their producers are dropped.
    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_paid {
            spawn_handler(handler);
        }
        if let Some(handler) = self.on_stock_alert {
            spawn_handler(handler);
        }
    }
}

fn spawn_handler<E: Send + Sync + 'static>(handler: EventHandler<E>) {
    info!("📬️ Listening for {} events", handler.name());
    tokio::spawn(handler.start_handler());
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_paid: Option<Handler<OrderPaidEvent>>,
    pub on_stock_alert: Option<Handler<StockAlertEvent>>,
}

impl EventHooks {
    pub fn on_order_paid<F>(&mut self, f: F) -> &mut Self
    where F: Fn(OrderPaidEvent) -> HookFuture + Send + Sync + 'static {
        self.on_order_paid = Some(Arc::new(f));
        self
    }

    pub fn on_stock_alert<F>(&mut self, f: F) -> &mut Self
    where F: Fn(StockAlertEvent) -> HookFuture + Send + Sync + 'static {
        self.on_stock_alert = Some(Arc::new(f));
        self
    }
}
