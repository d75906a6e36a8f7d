use serde::{Deserialize, Serialize};

use crate::db_types::{Order, StockAlert};

/// Emitted exactly once per order, by whichever caller won the `pending → successful` payment edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
}

impl OrderPaidEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Emitted when a paid order's stock could not be decremented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAlertEvent {
    pub alert: StockAlert,
}

impl StockAlertEvent {
    pub fn new(alert: StockAlert) -> Self {
        Self { alert }
    }
}
