use chrono::{DateTime, Utc};
use mockall::mock;
use settlement_engine::{
    db_types::{FulfillmentStatus, LineItem, NewLineItem, NewOrder, Order},
    traits::{
        GatewayError,
        GatewaySession,
        GatewayTransaction,
        GatewayVerification,
        OrderManagement,
        PaymentGateway,
        SessionRequest,
        StoreError,
    },
};

mock! {
    pub OrderManager {}
    impl Clone for OrderManager {
        fn clone(&self) -> Self;
    }
    impl OrderManagement for OrderManager {
        async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;
        async fn insert_line_items(&self, order_id: i64, items: &[NewLineItem]) -> Result<Vec<LineItem>, StoreError>;
        async fn delete_order(&self, order_id: i64) -> Result<(), StoreError>;
        async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, StoreError>;
        async fn fetch_order_by_reference(&self, reference: &str) -> Result<Option<Order>, StoreError>;
        async fn fetch_line_items(&self, order_id: i64) -> Result<Vec<LineItem>, StoreError>;
        async fn confirm_payment(&self, reference: &str) -> Result<Option<Order>, StoreError>;
        async fn mark_order_failed(&self, reference: &str) -> Result<Option<Order>, StoreError>;
        async fn update_fulfillment_status(&self, order_id: i64, from: FulfillmentStatus, to: FulfillmentStatus) -> Result<Option<Order>, StoreError>;
        async fn fetch_orders_for_seller(&self, seller_id: i64) -> Result<Vec<Order>, StoreError>;
        async fn fetch_pending_orders(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, StoreError>;
    }
}

mock! {
    pub Gateway {}
    impl Clone for Gateway {
        fn clone(&self) -> Self;
    }
    impl PaymentGateway for Gateway {
        async fn initialize_session(&self, request: SessionRequest) -> Result<GatewaySession, GatewayError>;
        async fn verify(&self, reference: &str) -> Result<GatewayVerification, GatewayError>;
        async fn list_transactions(&self, since: DateTime<Utc>) -> Result<Vec<GatewayTransaction>, GatewayError>;
        fn verify_webhook_signature(&self, body: &[u8], signature: &str) -> bool;
    }
}
