use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use settlement_engine::{events::EventProducers, EarningsApi, OrderApi, PaymentFlowApi, PayoutApi, SqliteDatabase};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::{paystack::PaystackGateway, payouts::create_payout_event_handlers},
    reconciliation_worker::start_reconciliation_worker,
    routes::{
        health,
        CreateOrderRoute,
        InitializePaymentRoute,
        MyEarningsRoute,
        PaymentWebhookRoute,
        RetryTransferRoute,
        SellerOrderRoute,
        SellerOrdersRoute,
        UpdateOrderStatusRoute,
        VerifyPaymentRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = PaystackGateway::new(config.paystack.clone(), config.webhook_checks)
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_payout_event_handlers(db.clone(), gateway.clone());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let flow = payment_flow(&config, db.clone(), gateway.clone(), producers.clone());
    // Nothing awaits the worker. It runs until the process exits.
    let _worker = start_reconciliation_worker(
        flow,
        config.reconcile_interval,
        config.reconcile_pending_after,
        config.session_expiry,
    );
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

fn payment_flow(
    config: &ServerConfig,
    db: SqliteDatabase,
    gateway: PaystackGateway,
    producers: EventProducers,
) -> PaymentFlowApi<SqliteDatabase, PaystackGateway> {
    PaymentFlowApi::new(db, gateway, producers)
        .with_pricing(config.pricing)
        .with_callback_url(config.callback_url.clone())
        .with_stock_attempts(config.stock_retries)
}

/// Error handlers that render extractor failures in the standard JSON envelope.
pub fn configure_extractors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default().error_handler(|err, _req| ServerError::InvalidRequestPath(err.to_string()).into()),
    );
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: PaystackGateway,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let auth = web::Data::new(config.auth.clone());
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let flow_api = payment_flow(&config, db.clone(), gateway.clone(), producers.clone());
        let orders_api = OrderApi::new(db.clone());
        let earnings_api = EarningsApi::new(db.clone());
        let payout_api = PayoutApi::new(db.clone(), gateway.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("mkt::access_log"))
            .configure(configure_extractors)
            .app_data(auth.clone())
            .app_data(web::Data::new(flow_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(earnings_api))
            .app_data(web::Data::new(payout_api))
            .service(health)
            .service(InitializePaymentRoute::<SqliteDatabase, PaystackGateway>::new())
            .service(VerifyPaymentRoute::<SqliteDatabase, PaystackGateway>::new())
            .service(PaymentWebhookRoute::<SqliteDatabase, PaystackGateway>::new())
            .service(CreateOrderRoute::<SqliteDatabase, PaystackGateway>::new())
            .service(SellerOrdersRoute::<SqliteDatabase>::new())
            .service(SellerOrderRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
            .service(MyEarningsRoute::<SqliteDatabase>::new())
            .service(RetryTransferRoute::<SqliteDatabase, PaystackGateway>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    info!("🚀️ Server bound to {host}:{port}");
    Ok(srv)
}
