//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, gateway calls etc.) should be
//! expressed as futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus
//! don’t block execution.
//!
//! All JSON responses use the [`JsonResponse`] envelope.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use bytes::Bytes;
use log::*;
use settlement_engine::{
    payment_objects::CheckoutRequest,
    traits::{MarketplaceDatabase, OrderManagement, PaymentGateway, PayoutGateway, SettlementManagement},
    EarningsApi,
    OrderApi,
    PaymentFlowApi,
    PayoutApi,
};

use crate::{
    auth::SellerClaims,
    data_objects::{JsonResponse, UpdateStatusParams},
    errors::ServerError,
};

pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(initialize_payment => Post "/payments/initialize" impl MarketplaceDatabase, PaymentGateway);
/// Starts a checkout.
///
/// The cart is re-priced against the live catalog. If any line fails validation, nothing is written and the response
/// is a 422 carrying the itemized cart report under `data`. Otherwise a hosted payment session is opened and the
/// customer should be redirected to `data.authorization_url`.
pub async fn initialize_payment<B, G>(
    body: web::Json<CheckoutRequest>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: MarketplaceDatabase,
    G: PaymentGateway,
{
    let request = body.into_inner();
    debug!("💻️ POST checkout for {} with {} cart lines", request.customer.email, request.items.len());
    let session = api.initialize(request).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(session)))
}

route!(verify_payment => Get "/payments/verify/{reference}" impl MarketplaceDatabase, PaymentGateway);
/// Checks the payment for `reference` with the gateway and applies the result. Safe to call any number of times.
pub async fn verify_payment<B, G>(
    path: web::Path<String>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: MarketplaceDatabase,
    G: PaymentGateway,
{
    let reference = path.into_inner();
    debug!("💻️ GET verify payment {reference}");
    let outcome = api.verify(&reference).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(outcome)))
}

route!(payment_webhook => Post "/payments/webhook" impl MarketplaceDatabase, PaymentGateway);
/// Gateway webhook receiver.
///
/// The body is taken raw, since the signature in the `x-paystack-signature` header is computed over the exact bytes
/// that were sent. Unsigned or badly signed requests get a 401 and never touch the database. Everything that is
/// authentic is acknowledged with a 200, including events for references we don't know, so that the gateway stops
/// redelivering them.
pub async fn payment_webhook<B, G>(
    req: HttpRequest,
    body: Bytes,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: MarketplaceDatabase,
    G: PaymentGateway,
{
    trace!("💻️ Received webhook ({} bytes)", body.len());
    let signature = req.headers().get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    let outcome = api.handle_webhook(&body, signature).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(outcome)))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl MarketplaceDatabase, PaymentGateway);
/// Validates a cart and saves it as a pending order without opening a payment session.
pub async fn create_order<B, G>(
    body: web::Json<CheckoutRequest>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: MarketplaceDatabase,
    G: PaymentGateway,
{
    let request = body.into_inner();
    debug!("💻️ POST order for {}", request.customer.email);
    let placed = api.create_order(request).await?;
    Ok(HttpResponse::Created().json(JsonResponse::success(placed)))
}

route!(seller_orders => Get "/orders" impl OrderManagement);
/// Every order containing at least one of the authenticated seller's products.
pub async fn seller_orders<B: OrderManagement>(
    claims: SellerClaims,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET orders for seller #{}", claims.seller_id);
    let orders = api.orders_for_seller(claims.seller_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(orders)))
}

route!(seller_order => Get "/orders/{id}" impl OrderManagement);
/// A single order, with only the authenticated seller's line items. Sellers with nothing in the order get a 403.
pub async fn seller_order<B: OrderManagement>(
    claims: SellerClaims,
    path: web::Path<i64>,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order #{order_id} for seller #{}", claims.seller_id);
    let order = api.order_for_seller(order_id, claims.seller_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(order)))
}

route!(update_order_status => Put "/orders/{id}/status" impl OrderManagement);
pub async fn update_order_status<B: OrderManagement>(
    claims: SellerClaims,
    path: web::Path<i64>,
    body: web::Json<UpdateStatusParams>,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let status = body.into_inner().status;
    info!("💻️ Seller #{} is moving order #{order_id} to {status}", claims.seller_id);
    let order = api.update_fulfillment_status(order_id, claims.seller_id, status).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(order)))
}

//----------------------------------------------   Earnings  ----------------------------------------------------
route!(my_earnings => Get "/earnings" impl SettlementManagement);
/// The authenticated seller's earnings totals, with their transaction and transfer history.
pub async fn my_earnings<B: SettlementManagement>(
    claims: SellerClaims,
    api: web::Data<EarningsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET earnings for seller #{}", claims.seller_id);
    let earnings = api.earnings_for_seller(claims.seller_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(earnings)))
}

//----------------------------------------------   Transfers  ----------------------------------------------------
route!(retry_transfer => Post "/transfers/{id}/retry" impl MarketplaceDatabase, PayoutGateway);
/// Makes another attempt at one of the authenticated seller's failed payouts.
pub async fn retry_transfer<B, P>(
    claims: SellerClaims,
    path: web::Path<i64>,
    api: web::Data<PayoutApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: MarketplaceDatabase,
    P: PayoutGateway,
{
    let transfer_id = path.into_inner();
    info!("💻️ Seller #{} is retrying transfer #{transfer_id}", claims.seller_id);
    let payout = api.retry_transfer_for_seller(transfer_id, claims.seller_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(payout)))
}
