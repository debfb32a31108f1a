//! Request handler definitions
//!
//! Define each route and its handler here. Handlers only translate between HTTP and the engine APIs. Business rules
//! live in the engine. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every handler here is async and only awaits database futures.
use actix_web::{get, web, HttpResponse, Responder};
use boost_engine::{
    db_types::{OrderId, Role},
    traits::{CommissionManagement, OrderManagement, SettlementDatabase},
    ClaimApi,
    CommissionApi,
    LedgerApi,
    PaymentEventApi,
};
use log::*;

use crate::{
    auth::JwtClaims,
    data_objects::{CancelOrderParams, CommissionConfigUpdate, WorkerOverrideUpdate},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+ where requires [$($roles:expr),+])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>);
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

//----------------------------------------------   Webhooks  ----------------------------------------------------
route!(payment_webhook => Post "/payments" impl SettlementDatabase);
/// Route handler for payment provider callbacks.
///
/// The HMAC middleware has already checked the body's signature by the time this runs. Every well-formed callback is
/// acknowledged with a 200, including unknown payments and replays, so that the provider stops retrying. Only a body
/// that cannot be parsed (400) or a store failure (500) is an error.
pub async fn payment_webhook<B: SettlementDatabase>(
    body: web::Bytes,
    api: web::Data<PaymentEventApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received payment webhook");
    let payload = std::str::from_utf8(body.as_ref()).map_err(|e| {
        debug!("💻️ Payment webhook body is not UTF-8. {e}");
        ServerError::InvalidRequestBody(e.to_string())
    })?;
    let ack = api.handle_payload(payload).await?;
    debug!("💻️ Payment webhook handled: {ack:?}");
    Ok(HttpResponse::Ok().json(ack))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(claim_order => Post "/orders/{id}/claim" impl SettlementDatabase, OrderManagement where requires [Role::Booster]);
/// Route handler for claiming an order.
///
/// The caller claims the order for themselves. Exactly one of any number of concurrent claimants wins and gets a 200
/// with the settlement. The others get a 409 if the order was taken, or a 422 if it cannot be claimed (e.g. it has not
/// been paid for yet). A 503 means the outcome is unknown: read the order before trying again.
pub async fn claim_order<B>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<ClaimApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase + OrderManagement,
{
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ POST claim {order_id} for {}", claims.sub);
    let claimed = api.claim(&order_id, &claims.sub).await?;
    Ok(HttpResponse::Ok().json(claimed))
}

route!(start_order => Post "/orders/{id}/start" impl SettlementDatabase, OrderManagement where requires [Role::Booster]);
pub async fn start_order<B>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase + OrderManagement,
{
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ POST start {order_id} by {}", claims.sub);
    let order = api.start_order(&order_id, &claims.sub).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(complete_order => Post "/orders/{id}/complete" impl SettlementDatabase, OrderManagement where requires [Role::Booster]);
pub async fn complete_order<B>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase + OrderManagement,
{
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ POST complete {order_id} by {}", claims.sub);
    let order = api.complete_order(&order_id, &claims.sub).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(cancel_order => Post "/orders/{id}/cancel" impl SettlementDatabase, OrderManagement where requires [Role::Admin]);
/// Route handler for cancelling an order. The optional JSON body can carry a `reason`, which is passed on to the
/// parties in their notifications.
pub async fn cancel_order<B>(
    claims: JwtClaims,
    path: web::Path<String>,
    body: Option<web::Json<CancelOrderParams>>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase + OrderManagement,
{
    let order_id = OrderId::from(path.into_inner());
    let reason = body
        .and_then(|b| b.into_inner().reason)
        .unwrap_or_else(|| "Cancelled by the platform".to_string());
    info!("💻️ POST cancel {order_id} by {}: {reason}", claims.sub);
    let order = api.cancel_order(&order_id, &reason).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(order_settlement => Get "/orders/{id}/settlement" impl SettlementDatabase, OrderManagement where requires [Role::Admin]);
pub async fn order_settlement<B>(
    path: web::Path<String>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase + OrderManagement,
{
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ GET settlement for {order_id}");
    let settlement = api
        .settlement(&order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id} does not exist.")))?;
    Ok(HttpResponse::Ok().json(settlement))
}

//----------------------------------------------   Commission  ----------------------------------------------------
route!(commission_config => Get "/commission/config" impl CommissionManagement where requires [Role::Admin]);
pub async fn commission_config<B: CommissionManagement>(
    api: web::Data<CommissionApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET commission config");
    let config = api.fetch_config().await?;
    Ok(HttpResponse::Ok().json(config))
}

route!(update_commission_config => Put "/commission/config" impl CommissionManagement where requires [Role::Admin]);
pub async fn update_commission_config<B: CommissionManagement>(
    claims: JwtClaims,
    body: web::Json<CommissionConfigUpdate>,
    api: web::Data<CommissionApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let update = body.into_inner();
    info!("💻️ PUT commission config to {} by {}", update.worker_percentage, claims.sub);
    let config = api.update_config(update.worker_percentage).await?;
    Ok(HttpResponse::Ok().json(config))
}

route!(update_worker_override => Put "/commission/workers/{id}" impl CommissionManagement where requires [Role::Admin]);
pub async fn update_worker_override<B: CommissionManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    body: web::Json<WorkerOverrideUpdate>,
    api: web::Data<CommissionApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let worker_id = path.into_inner();
    let update = body.into_inner();
    info!("💻️ PUT commission override for {worker_id} to {:?} by {}", update.commission_override, claims.sub);
    let profile = api.set_worker_override(&worker_id, update.commission_override).await?;
    Ok(HttpResponse::Ok().json(profile))
}
