use std::{future::Future, path::Path, pin::Pin, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use boost_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    ClaimApi,
    CommissionApi,
    LedgerApi,
    PaymentEventApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    auth::TokenVerifier,
    config::ServerConfig,
    errors::ServerError,
    middleware::{HmacMiddlewareFactory, JwtMiddlewareFactory},
    routes::{
        health,
        CancelOrderRoute,
        ClaimOrderRoute,
        CommissionConfigRoute,
        CompleteOrderRoute,
        OrderSettlementRoute,
        PaymentWebhookRoute,
        StartOrderRoute,
        UpdateCommissionConfigRoute,
        UpdateWorkerOverrideRoute,
    },
};

/// The header the payment provider puts the body's HMAC in.
pub const WEBHOOK_HMAC_HEADER: &str = "X-Boost-Hmac-SHA256";
const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    ensure_database_directory(&config.database_url)?;
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Could not run migrations. {e}")))?;
    info!("🗃️ Database ready at {}", config.database_url);
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, notification_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let claim_api = ClaimApi::new(db.clone(), producers.clone());
        let ledger_api = LedgerApi::new(db.clone(), producers.clone());
        let payments_api = PaymentEventApi::new(db.clone(), producers.clone());
        let commission_api = CommissionApi::new(db.clone());
        let verifier = TokenVerifier::new(&config.auth);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("bsg::access_log"))
            .app_data(web::Data::new(claim_api))
            .app_data(web::Data::new(ledger_api))
            .app_data(web::Data::new(payments_api))
            .app_data(web::Data::new(commission_api));
        // Routes that require authentication
        let api_scope = web::scope("/api")
            .wrap(JwtMiddlewareFactory::new(verifier))
            .service(ClaimOrderRoute::<SqliteDatabase>::new())
            .service(StartOrderRoute::<SqliteDatabase>::new())
            .service(CompleteOrderRoute::<SqliteDatabase>::new())
            .service(CancelOrderRoute::<SqliteDatabase>::new())
            .service(OrderSettlementRoute::<SqliteDatabase>::new())
            .service(CommissionConfigRoute::<SqliteDatabase>::new())
            .service(UpdateCommissionConfigRoute::<SqliteDatabase>::new())
            .service(UpdateWorkerOverrideRoute::<SqliteDatabase>::new());
        let webhook_scope = web::scope("/webhook")
            .wrap(HmacMiddlewareFactory::new(
                WEBHOOK_HMAC_HEADER,
                config.webhook.hmac_secret.clone(),
                config.webhook.hmac_checks,
            ))
            .service(PaymentWebhookRoute::<SqliteDatabase>::new());
        app.service(health).service(webhook_scope).service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// SQLite creates a missing database file, but not the directory it lives in.
fn ensure_database_directory(url: &str) -> Result<(), ServerError> {
    let path = url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
    if path.starts_with(":memory:") {
        return Ok(());
    }
    let path = path.split('?').next().unwrap_or(path);
    match Path::new(path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            info!("🗃️ Creating database directory {}", dir.display());
            std::fs::create_dir_all(dir)?;
            Ok(())
        },
        _ => Ok(()),
    }
}

/// The stored notifications are the record of what the parties were told. These hooks only log engine activity.
fn notification_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_order_claimed(|ev| {
            info!(
                "📬️ Order {} claimed by {}. Commission {}",
                ev.order.order_id, ev.commission.worker_id, ev.commission.amount
            );
            Box::pin(async {}) as Pin<Box<dyn Future<Output = ()> + Send>>
        })
        .on_order_paid(|ev| {
            info!("📬️ Order {} paid by payment {}", ev.order.order_id, ev.payment.provider_id);
            Box::pin(async {}) as Pin<Box<dyn Future<Output = ()> + Send>>
        })
        .on_order_annulled(|ev| {
            info!("📬️ Order {} is now {}", ev.order.order_id, ev.status);
            Box::pin(async {}) as Pin<Box<dyn Future<Output = ()> + Send>>
        });
    hooks
}
