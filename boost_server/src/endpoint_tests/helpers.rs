use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use boost_common::Cents;
use boost_engine::db_types::{Order, OrderId, OrderStatusType, Role};
use chrono::{Duration, TimeZone, Utc};
use log::debug;

use crate::{
    auth::{issue_token, JwtClaims, TokenVerifier},
    config::AuthConfig,
};

// DO NOT re-use this secret anywhere.
const TEST_JWT_SECRET: &str = "endpoint-tests-hs256-secret-0123456789abcdef";

pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new(TEST_JWT_SECRET)
}

pub fn verifier() -> TokenVerifier {
    TokenVerifier::new(&get_auth_config())
}

pub fn token_for(sub: &str, role: Role) -> String {
    let claims = JwtClaims::new(sub, role, Duration::hours(1));
    issue_token(&get_auth_config(), &claims).expect("Failed to sign token")
}

pub fn bearer(sub: &str, role: Role) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token_for(sub, role)))
}

/// Sends `req` to an app set up by `configure`. Errors raised by middleware are rendered the way the server would
/// render them.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = res.into_body().try_into_bytes().unwrap_or_default();
            (status, String::from_utf8_lossy(&body).into_owned())
        },
    }
}

pub fn order(id: &str, status: OrderStatusType, worker_id: Option<&str>) -> Order {
    Order {
        id: 1,
        order_id: OrderId::from(id),
        owner_id: "alice".to_string(),
        worker_id: worker_id.map(String::from),
        service_id: "rank-boost".to_string(),
        admin_id: None,
        total_price: Cents::from_major(100),
        status,
        worker_commission: None,
        admin_revenue: None,
        worker_percentage: None,
        platform_percentage: None,
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    }
}
