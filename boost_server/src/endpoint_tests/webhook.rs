use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use boost_common::{Cents, Secret};
use boost_engine::{
    db_types::{OrderId, OrderStatusType, Payment, PaymentStatus},
    events::EventProducers,
    traits::{IgnoreReason, LedgerError, PaymentTransition, WebhookAck},
    PaymentEventApi,
};
use chrono::Utc;

use super::{
    helpers::{order, send_request},
    mocks::MockBoostDatabase,
};
use crate::{
    helpers::calculate_hmac,
    middleware::HmacMiddlewareFactory,
    routes::PaymentWebhookRoute,
    server::WEBHOOK_HMAC_HEADER,
};

const WEBHOOK_SECRET: &str = "whsec_endpoint_tests";
const PAID_EVENT: &str = r#"{"event":"payment.paid","data":{"id":"pay_1","status":"PAID"}}"#;

fn webhook_app(db: MockBoostDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = PaymentEventApi::new(db, EventProducers::default());
        cfg.app_data(web::Data::new(api)).service(
            web::scope("/webhook")
                .wrap(HmacMiddlewareFactory::new(
                    WEBHOOK_HMAC_HEADER,
                    Secret::new(WEBHOOK_SECRET.to_string()),
                    true,
                ))
                .service(PaymentWebhookRoute::<MockBoostDatabase>::new()),
        );
    }
}

fn signed(body: &'static str) -> TestRequest {
    TestRequest::post()
        .uri("/webhook/payments")
        .insert_header((WEBHOOK_HMAC_HEADER, calculate_hmac(WEBHOOK_SECRET, body.as_bytes())))
        .set_payload(body)
}

fn paid_transition() -> PaymentTransition {
    let payment = Payment {
        id: 1,
        provider_id: "pay_1".to_string(),
        order_id: OrderId::from("ord-1"),
        amount: Cents::from_major(100),
        status: PaymentStatus::Paid,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    PaymentTransition {
        payment,
        previous_status: PaymentStatus::Pending,
        order: order("ord-1", OrderStatusType::Paid, None),
        previous_order_status: Some(OrderStatusType::Pending),
    }
}

#[actix_web::test]
async fn signed_payment_is_applied() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBoostDatabase::new();
    db.expect_apply_payment_event()
        .withf(|id, status| id == "pay_1" && *status == PaymentStatus::Paid)
        .times(1)
        .returning(|_, _| Ok(WebhookAck::Applied(paid_transition())));
    let (status, body) = send_request(signed(PAID_EVENT), webhook_app(db)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["result"], "applied");
    assert_eq!(json["detail"]["order"]["status"], "PAID");
}

#[actix_web::test]
async fn replays_are_acknowledged() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBoostDatabase::new();
    db.expect_apply_payment_event().returning(|_, _| Ok(WebhookAck::Ignored(IgnoreReason::AlreadyApplied)));
    let (status, body) = send_request(signed(PAID_EVENT), webhook_app(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"result":"ignored","detail":"already_applied"}"#);
}

#[actix_web::test]
async fn unrecognised_status_never_reaches_the_store() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBoostDatabase::new();
    db.expect_apply_payment_event().never();
    let body = r#"{"event":"payment.created","data":{"id":"pay_1"}}"#;
    let (status, body) = send_request(signed(body), webhook_app(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("unrecognised_event"), "{body}");
}

#[actix_web::test]
async fn missing_signature() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBoostDatabase::new();
    db.expect_apply_payment_event().never();
    let req = TestRequest::post().uri("/webhook/payments").set_payload(PAID_EVENT);
    let (status, body) = send_request(req, webhook_app(db)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("No HMAC signature"), "{body}");
}

#[actix_web::test]
async fn signature_for_another_body() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBoostDatabase::new();
    db.expect_apply_payment_event().never();
    let forged = r#"{"event":"payment.refunded","data":{"id":"pay_1","status":"REFUNDED"}}"#;
    let req = TestRequest::post()
        .uri("/webhook/payments")
        .insert_header((WEBHOOK_HMAC_HEADER, calculate_hmac(WEBHOOK_SECRET, PAID_EVENT.as_bytes())))
        .set_payload(forged);
    let (status, body) = send_request(req, webhook_app(db)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("HMAC mismatch"), "{body}");
}

#[actix_web::test]
async fn malformed_payloads() {
    let _ = env_logger::try_init().ok();
    for body in ["this is not json", r#"{"event":"payment.paid","data":{"status":"PAID"}}"#] {
        let mut db = MockBoostDatabase::new();
        db.expect_apply_payment_event().never();
        let (status, body) = send_request(signed(body), webhook_app(db)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    }
}

#[actix_web::test]
async fn store_failure_asks_for_a_retry() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBoostDatabase::new();
    db.expect_apply_payment_event().returning(|_, _| Err(LedgerError::DatabaseError("disk I/O error".into())));
    let (status, _) = send_request(signed(PAID_EVENT), webhook_app(db)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
