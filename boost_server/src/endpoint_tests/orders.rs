use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use boost_common::Cents;
use boost_engine::{
    db_types::{CommissionRecord, OrderStatusType, RevenueRecord, Role, SettlementStatus},
    events::EventProducers,
    traits::{ClaimAttempt, ClaimedOrder, LedgerError},
    ClaimApi,
    LedgerApi,
};
use chrono::Utc;

use super::{
    helpers::{bearer, order, send_request, verifier},
    mocks::MockBoostDatabase,
};
use crate::{
    middleware::JwtMiddlewareFactory,
    routes::{CancelOrderRoute, ClaimOrderRoute, OrderSettlementRoute, StartOrderRoute},
};

fn claim_app(db: MockBoostDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = ClaimApi::new(db, EventProducers::default());
        cfg.app_data(web::Data::new(api)).service(
            web::scope("/api")
                .wrap(JwtMiddlewareFactory::new(verifier()))
                .service(ClaimOrderRoute::<MockBoostDatabase>::new()),
        );
    }
}

fn ledger_app(db: MockBoostDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = LedgerApi::new(db, EventProducers::default());
        cfg.app_data(web::Data::new(api)).service(
            web::scope("/api")
                .wrap(JwtMiddlewareFactory::new(verifier()))
                .service(StartOrderRoute::<MockBoostDatabase>::new())
                .service(CancelOrderRoute::<MockBoostDatabase>::new())
                .service(OrderSettlementRoute::<MockBoostDatabase>::new()),
        );
    }
}

fn claimed(worker_id: &str) -> ClaimedOrder {
    let mut order = order("ord-1", OrderStatusType::Assigned, Some(worker_id));
    order.worker_commission = Some(Cents::from_major(70));
    order.admin_revenue = Some(Cents::from_major(30));
    let commission = CommissionRecord {
        id: 1,
        order_id: order.order_id.clone(),
        worker_id: worker_id.to_string(),
        order_total: order.total_price,
        percentage: 0.7,
        amount: Cents::from_major(70),
        status: SettlementStatus::Pending,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    let revenue = RevenueRecord {
        id: 1,
        order_id: order.order_id.clone(),
        admin_id: None,
        order_total: order.total_price,
        percentage: 0.3,
        amount: Cents::from_major(30),
        status: SettlementStatus::Pending,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    ClaimedOrder { order, commission, revenue }
}

#[actix_web::test]
async fn claim_without_token() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/api/orders/ord-1/claim");
    let (status, body) = send_request(req, claim_app(MockBoostDatabase::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("No access token was provided"), "{body}");
}

#[actix_web::test]
async fn claim_with_bad_token() {
    let _ = env_logger::try_init().ok();
    let (name, mut token) = bearer("bob", Role::Booster);
    let n = token.len();
    token.replace_range(n - 10..n - 5, "AAAAA");
    let req = TestRequest::post().uri("/api/orders/ord-1/claim").insert_header((name, token));
    let (status, _) = send_request(req, claim_app(MockBoostDatabase::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn clients_cannot_claim() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/api/orders/ord-1/claim").insert_header(bearer("alice", Role::Client));
    let (status, body) = send_request(req, claim_app(MockBoostDatabase::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("Insufficient Permissions"), "{body}");
}

#[actix_web::test]
async fn claim_is_settled() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBoostDatabase::new();
    db.expect_fetch_order().returning(|_| Ok(Some(order("ord-1", OrderStatusType::Paid, None))));
    db.expect_try_claim_order()
        .withf(|id, worker| id.as_str() == "ord-1" && worker == "bob")
        .times(1)
        .returning(|_, worker| Ok(ClaimAttempt::Won(claimed(worker))));
    let req = TestRequest::post().uri("/api/orders/ord-1/claim").insert_header(bearer("bob", Role::Booster));
    let (status, body) = send_request(req, claim_app(db)).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["order"]["worker_id"], "bob");
    assert_eq!(json["order"]["status"], "ASSIGNED");
    assert_eq!(json["commission"]["amount"], 7000);
    assert_eq!(json["revenue"]["amount"], 3000);
}

#[actix_web::test]
async fn claim_outcomes_map_to_status_codes() {
    let _ = env_logger::try_init().ok();
    let cases = [
        (Some(order("ord-1", OrderStatusType::Assigned, Some("carol"))), StatusCode::CONFLICT, "already taken"),
        (Some(order("ord-1", OrderStatusType::Pending, None)), StatusCode::UNPROCESSABLE_ENTITY, "not been paid"),
        (Some(order("ord-1", OrderStatusType::Cancelled, None)), StatusCode::UNPROCESSABLE_ENTITY, "cannot be claimed"),
        (None, StatusCode::NOT_FOUND, "does not exist"),
    ];
    for (stored, expected_status, expected_msg) in cases {
        let mut db = MockBoostDatabase::new();
        db.expect_fetch_order().returning(move |_| Ok(stored.clone()));
        db.expect_try_claim_order().never();
        let req = TestRequest::post().uri("/api/orders/ord-1/claim").insert_header(bearer("bob", Role::Booster));
        let (status, body) = send_request(req, claim_app(db)).await;
        assert_eq!(status, expected_status, "{body}");
        assert!(body.contains(expected_msg), "{body}");
    }
}

#[actix_web::test]
async fn lost_race_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBoostDatabase::new();
    db.expect_fetch_order().returning(|_| Ok(Some(order("ord-1", OrderStatusType::Paid, None))));
    db.expect_try_claim_order()
        .returning(|_, _| Ok(ClaimAttempt::Lost(order("ord-1", OrderStatusType::Assigned, Some("carol")))));
    let req = TestRequest::post().uri("/api/orders/ord-1/claim").insert_header(bearer("bob", Role::Booster));
    let (status, _) = send_request(req, claim_app(db)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn store_failure_is_retryable() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBoostDatabase::new();
    db.expect_fetch_order().returning(|_| Ok(Some(order("ord-1", OrderStatusType::Paid, None))));
    db.expect_try_claim_order().returning(|_, _| Err(LedgerError::DatabaseError("database is locked".into())));
    let req = TestRequest::post().uri("/api/orders/ord-1/claim").insert_header(bearer("bob", Role::Booster));
    let (status, body) = send_request(req, claim_app(db)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.contains("Please try again"), "{body}");
}

#[actix_web::test]
async fn only_the_assigned_worker_can_start() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBoostDatabase::new();
    db.expect_start_order().returning(|id, worker| {
        Err(LedgerError::WorkerNotAssigned { order_id: id.clone(), worker_id: worker.to_string() })
    });
    let req = TestRequest::post().uri("/api/orders/ord-1/start").insert_header(bearer("carol", Role::Booster));
    let (status, _) = send_request(req, ledger_app(db)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn admins_cancel_with_a_reason() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBoostDatabase::new();
    db.expect_cancel_order()
        .withf(|id, reason| id.as_str() == "ord-1" && reason == "duplicate order")
        .times(1)
        .returning(|_, _| Ok(order("ord-1", OrderStatusType::Cancelled, None)));
    let req = TestRequest::post()
        .uri("/api/orders/ord-1/cancel")
        .insert_header(bearer("root", Role::Admin))
        .set_json(serde_json::json!({ "reason": "duplicate order" }));
    let (status, body) = send_request(req, ledger_app(db)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body.contains(r#""status":"CANCELLED""#), "{body}");
}

#[actix_web::test]
async fn boosters_cannot_cancel() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBoostDatabase::new();
    db.expect_cancel_order().never();
    let req = TestRequest::post().uri("/api/orders/ord-1/cancel").insert_header(bearer("bob", Role::Booster));
    let (status, _) = send_request(req, ledger_app(db)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn cancelling_an_assigned_order_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBoostDatabase::new();
    db.expect_cancel_order().returning(|id, _| {
        Err(LedgerError::InvalidTransition {
            order_id: id.clone(),
            from: OrderStatusType::Assigned,
            to: OrderStatusType::Cancelled,
        })
    });
    let req = TestRequest::post().uri("/api/orders/ord-1/cancel").insert_header(bearer("root", Role::Admin));
    let (status, _) = send_request(req, ledger_app(db)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn settlement_of_unknown_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBoostDatabase::new();
    db.expect_fetch_order().returning(|_| Ok(None));
    let req = TestRequest::get().uri("/api/orders/nope/settlement").insert_header(bearer("root", Role::Admin));
    let (status, _) = send_request(req, ledger_app(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn settlement_view() {
    let _ = env_logger::try_init().ok();
    let settled = claimed("bob");
    let mut db = MockBoostDatabase::new();
    let o = settled.order.clone();
    db.expect_fetch_order().returning(move |_| Ok(Some(o.clone())));
    let c = settled.commission.clone();
    db.expect_fetch_commission_record().returning(move |_| Ok(Some(c.clone())));
    let r = settled.revenue.clone();
    db.expect_fetch_revenue_records().returning(move |_| Ok(vec![r.clone()]));
    let req = TestRequest::get().uri("/api/orders/ord-1/settlement").insert_header(bearer("root", Role::Admin));
    let (status, body) = send_request(req, ledger_app(db)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["commission"]["worker_id"], "bob");
    assert_eq!(json["revenue"][0]["amount"], 3000);
    assert_eq!(json["order"]["worker_commission"], 7000);
}
