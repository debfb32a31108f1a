use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use boost_engine::{
    db_types::{CommissionConfig, Role, WorkerProfile},
    CommissionApi,
};
use chrono::Utc;

use super::{
    helpers::{bearer, send_request, verifier},
    mocks::MockCommissionManager,
};
use crate::{
    middleware::JwtMiddlewareFactory,
    routes::{CommissionConfigRoute, UpdateCommissionConfigRoute, UpdateWorkerOverrideRoute},
};

fn commission_app(db: MockCommissionManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(CommissionApi::new(db))).service(
            web::scope("/api")
                .wrap(JwtMiddlewareFactory::new(verifier()))
                .service(CommissionConfigRoute::<MockCommissionManager>::new())
                .service(UpdateCommissionConfigRoute::<MockCommissionManager>::new())
                .service(UpdateWorkerOverrideRoute::<MockCommissionManager>::new()),
        );
    }
}

fn config(worker_percentage: f64) -> CommissionConfig {
    CommissionConfig {
        id: 1,
        worker_percentage,
        platform_percentage: 1.0 - worker_percentage,
        enabled: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[actix_web::test]
async fn fetch_config() {
    let _ = env_logger::try_init().ok();
    let mut db = MockCommissionManager::new();
    db.expect_fetch_commission_config().returning(|| Ok(config(0.7)));
    let req = TestRequest::get().uri("/api/commission/config").insert_header(bearer("root", Role::Admin));
    let (status, body) = send_request(req, commission_app(db)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["worker_percentage"], 0.7);
    assert_eq!(json["enabled"], true);
}

#[actix_web::test]
async fn only_admins_see_the_config() {
    let _ = env_logger::try_init().ok();
    let mut db = MockCommissionManager::new();
    db.expect_fetch_commission_config().never();
    let req = TestRequest::get().uri("/api/commission/config").insert_header(bearer("bob", Role::Booster));
    let (status, _) = send_request(req, commission_app(db)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn update_config() {
    let _ = env_logger::try_init().ok();
    let mut db = MockCommissionManager::new();
    db.expect_update_commission_config().withf(|p| (*p - 0.65).abs() < 1e-9).times(1).returning(|p| Ok(config(p)));
    let req = TestRequest::put()
        .uri("/api/commission/config")
        .insert_header(bearer("root", Role::Admin))
        .set_json(serde_json::json!({ "worker_percentage": 0.65 }));
    let (status, body) = send_request(req, commission_app(db)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body.contains(r#""worker_percentage":0.65"#), "{body}");
}

#[actix_web::test]
async fn out_of_range_config_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut db = MockCommissionManager::new();
    db.expect_update_commission_config().never();
    let req = TestRequest::put()
        .uri("/api/commission/config")
        .insert_header(bearer("root", Role::Admin))
        .set_json(serde_json::json!({ "worker_percentage": 1.5 }));
    let (status, body) = send_request(req, commission_app(db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("outside the range"), "{body}");
}

#[actix_web::test]
async fn worker_overrides() {
    let _ = env_logger::try_init().ok();
    let mut db = MockCommissionManager::new();
    db.expect_set_worker_override()
        .withf(|worker, pct| worker == "bob" && *pct == Some(0.8))
        .times(1)
        .returning(|worker, pct| {
            Ok(WorkerProfile { worker_id: worker.to_string(), commission_override: pct, updated_at: Utc::now() })
        });
    db.expect_set_worker_override()
        .withf(|worker, pct| worker == "carol" && pct.is_none())
        .times(1)
        .returning(|worker, pct| {
            Ok(WorkerProfile { worker_id: worker.to_string(), commission_override: pct, updated_at: Utc::now() })
        });
    // Both requests share one mock, so its expectations are checked across the two apps
    let api = web::Data::new(CommissionApi::new(db));
    let req = TestRequest::put()
        .uri("/api/commission/workers/bob")
        .insert_header(bearer("root", Role::Admin))
        .set_json(serde_json::json!({ "commission_override": 0.8 }));
    let configure = |api: web::Data<CommissionApi<MockCommissionManager>>| {
        move |cfg: &mut ServiceConfig| {
            cfg.app_data(api).service(
                web::scope("/api")
                    .wrap(JwtMiddlewareFactory::new(verifier()))
                    .service(UpdateWorkerOverrideRoute::<MockCommissionManager>::new()),
            );
        }
    };
    let (status, body) = send_request(req, configure(api.clone())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body.contains(r#""commission_override":0.8"#), "{body}");

    let req = TestRequest::put()
        .uri("/api/commission/workers/carol")
        .insert_header(bearer("root", Role::Admin))
        .set_json(serde_json::json!({ "commission_override": null }));
    let (status, body) = send_request(req, configure(api)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body.contains(r#""commission_override":null"#), "{body}");
}

#[actix_web::test]
async fn out_of_range_override_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut db = MockCommissionManager::new();
    db.expect_set_worker_override().never();
    let req = TestRequest::put()
        .uri("/api/commission/workers/bob")
        .insert_header(bearer("root", Role::Admin))
        .set_json(serde_json::json!({ "commission_override": -0.1 }));
    let (status, _) = send_request(req, commission_app(db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
