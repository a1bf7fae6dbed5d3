mod common;

use actix_web::web::Data;
use actix_web::{App, test};

use hrm_payroll::config::Config;
use hrm_payroll::routes;

fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        server_addr: "127.0.0.1:0".to_string(),
        rate_api_per_min: 1000,
        api_prefix: "/api/v1/payroll".to_string(),
    }
}

#[actix_web::test]
async fn create_period_returns_the_envelope() {
    let pool = common::setup_pool().await;
    let config = test_config();
    let app = test::init_service(
        App::new()
            .app_data(Data::new(pool.clone()))
            .configure(|cfg| routes::configure(cfg, config.clone())),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/payroll/periods")
        // the limiter keys on the peer IP, which test requests lack by default
        .peer_addr("127.0.0.1:12345".parse().unwrap())
        .insert_header(("x-user-id", "hr-1"))
        .set_json(serde_json::json!({
            "name": "January 2024",
            "start_date": "2024-01-01",
            "end_date": "2024-01-31",
            "pay_date": "2024-02-05"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "DRAFT");
    assert_eq!(body["data"]["created_by"], "hr-1");
}

#[actix_web::test]
async fn approve_without_actor_header_is_rejected() {
    let pool = common::setup_pool().await;
    let config = test_config();
    let app = test::init_service(
        App::new()
            .app_data(Data::new(pool.clone()))
            .configure(|cfg| routes::configure(cfg, config.clone())),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/payroll/periods/some-id/approve")
        .peer_addr("127.0.0.1:12345".parse().unwrap())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["statusCode"], 400);
}

#[actix_web::test]
async fn missing_payslip_maps_to_404() {
    let pool = common::setup_pool().await;
    let config = test_config();
    let app = test::init_service(
        App::new()
            .app_data(Data::new(pool.clone()))
            .configure(|cfg| routes::configure(cfg, config.clone())),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/payroll/payslips/nope")
        .peer_addr("127.0.0.1:12345".parse().unwrap())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["message"], "Payslip not found");
}
