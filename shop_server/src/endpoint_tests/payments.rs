use actix_web::{http::StatusCode, web, web::ServiceConfig};
use flow_tools::FlowConfig;

use super::helpers::{json_post, send_request};
use crate::{config::ServerConfig, integrations::FlowGateway, routes::create_payment};

fn configure(cfg: &mut ServiceConfig) {
    // Nothing listens on port 9, so every gateway call fails
    let gateway = FlowGateway::new(FlowConfig::new("http://127.0.0.1:9", "api-key", "secret")).unwrap();
    cfg.app_data(web::Data::new(gateway))
        .app_data(web::Data::new(ServerConfig::default()))
        .service(create_payment);
}

#[actix_web::test]
async fn create_payment_requires_all_fields() {
    let _ = env_logger::try_init();
    for body in [
        r#"{"subject":"Pedido","amount":120000,"email":"ana@example.com"}"#,
        r#"{"orderId":"order-1","subject":"Pedido","email":"ana@example.com"}"#,
        r#"{"orderId":"","subject":"Pedido","amount":120000,"email":"ana@example.com"}"#,
        "",
    ] {
        let (status, body) = send_request(json_post("/api/payments", body), configure).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert!(body.starts_with(r#"{"error":"Could not read request body"#));
    }
}

#[actix_web::test]
async fn create_payment_rejects_non_positive_amounts() {
    let _ = env_logger::try_init();
    let body = r#"{"orderId":"order-1","subject":"Pedido","amount":0.2,"email":"ana@example.com"}"#;
    let (status, body) = send_request(json_post("/api/payments", body), configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Could not read request body: Payment amount must be positive, not $0"}"#);
}

#[actix_web::test]
async fn create_payment_reports_gateway_failure() {
    let _ = env_logger::try_init();
    let body = r#"{"orderId":"order-1","subject":"Pedido","amount":120000.4,"email":"ana@example.com",
        "customerData":{"name":"Ana"}}"#;
    let (status, body) = send_request(json_post("/api/payments", body), configure).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with(r#"{"error":"The payment gateway could not process the request."#));
}
