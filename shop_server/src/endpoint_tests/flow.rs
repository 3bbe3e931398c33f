use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use flow_tools::{FlowSigner, SIGNATURE_PARAM};
use settlement_engine::{
    db_types::{ClientSegment, Clp, OrderId, OrderStatusType},
    events::EventProducers,
    test_utils::prepare_env::block_client_updates,
    GatewayError,
    GatewayPayment,
    NotificationResult,
    OrderManagement,
    SettlementApi,
    SqliteDatabase,
};
use shop_common::{PaymentStatusCode, Secret};

use super::{
    helpers::{form_post, json_post, prepare_shop, send_request, Fixture, ORDER_ID},
    mocks::{MockGateway, MockNotifier},
};
use crate::{
    helpers::WebhookSignatureCheck,
    routes::{flow_confirmation_status, FlowConfirmationRoute, FlowVerifyRoute},
};

type Api = SettlementApi<SqliteDatabase, MockGateway, MockNotifier>;

fn paid(order_id: &str) -> GatewayPayment {
    GatewayPayment::new(order_id, PaymentStatusCode::Paid, Clp::from(120_000)).with_payer("ana@example.com")
}

fn gateway_paying(token: &'static str, order_id: &'static str, times: usize) -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_payment_status().withf(move |t| t == token).times(times).returning(move |_| Ok(paid(order_id)));
    gateway
}

fn notifier_expecting(times: usize) -> MockNotifier {
    let mut notifier = MockNotifier::new();
    notifier
        .expect_send_order_confirmation()
        .withf(|settled| settled.order.order_id == OrderId::from(ORDER_ID))
        .times(times)
        .returning(|_| NotificationResult::sent());
    notifier
}

fn api(db: &SqliteDatabase, gateway: MockGateway, notifier: MockNotifier) -> web::Data<Api> {
    web::Data::new(SettlementApi::new(db.clone(), gateway, notifier, Default::default(), EventProducers::default()))
}

fn configure(api: web::Data<Api>, check: WebhookSignatureCheck) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(api)
            .app_data(web::Data::new(check))
            .service(flow_confirmation_status)
            .service(FlowConfirmationRoute::<SqliteDatabase, MockGateway, MockNotifier>::new())
            .service(FlowVerifyRoute::<SqliteDatabase, MockGateway, MockNotifier>::new());
    }
}

async fn order_status(db: &SqliteDatabase) -> OrderStatusType {
    let order = db.fetch_order_by_order_id(&OrderId::from(ORDER_ID)).await.expect("Error fetching order");
    order.expect("Order should exist").status
}

//----------------------------------------------   Confirmation  ----------------------------------------------------

#[actix_web::test]
async fn confirmation_liveness() {
    let Fixture { db, .. } = prepare_shop().await;
    let api = api(&db, MockGateway::new(), MockNotifier::new());
    let req = TestRequest::get().uri("/api/flow/confirmation");
    let (status, body) = send_request(req, configure(api, WebhookSignatureCheck::disabled())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Webhook Flow activo");
}

#[actix_web::test]
async fn confirmation_settles_a_paid_order() {
    let Fixture { db, client_id, product_id } = prepare_shop().await;
    let api = api(&db, gateway_paying("tok-paid", ORDER_ID, 1), notifier_expecting(1));
    let req = form_post("/api/flow/confirmation", "token=tok-paid");
    let (status, body) = send_request(req, configure(api, WebhookSignatureCheck::disabled())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    assert_eq!(order_status(&db).await, OrderStatusType::Processing);
    let client = db.fetch_client(client_id).await.unwrap().unwrap();
    assert_eq!(client.total_spent, Clp::from(120_000));
    assert_eq!(client.order_count, 1);
    assert_eq!(client.segment, ClientSegment::HighTicket);
    let product = db.fetch_product(product_id).await.unwrap().unwrap();
    assert_eq!(product.stock, 3);
}

#[actix_web::test]
async fn duplicate_confirmations_settle_once() {
    let Fixture { db, product_id, .. } = prepare_shop().await;
    let api = api(&db, gateway_paying("tok-paid", ORDER_ID, 2), notifier_expecting(1));
    let app_api = api.clone();
    let req = form_post("/api/flow/confirmation", "token=tok-paid");
    let (status, _) = send_request(req, configure(app_api, WebhookSignatureCheck::disabled())).await;
    assert_eq!(status, StatusCode::OK);
    let req = form_post("/api/flow/confirmation", "token=tok-paid");
    let (status, body) = send_request(req, configure(api, WebhookSignatureCheck::disabled())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    let product = db.fetch_product(product_id).await.unwrap().unwrap();
    assert_eq!(product.stock, 3);
}

#[actix_web::test]
async fn confirmation_without_a_token_is_acknowledged() {
    let Fixture { db, .. } = prepare_shop().await;
    let mut gateway = MockGateway::new();
    gateway.expect_payment_status().never();
    let api = api(&db, gateway, MockNotifier::new());
    let req = form_post("/api/flow/confirmation", "");
    let (status, body) = send_request(req, configure(api.clone(), WebhookSignatureCheck::disabled())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    // Not even a form
    let req = TestRequest::post().uri("/api/flow/confirmation");
    let (status, body) = send_request(req, configure(api, WebhookSignatureCheck::disabled())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    assert_eq!(order_status(&db).await, OrderStatusType::Pending);
}

#[actix_web::test]
async fn confirmation_survives_gateway_failure() {
    let Fixture { db, .. } = prepare_shop().await;
    let mut gateway = MockGateway::new();
    gateway.expect_payment_status().times(1).returning(|_| Err(GatewayError::Unreachable("timed out".into())));
    let mut notifier = MockNotifier::new();
    notifier.expect_send_order_confirmation().never();
    let api = api(&db, gateway, notifier);
    let req = form_post("/api/flow/confirmation", "token=tok-paid");
    let (status, body) = send_request(req, configure(api, WebhookSignatureCheck::disabled())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    assert_eq!(order_status(&db).await, OrderStatusType::Pending);
}

#[actix_web::test]
async fn confirmation_for_an_unknown_order_is_acknowledged() {
    let Fixture { db, .. } = prepare_shop().await;
    let mut notifier = MockNotifier::new();
    notifier.expect_send_order_confirmation().never();
    let api = api(&db, gateway_paying("tok-ghost", "order-ghost", 1), notifier);
    let req = form_post("/api/flow/confirmation", "token=tok-ghost");
    let (status, body) = send_request(req, configure(api, WebhookSignatureCheck::disabled())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    assert_eq!(order_status(&db).await, OrderStatusType::Pending);
}

#[actix_web::test]
async fn confirmation_with_a_bad_signature_is_ignored() {
    let Fixture { db, .. } = prepare_shop().await;
    let mut gateway = MockGateway::new();
    gateway.expect_payment_status().never();
    let api = api(&db, gateway, MockNotifier::new());
    let signer = FlowSigner::new(&Secret::new("webhook-secret".to_string())).unwrap();
    let body = format!("token=tok-paid&{SIGNATURE_PARAM}=deadbeef");
    let req = form_post("/api/flow/confirmation", &body);
    let (status, body) = send_request(req, configure(api, WebhookSignatureCheck::new(signer))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    assert_eq!(order_status(&db).await, OrderStatusType::Pending);
}

#[actix_web::test]
async fn confirmation_with_a_valid_signature_settles() {
    let Fixture { db, .. } = prepare_shop().await;
    let api = api(&db, gateway_paying("tok-paid", ORDER_ID, 1), notifier_expecting(1));
    let signer = FlowSigner::new(&Secret::new("webhook-secret".to_string())).unwrap();
    let params = [("token".to_string(), "tok-paid".to_string())].into_iter().collect();
    let body = format!("token=tok-paid&{SIGNATURE_PARAM}={}", signer.sign(&params));
    let req = form_post("/api/flow/confirmation", &body);
    let (status, _) = send_request(req, configure(api, WebhookSignatureCheck::new(signer))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order_status(&db).await, OrderStatusType::Processing);
}

//----------------------------------------------   Verification  ----------------------------------------------------

#[actix_web::test]
async fn verify_requires_a_token() {
    let Fixture { db, .. } = prepare_shop().await;
    let mut gateway = MockGateway::new();
    gateway.expect_payment_status().never();
    let api = api(&db, gateway, MockNotifier::new());
    let expected = r#"{"error":"Could not read request body: A payment token is required"}"#;
    for body in ["{}", r#"{"token":"  "}"#, "not json"] {
        let req = json_post("/api/flow/verify", body);
        let (status, body) = send_request(req, configure(api.clone(), WebhookSignatureCheck::disabled())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, expected);
    }
}

#[actix_web::test]
async fn verify_settles_and_reports_the_payment() {
    let Fixture { db, .. } = prepare_shop().await;
    let api = api(&db, gateway_paying("tok-paid", ORDER_ID, 1), notifier_expecting(1));
    let req = json_post("/api/flow/verify", r#"{"token":"tok-paid"}"#);
    let (status, body) = send_request(req, configure(api, WebhookSignatureCheck::disabled())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":2,"commerceOrder":"cm1a2b3c4d5e6f7g8h","amount":120000}"#);
    assert_eq!(order_status(&db).await, OrderStatusType::Processing);
}

#[actix_web::test]
async fn verify_reports_unpaid_status_without_settling() {
    let Fixture { db, .. } = prepare_shop().await;
    let mut gateway = MockGateway::new();
    gateway
        .expect_payment_status()
        .returning(|_| Ok(GatewayPayment::new(ORDER_ID, PaymentStatusCode::Pending, Clp::from(120_000))));
    let mut notifier = MockNotifier::new();
    notifier.expect_send_order_confirmation().never();
    let api = api(&db, gateway, notifier);
    let req = json_post("/api/flow/verify", r#"{"token":"tok-pending"}"#);
    let (status, body) = send_request(req, configure(api, WebhookSignatureCheck::disabled())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":1,"commerceOrder":"cm1a2b3c4d5e6f7g8h","amount":120000}"#);
    assert_eq!(order_status(&db).await, OrderStatusType::Pending);
}

#[actix_web::test]
async fn verify_reports_payments_for_unknown_orders() {
    let Fixture { db, .. } = prepare_shop().await;
    let mut notifier = MockNotifier::new();
    notifier.expect_send_order_confirmation().never();
    let api = api(&db, gateway_paying("tok-ghost", "order-ghost", 1), notifier);
    let req = json_post("/api/flow/verify", r#"{"token":"tok-ghost"}"#);
    let (status, body) = send_request(req, configure(api, WebhookSignatureCheck::disabled())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":2,"commerceOrder":"order-ghost","amount":120000}"#);
    assert_eq!(order_status(&db).await, OrderStatusType::Pending);
}

#[actix_web::test]
async fn verify_fails_when_the_gateway_does() {
    let Fixture { db, .. } = prepare_shop().await;
    let mut gateway = MockGateway::new();
    gateway
        .expect_payment_status()
        .returning(|_| Err(GatewayError::Rejected { status: 401, message: "Invalid apiKey".into() }));
    let api = api(&db, gateway, MockNotifier::new());
    let req = json_post("/api/flow/verify", r#"{"token":"tok-paid"}"#);
    let (status, body) = send_request(req, configure(api, WebhookSignatureCheck::disabled())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with(r#"{"error":"#));
    assert_eq!(order_status(&db).await, OrderStatusType::Pending);
}

#[actix_web::test]
async fn failed_notification_does_not_undo_settlement() {
    let Fixture { db, .. } = prepare_shop().await;
    let mut notifier = MockNotifier::new();
    notifier.expect_send_order_confirmation().times(1).returning(|_| NotificationResult::failed("email not configured"));
    let api = api(&db, gateway_paying("tok-paid", ORDER_ID, 1), notifier);
    let req = json_post("/api/flow/verify", r#"{"token":"tok-paid"}"#);
    let (status, _) = send_request(req, configure(api, WebhookSignatureCheck::disabled())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order_status(&db).await, OrderStatusType::Processing);
}

#[actix_web::test]
async fn verify_reports_the_payment_when_the_store_fails() {
    let Fixture { db, product_id, .. } = prepare_shop().await;
    block_client_updates(&db).await;
    let mut notifier = MockNotifier::new();
    notifier.expect_send_order_confirmation().never();
    let api = api(&db, gateway_paying("tok-paid", ORDER_ID, 1), notifier);
    let req = json_post("/api/flow/verify", r#"{"token":"tok-paid"}"#);
    let (status, body) = send_request(req, configure(api, WebhookSignatureCheck::disabled())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":2,"commerceOrder":"cm1a2b3c4d5e6f7g8h","amount":120000}"#);
    assert_eq!(order_status(&db).await, OrderStatusType::Pending);
    let product = db.fetch_product(product_id).await.unwrap().unwrap();
    assert_eq!(product.stock, 5);
}
