use actix_web::{http::StatusCode, web, web::ServiceConfig};
use settlement_engine::{
    db_types::{Clp, OrderId, OrderStatusType},
    events::EventProducers,
    NotificationResult,
    OrderManagement,
    SettlementApi,
    SqliteDatabase,
};

use super::{
    helpers::{json_post, prepare_shop, send_request, Fixture, ORDER_ID},
    mocks::{MockGateway, MockNotifier},
};
use crate::routes::TransferInstructionsRoute;

type Api = SettlementApi<SqliteDatabase, MockGateway, MockNotifier>;

const PATH: &str = "/api/orders/cm1a2b3c4d5e6f7g8h/transfer-instructions";

fn configure(db: &SqliteDatabase, notifier: MockNotifier) -> impl FnOnce(&mut ServiceConfig) {
    let api: web::Data<Api> = web::Data::new(SettlementApi::new(
        db.clone(),
        MockGateway::new(),
        notifier,
        Default::default(),
        EventProducers::default(),
    ));
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(api).service(TransferInstructionsRoute::<SqliteDatabase, MockGateway, MockNotifier>::new());
    }
}

fn notifier_expecting_shipping(shipping: i64, result: NotificationResult) -> MockNotifier {
    let mut notifier = MockNotifier::new();
    notifier
        .expect_send_transfer_instructions()
        .withf(move |i| {
            i.order.order_id == OrderId::from(ORDER_ID) &&
                i.shipping == Clp::from(shipping) &&
                i.amount_due() == Clp::from(120_000 + shipping) &&
                i.items.len() == 1 &&
                i.items[0].product_name == "Extensiones 60cm" &&
                i.client.email == "ana@example.com"
        })
        .times(1)
        .return_once(move |_| result);
    notifier
}

fn silent_notifier() -> MockNotifier {
    let mut notifier = MockNotifier::new();
    notifier.expect_send_transfer_instructions().never();
    notifier
}

#[actix_web::test]
async fn transfer_instructions_use_the_standard_shipping_fee() {
    let Fixture { db, .. } = prepare_shop().await;
    let notifier = notifier_expecting_shipping(0, NotificationResult::sent());
    let (status, body) = send_request(json_post(PATH, ""), configure(&db, notifier)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"error":null}"#);
    let order = db.fetch_order_by_order_id(&OrderId::from(ORDER_ID)).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Pending);
}

#[actix_web::test]
async fn transfer_instructions_take_the_shipping_fee_from_the_request() {
    let Fixture { db, .. } = prepare_shop().await;
    let notifier = notifier_expecting_shipping(5_990, NotificationResult::sent());
    let (status, _) = send_request(json_post(PATH, r#"{"shipping":5990}"#), configure(&db, notifier)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn failed_transfer_email_is_reported_not_raised() {
    let Fixture { db, .. } = prepare_shop().await;
    let notifier = notifier_expecting_shipping(0, NotificationResult::failed("email not configured"));
    let (status, body) = send_request(json_post(PATH, "{}"), configure(&db, notifier)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":false,"error":"email not configured"}"#);
}

#[actix_web::test]
async fn transfer_instructions_for_an_unknown_order() {
    let Fixture { db, .. } = prepare_shop().await;
    let req = json_post("/api/orders/order-ghost/transfer-instructions", "");
    let (status, body) = send_request(req, configure(&db, silent_notifier())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r##"{"error":"The data was not found. Order #order-ghost does not exist"}"##);
}

#[actix_web::test]
async fn transfer_instructions_only_for_pending_orders() {
    let Fixture { db, .. } = prepare_shop().await;
    db.update_order_status(&OrderId::from(ORDER_ID), OrderStatusType::Processing).await.unwrap();
    let (status, body) = send_request(json_post(PATH, ""), configure(&db, silent_notifier())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("is Processing"), "{body}");
}

#[actix_web::test]
async fn negative_shipping_is_rejected() {
    let Fixture { db, .. } = prepare_shop().await;
    let (status, body) = send_request(json_post(PATH, r#"{"shipping":-1}"#), configure(&db, silent_notifier())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Could not read request body: The shipping fee cannot be negative"}"#);
}
