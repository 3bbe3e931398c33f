use actix_web::{http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use log::debug;
use settlement_engine::{
    db_types::{Clp, NewClient, NewOrder, NewOrderLine, NewProduct, OrderId},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    SqliteDatabase,
};

pub const ORDER_ID: &str = "cm1a2b3c4d5e6f7g8h";

pub struct Fixture {
    pub db: SqliteDatabase,
    pub client_id: i64,
    pub product_id: i64,
}

/// A fresh database with one client, one product with 5 units in stock, and one pending order for 2 units, worth
/// 120,000.
pub async fn prepare_shop() -> Fixture {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let client = db
        .insert_client(NewClient::new("Ana Pérez", "ana@example.com").with_phone("+56911112222"))
        .await
        .expect("Error creating client");
    let product = db
        .insert_product(NewProduct::new("Extensiones 60cm", Clp::from(60_000), 5))
        .await
        .expect("Error creating product");
    let lines = vec![NewOrderLine::new(product.id, 2, Clp::from(60_000))];
    db.insert_order(NewOrder::new(OrderId::from(ORDER_ID), client.id, lines).with_shipping_address("Av. Sucre 2356"))
        .await
        .expect("Error creating order");
    Fixture { db, client_id: client.id, product_id: product.id }
}

pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = test::init_service(App::new().configure(configure)).await;
    debug!("Making request");
    let res = test::call_service(&app, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}

pub fn form_post(path: &str, body: &str) -> TestRequest {
    TestRequest::post()
        .uri(path)
        .insert_header(("content-type", "application/x-www-form-urlencoded"))
        .set_payload(body.to_string())
}

pub fn json_post(path: &str, body: &str) -> TestRequest {
    TestRequest::post().uri(path).insert_header(("content-type", "application/json")).set_payload(body.to_string())
}
