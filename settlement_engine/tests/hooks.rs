use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use log::*;
use settlement_engine::{
    db_types::{Clp, NewClient, NewOrder, NewOrderLine, NewProduct, OrderId},
    events::{EventHandlers, EventHooks, EventProducers, OrderSettledEvent},
    test_utils::{
        prepare_env::{prepare_test_env, random_db_path},
        RecordingNotifier,
        ScriptedGateway,
    },
    GatewayPayment,
    SettlementApi,
    SettlementDatabase,
    SqliteDatabase,
};
use shop_common::PaymentStatusCode;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use tokio::runtime::Runtime;

#[derive(Default, Clone)]
struct HookCalled {
    events: Arc<Mutex<Vec<OrderSettledEvent>>>,
}

impl HookCalled {
    pub fn called(&self, event: OrderSettledEvent) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<OrderSettledEvent> {
        self.events.lock().unwrap().clone()
    }
}

async fn setup(producers: EventProducers) -> SettlementApi<SqliteDatabase, ScriptedGateway, RecordingNotifier> {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let client = db
        .insert_client(NewClient::new("Carla Soto", "carla@example.com").with_phone("+56933334444"))
        .await
        .expect("Error creating client");
    let product = db.insert_product(NewProduct::new("Extensiones 50cm", Clp::from(50_000), 3)).await.unwrap();
    for id in ["order-h1", "order-h2"] {
        let lines = vec![NewOrderLine::new(product.id, 1, Clp::from(50_000))];
        db.insert_order(NewOrder::new(OrderId::from(id), client.id, lines)).await.expect("Error inserting order");
    }
    let gateway = ScriptedGateway::new()
        .with_payment("paid-1", GatewayPayment::new("order-h1", PaymentStatusCode::Paid, Clp::from(50_000)))
        .with_payment("pending-2", GatewayPayment::new("order-h2", PaymentStatusCode::Pending, Clp::from(50_000)));
    SettlementApi::new(db, gateway, RecordingNotifier::new(), Default::default(), producers)
}

async fn tear_down(db: SqliteDatabase) {
    let mut db = db;
    if let Err(e) = db.close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    Sqlite::drop_database(db.url()).await.unwrap();
}

fn recording_hook(hooks: &mut EventHooks, name: &str, hook: HookCalled) {
    let name = name.to_string();
    hooks.on_order_settled(name.clone(), move |ev| {
        let hook = hook.clone();
        let name = name.clone();
        async move {
            info!("🪝️ {name}: order settled: {}", ev.settled.order.order_id);
            hook.called(ev);
        }
        .boxed()
    });
}

#[test]
fn on_order_settled() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let rt = Runtime::new().unwrap();
    let hook = HookCalled::default();
    let hook_copy = hook.clone();
    rt.block_on(async move {
        let mut hooks = EventHooks::default();
        recording_hook(&mut hooks, "recorder", hook_copy);
        let handlers = EventHandlers::new(8, hooks);
        let producers = handlers.producers();
        let mut running = handlers.start_handlers();

        let api = setup(producers).await;
        let _ = api.settle("paid-1").await.expect("Error settling order");
        // Neither a duplicate nor an unpaid order produce an event
        let _ = api.settle("paid-1").await.expect("Error settling order");
        let _ = api.settle("pending-2").await.expect("Error settling order");
        let db = api.db().clone();
        // Dropping the api drops the last producer, which lets the handler finish
        drop(api);
        while let Some(res) = running.join_next().await {
            res.expect("Event handler failed");
        }
        tear_down(db).await;
    });
    let events = hook.events();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.settled.order.order_id, OrderId::from("order-h1"));
    assert_eq!(event.settled.client.phone.as_deref(), Some("+56933334444"));
    assert_eq!(event.payment.status, PaymentStatusCode::Paid);
    info!("🪝️ test complete");
}

#[test]
fn every_subscriber_gets_its_own_copy() {
    let _ = env_logger::try_init();
    let rt = Runtime::new().unwrap();
    let whatsapp = HookCalled::default();
    let crm = HookCalled::default();
    let (w, c) = (whatsapp.clone(), crm.clone());
    rt.block_on(async move {
        let mut hooks = EventHooks::default();
        recording_hook(&mut hooks, "whatsapp", w);
        recording_hook(&mut hooks, "crm", c);
        let handlers = EventHandlers::new(1, hooks);
        assert_eq!(handlers.order_settled_subscribers(), vec!["whatsapp", "crm"]);
        let producers = handlers.producers();
        let mut running = handlers.start_handlers();
        let api = setup(producers).await;
        assert!(api.settle("paid-1").await.unwrap().outcome.is_settled());
        let db = api.db().clone();
        drop(api);
        while let Some(res) = running.join_next().await {
            res.expect("Event handler failed");
        }
        tear_down(db).await;
    });
    assert_eq!(whatsapp.events().len(), 1);
    assert_eq!(crm.events(), whatsapp.events());
}

#[test]
fn producers_follow_registered_hooks() {
    let hooks = EventHooks::default();
    assert!(hooks.is_empty());
    let handlers = EventHandlers::new(1, hooks);
    assert_eq!(handlers.producers().order_settled_subscriber_count(), 0);
    let mut hooks = EventHooks::default();
    hooks.on_order_settled("noop", |_| async {}.boxed());
    assert!(!hooks.is_empty());
    let handlers = EventHandlers::new(1, hooks);
    assert_eq!(handlers.producers().order_settled_subscriber_count(), 1);
}
