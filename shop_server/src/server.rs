use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use settlement_engine::{events::EventProducers, SettlementApi, SqliteDatabase};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    helpers::WebhookSignatureCheck,
    integrations::{create_whatsapp_event_handlers, FlowGateway, ResendMailer},
    routes::{
        create_payment,
        flow_confirmation_status,
        health,
        FlowConfirmationRoute,
        FlowVerifyRoute,
        TransferInstructionsRoute,
    },
};

pub type ShopSettlementApi = SettlementApi<SqliteDatabase, FlowGateway, ResendMailer>;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🚀️ Database ready at {}", config.database_url);
    let handlers = create_whatsapp_event_handlers(config.whatsapp.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let producers = handlers.producers();
    // Held until the server stops. Dropping it would abort the handlers.
    let _event_handlers = handlers.start_handlers();
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let gateway = FlowGateway::new(config.flow.clone()).map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
    let mailer = ResendMailer::new(config.email.clone())?;
    let signature_check = if config.verify_webhook_signatures {
        WebhookSignatureCheck::new(gateway.signer().clone())
    } else {
        WebhookSignatureCheck::disabled()
    };
    let settlement_api: web::Data<ShopSettlementApi> =
        web::Data::new(SettlementApi::new(db, gateway.clone(), mailer, config.segment_rules, producers));
    let gateway = web::Data::new(gateway);
    let signature_check = web::Data::new(signature_check);
    let host = config.host.clone();
    let port = config.port;
    let config = web::Data::new(config);
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("shop::access_log"))
            .app_data(settlement_api.clone())
            .app_data(gateway.clone())
            .app_data(signature_check.clone())
            .app_data(config.clone())
            .service(health)
            .service(flow_confirmation_status)
            .service(FlowConfirmationRoute::<SqliteDatabase, FlowGateway, ResendMailer>::new())
            .service(FlowVerifyRoute::<SqliteDatabase, FlowGateway, ResendMailer>::new())
            .service(TransferInstructionsRoute::<SqliteDatabase, FlowGateway, ResendMailer>::new())
            .service(create_payment)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
