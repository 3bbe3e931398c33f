//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any long, non-cpu-bound operation (e.g. I/O, database operations,
//! etc.) should be expressed as futures or asynchronous functions. Async handlers get executed concurrently by worker
//! threads and thus don’t block execution.
use std::collections::BTreeMap;

use actix_web::{get, post, web, HttpResponse, Responder};
use flow_tools::NewPaymentRequest;
use log::*;
use settlement_engine::{
    db_types::{Clp, OrderId},
    OrderManagement,
    OrderNotifier,
    PaymentStatusLookup,
    SettlementApi,
    SettlementDatabase,
};

use crate::{
    config::ServerConfig,
    data_objects::{CreatePaymentParams, CreatePaymentResponse, TransferRequest, VerifyRequest, VerifyResponse},
    errors::ServerError,
    helpers::WebhookSignatureCheck,
    integrations::FlowGateway,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Flow webhook  ----------------------------------------------------
/// Lets the gateway (and anyone configuring it) check that the confirmation endpoint is reachable.
#[get("/api/flow/confirmation")]
pub async fn flow_confirmation_status() -> impl Responder {
    trace!("💻️ Received GET on the Flow confirmation endpoint");
    HttpResponse::Ok().content_type("text/plain").body("Webhook Flow activo")
}

route!(flow_confirmation => Post "/api/flow/confirmation" impl SettlementDatabase, PaymentStatusLookup, OrderNotifier);
/// Route handler for the gateway's server-to-server payment confirmation.
///
/// The gateway posts a form with the payment `token`. The token is resolved with the gateway and, if the payment was
/// approved, the order is settled.
///
/// The gateway retries deliveries that do not get a 200, and there is nothing a retry could fix here, so every call is
/// answered with 200 `OK`. This includes calls without a token, calls with an invalid signature, gateway lookup
/// failures, unknown orders and duplicate deliveries. What actually happened is in the logs.
pub async fn flow_confirmation<B, G, N>(
    form: Option<web::Form<BTreeMap<String, String>>>,
    api: web::Data<SettlementApi<B, G, N>>,
    signature_check: web::Data<WebhookSignatureCheck>,
) -> HttpResponse
where
    B: SettlementDatabase,
    G: PaymentStatusLookup,
    N: OrderNotifier,
{
    trace!("💻️ Received Flow payment confirmation");
    let Some(web::Form(params)) = form else {
        warn!("💻️ Flow confirmation did not contain a readable form. Ignoring it.");
        return webhook_ack();
    };
    if !signature_check.is_acceptable(&params) {
        warn!("💻️ Flow confirmation has an invalid signature. Ignoring it. Params: {params:?}");
        return webhook_ack();
    }
    let Some(token) = params.get("token").map(|t| t.trim()).filter(|t| !t.is_empty()) else {
        warn!("💻️ Flow confirmation did not include a payment token. Ignoring it.");
        return webhook_ack();
    };
    match api.settle(token).await {
        Ok(settlement) => {
            info!("💻️ Flow confirmation for order {}: {}", settlement.payment.order_id, settlement.outcome)
        },
        Err(e) => warn!("💻️ Flow confirmation could not be processed. It can be retried via verification. {e}"),
    }
    webhook_ack()
}

fn webhook_ack() -> HttpResponse {
    HttpResponse::Ok().content_type("text/plain").body("OK")
}

//----------------------------------------------   Verification  ----------------------------------------------------
route!(flow_verify => Post "/api/flow/verify" impl SettlementDatabase, PaymentStatusLookup, OrderNotifier);
/// Route handler for the buyer-facing payment verification.
///
/// The checkout result page posts the token it got back from the gateway. This settles the order if the webhook has
/// not done so yet, and reports the gateway's view of the payment. Settlement failures are never exposed to the buyer;
/// the only errors are a missing token (400) and a failed gateway lookup (500).
pub async fn flow_verify<B, G, N>(
    body: Option<web::Json<VerifyRequest>>,
    api: web::Data<SettlementApi<B, G, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase,
    G: PaymentStatusLookup,
    N: OrderNotifier,
{
    let token = body
        .and_then(|b| b.into_inner().token)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ServerError::InvalidRequestBody("A payment token is required".into()))?;
    debug!("💻️ POST verify payment");
    let settlement = api.settle(&token).await.map_err(|e| {
        debug!("💻️ Could not verify payment. {e}");
        ServerError::from(e)
    })?;
    debug!("💻️ Payment for order {} verified: {}", settlement.payment.order_id, settlement.outcome);
    Ok(HttpResponse::Ok().json(VerifyResponse::from(&settlement.payment)))
}

//----------------------------------------------   Bank transfers  ----------------------------------------------------
route!(transfer_instructions => Post "/api/orders/{order_id}/transfer-instructions"
    impl OrderManagement, PaymentStatusLookup, OrderNotifier);
/// Route handler for emailing bank transfer instructions for a pending order.
///
/// Checkout calls this when the buyer chooses to pay by transfer instead of through the gateway. The body may carry
/// the `shipping` fee charged; without one, the standard fee for the order total applies. The response reports
/// whether the email went out. An email that could not be sent is not an error.
pub async fn transfer_instructions<B, G, N>(
    path: web::Path<String>,
    body: Option<web::Json<TransferRequest>>,
    api: web::Data<SettlementApi<B, G, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    G: PaymentStatusLookup,
    N: OrderNotifier,
{
    let order_id = OrderId::from(path.into_inner());
    let shipping = body.and_then(|b| b.into_inner().shipping);
    if shipping.is_some_and(|fee| fee < Clp::default()) {
        return Err(ServerError::InvalidRequestBody("The shipping fee cannot be negative".into()));
    }
    debug!("💻️ POST transfer instructions for order {order_id}");
    let result = api.send_transfer_instructions(&order_id, shipping).await?;
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   Payments  ----------------------------------------------------
/// Route handler for creating a new payment on the gateway.
///
/// Returns the URL the buyer must be redirected to, and the payment token. The gateway will call
/// `/api/flow/confirmation` once the buyer has paid, and send the buyer back to the checkout result page.
#[post("/api/payments")]
pub async fn create_payment(
    body: Option<web::Json<CreatePaymentParams>>,
    gateway: web::Data<FlowGateway>,
    config: web::Data<ServerConfig>,
) -> Result<HttpResponse, ServerError> {
    let params = body
        .map(|b| b.into_inner())
        .ok_or_else(|| ServerError::InvalidRequestBody("orderId, subject, amount and email are required".into()))?;
    if [&params.order_id, &params.subject, &params.email].iter().any(|s| s.trim().is_empty()) {
        return Err(ServerError::InvalidRequestBody("orderId, subject and email cannot be empty".into()));
    }
    let amount = Clp::from_gateway_amount(params.amount).map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
    debug!("💻️ POST create payment of {amount} for order {}", params.order_id);
    let request = NewPaymentRequest {
        commerce_order: params.order_id.clone(),
        subject: params.subject.clone(),
        amount,
        email: params.email.clone(),
        url_confirmation: config.confirmation_url(),
        url_return: config.return_url(),
        optional: params.metadata(),
    };
    let payment = gateway.create_payment(request).await.map_err(|e| {
        warn!("💻️ Could not create a payment for order {}. {e}", params.order_id);
        ServerError::from(e)
    })?;
    info!("💻️ Payment {} created for order {}", payment.flow_order, params.order_id);
    Ok(HttpResponse::Ok().json(CreatePaymentResponse { url: payment.url, token: payment.token }))
}
