use std::time::Duration;

use futures::future::BoxFuture;
use log::*;
use reqwest::Client;
use serde::Deserialize;
use settlement_engine::{
    events::{EventHandlers, EventHooks, OrderSettledEvent},
    SettledOrder,
};
use thiserror::Error;

use crate::config::WhatsAppConfig;

pub const TWILIO_API_URL: &str = "https://api.twilio.com/2010-04-01";
pub const WHATSAPP_EVENT_BUFFER_SIZE: usize = 25;

#[derive(Debug, Error)]
pub enum WhatsAppError {
    #[error("WhatsApp is not configured")]
    NotConfigured,
    #[error("Could not create the WhatsApp client. {0}")]
    Initialization(String),
    #[error("Could not send the WhatsApp message. {0}")]
    RequestError(String),
    #[error("The WhatsApp message was rejected. Error {status}. {message}")]
    Rejected { status: u16, message: String },
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
}

/// Sends WhatsApp messages through Twilio's messaging API.
#[derive(Clone)]
pub struct WhatsAppSender {
    config: WhatsAppConfig,
    api_url: String,
    client: Client,
}

impl WhatsAppSender {
    pub fn new(config: WhatsAppConfig) -> Result<Self, WhatsAppError> {
        if !config.is_configured() {
            return Err(WhatsAppError::NotConfigured);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| WhatsAppError::Initialization(e.to_string()))?;
        Ok(Self { config, api_url: TWILIO_API_URL.to_string(), client })
    }

    /// Sends `body` to `phone`. Returns the message id assigned by Twilio.
    pub async fn send(&self, phone: &str, body: &str) -> Result<String, WhatsAppError> {
        let url = format!("{}/Accounts/{}/Messages.json", self.api_url, self.config.account_sid);
        let to = whatsapp_address(phone);
        let params = [("To", to.as_str()), ("From", self.config.from.as_str()), ("Body", body)];
        let response = self
            .client
            .post(url)
            .basic_auth(&self.config.account_sid, Some(self.config.auth_token.reveal()))
            .form(&params)
            .send()
            .await
            .map_err(|e| WhatsAppError::RequestError(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(WhatsAppError::Rejected { status: status.as_u16(), message });
        }
        let message =
            response.json::<MessageResponse>().await.map_err(|e| WhatsAppError::RequestError(e.to_string()))?;
        Ok(message.sid)
    }
}

/// Twilio addresses WhatsApp numbers as `whatsapp:+56912345678`.
pub fn whatsapp_address(phone: &str) -> String {
    let phone: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    if phone.starts_with("whatsapp:") {
        phone
    } else {
        format!("whatsapp:{phone}")
    }
}

pub fn order_settled_message(settled: &SettledOrder) -> String {
    let items = settled
        .lines
        .iter()
        .map(|line| {
            let name = settled.product_name(line.product_id).unwrap_or("Product");
            format!("• {name} x{}", line.quantity)
        })
        .collect::<Vec<String>>()
        .join("\n");
    format!(
        "✨ *Payment confirmed!* ✨\n\nHi {}, we have received the payment for your order *#{}*.\n\n{items}\n\nTotal: \
         {}\n\nWe will let you know as soon as it ships.",
        settled.client.name,
        settled.order.order_id.short_ref(),
        settled.order.total
    )
}

/// Sends a WhatsApp message to the buyer whenever an order is settled.
///
/// When Twilio is not configured no hook is registered, and the returned handlers do nothing. Buyers without a phone
/// number are skipped. Delivery failures are logged and otherwise ignored.
pub fn create_whatsapp_event_handlers(config: WhatsAppConfig) -> Result<EventHandlers, WhatsAppError> {
    let mut hooks = EventHooks::default();
    if !config.is_configured() {
        info!("💬️ WhatsApp is not configured. No messages will be sent when orders are settled.");
        return Ok(EventHandlers::new(WHATSAPP_EVENT_BUFFER_SIZE, hooks));
    }
    let sender = WhatsAppSender::new(config)?;
    hooks.on_order_settled("whatsapp", move |ev| {
        let OrderSettledEvent { settled, .. } = ev;
        let Some(phone) = settled.client.phone.clone().filter(|p| !p.trim().is_empty()) else {
            debug!("💬️ Client {} has no phone number. No WhatsApp message sent.", settled.client.id);
            return no_op();
        };
        let sender = sender.clone();
        Box::pin(async move {
            let body = order_settled_message(&settled);
            match sender.send(&phone, &body).await {
                Ok(sid) => info!("💬️ WhatsApp confirmation for {} sent. Message id {sid}", settled.order.order_id),
                Err(e) => warn!("💬️ Could not send WhatsApp confirmation for {}. {e}", settled.order.order_id),
            }
        })
    });
    Ok(EventHandlers::new(WHATSAPP_EVENT_BUFFER_SIZE, hooks))
}

fn no_op() -> BoxFuture<'static, ()> {
    Box::pin(async {})
}
