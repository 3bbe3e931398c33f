//! Adapters between the settlement engine and the outside world: the payment gateway, the email provider and
//! WhatsApp.
pub mod email;
pub mod flow;
pub mod whatsapp;

pub use email::ResendMailer;
pub use flow::FlowGateway;
pub use whatsapp::{create_whatsapp_event_handlers, WhatsAppError, WhatsAppSender};
