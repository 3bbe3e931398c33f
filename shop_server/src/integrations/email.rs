//! Order emails, sent through the Resend HTTP API: the payment confirmation and the bank transfer instructions.
use std::time::Duration;

use log::*;
use reqwest::Client;
use serde::Serialize;
use settlement_engine::{
    db_types::{self, Clp},
    NotificationResult,
    OrderNotifier,
    SettledOrder,
    TransferInstructions,
};

use crate::{config::EmailConfig, errors::ServerError};

pub const RESEND_API_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Serialize)]
struct ResendEmail<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: String,
    html: String,
}

#[derive(Clone)]
pub struct ResendMailer {
    config: EmailConfig,
    api_url: String,
    client: Client,
}

impl ResendMailer {
    pub fn new(config: EmailConfig) -> Result<Self, ServerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| ServerError::InitializeError(format!("Could not create the email client. {e}")))?;
        Ok(Self { config, api_url: RESEND_API_URL.to_string(), client })
    }

    pub fn with_api_url<S: Into<String>>(mut self, url: S) -> Self {
        self.api_url = url.into();
        self
    }
}

impl ResendMailer {
    async fn send(&self, client: &db_types::Client, subject: String, html: String, what: &str) -> NotificationResult {
        if !self.config.is_configured() {
            debug!("📧️ Email is not configured. No {what} sent");
            return NotificationResult::failed("email not configured");
        }
        let to = client.email.trim();
        if to.is_empty() {
            return NotificationResult::failed(format!("Client {} has no email address", client.id));
        }
        let email = ResendEmail { from: &self.config.from, to: vec![to], subject, html };
        let response = self.client.post(&self.api_url).bearer_auth(self.config.api_key.reveal()).json(&email).send().await;
        match response {
            Ok(res) if res.status().is_success() => {
                info!("📧️ {what} sent to {to}");
                NotificationResult::sent()
            },
            Ok(res) => {
                let status = res.status();
                let body = res.text().await.unwrap_or_default();
                warn!("📧️ The email provider rejected the {what}. {status}. {body}");
                NotificationResult::failed(format!("Email provider returned {status}: {body}"))
            },
            Err(e) => {
                warn!("📧️ Could not reach the email provider. {e}");
                NotificationResult::failed(e.to_string())
            },
        }
    }
}

impl OrderNotifier for ResendMailer {
    async fn send_order_confirmation(&self, settled: &SettledOrder) -> NotificationResult {
        let what = format!("order confirmation for {}", settled.order.order_id);
        self.send(&settled.client, confirmation_subject(settled), render_confirmation(settled), &what).await
    }

    async fn send_transfer_instructions(&self, instructions: &TransferInstructions) -> NotificationResult {
        let what = format!("transfer instructions for {}", instructions.order.order_id);
        let html = render_transfer_instructions(instructions, &self.config.transfer_details);
        self.send(&instructions.client, transfer_subject(instructions), html, &what).await
    }
}

pub fn confirmation_subject(settled: &SettledOrder) -> String {
    format!("Payment confirmed! Order #{}", settled.order.order_id.short_ref())
}

pub fn render_confirmation(settled: &SettledOrder) -> String {
    let order = &settled.order;
    let rows = settled
        .lines
        .iter()
        .map(|line| {
            let name = settled.product_name(line.product_id).map(escape_html).unwrap_or_else(|| {
                format!("Product {}", line.product_id)
            });
            format!(
                "<tr><td>{name} x{}</td><td style=\"text-align:right\">{}</td></tr>",
                line.quantity,
                line.line_total()
            )
        })
        .collect::<Vec<String>>()
        .join("\n");
    let address = order.shipping_address.as_deref().map(escape_html).unwrap_or_else(|| "Not provided".to_string());
    format!(
        r#"<html>
<body style="font-family:sans-serif">
<h1>Thank you for your order!</h1>
<p>Hi <strong>{name}</strong>,</p>
<p>Your payment was confirmed. These are the details of your purchase:</p>
<p><strong>Order #{reference}</strong><br/>Date: {date}</p>
<table width="100%">
{rows}
<tr><td><strong>Total</strong></td><td style="text-align:right"><strong>{total}</strong></td></tr>
</table>
<h3>Shipping address</h3>
<p>{address}</p>
</body>
</html>"#,
        name = escape_html(&settled.client.name),
        reference = order.order_id.short_ref(),
        date = order.created_at.format("%d/%m/%Y"),
        total = order.total,
    )
}

pub fn transfer_subject(instructions: &TransferInstructions) -> String {
    format!("Bank transfer details - Order #{}", instructions.order.order_id.short_ref())
}

/// `transfer_details` is the shop's bank account, as free text. Each line is rendered on its own line.
pub fn render_transfer_instructions(instructions: &TransferInstructions, transfer_details: &str) -> String {
    let order = &instructions.order;
    let rows = instructions
        .items
        .iter()
        .map(|item| {
            format!(
                "<tr><td>{} x{}</td><td style=\"text-align:right\">{}</td></tr>",
                escape_html(&item.product_name),
                item.quantity,
                item.line_total()
            )
        })
        .collect::<Vec<String>>()
        .join("\n");
    let shipping = match instructions.shipping {
        fee if fee == Clp::default() => "Free".to_string(),
        fee => fee.to_string(),
    };
    let account = match transfer_details.trim() {
        "" => "<p>We will send you our bank account details shortly.</p>".to_string(),
        details => format!("<p>{}</p>", details.lines().map(escape_html).collect::<Vec<String>>().join("<br/>")),
    };
    let address = order.shipping_address.as_deref().map(escape_html).unwrap_or_else(|| "Not provided".to_string());
    format!(
        r#"<html>
<body style="font-family:sans-serif">
<h1>Thank you for your order!</h1>
<p>Hi <strong>{name}</strong>,</p>
<p>Your order is reserved. To complete it, please transfer <strong>{due}</strong> and include the reference
<strong>{reference}</strong> in the transfer comment. Your order will be processed once the payment is received.</p>
<h3>Bank account</h3>
{account}
<p><strong>Order #{reference}</strong><br/>Date: {date}</p>
<table width="100%">
{rows}
<tr><td>Shipping</td><td style="text-align:right">{shipping}</td></tr>
<tr><td><strong>Total</strong></td><td style="text-align:right"><strong>{due}</strong></td></tr>
</table>
<h3>Shipping address</h3>
<p>{address}</p>
</body>
</html>"#,
        name = escape_html(&instructions.client.name),
        due = instructions.amount_due(),
        reference = order.order_id.short_ref(),
        date = order.created_at.format("%d/%m/%Y"),
    )
}

fn escape_html(s: &str) -> String {
    s.chars().fold(String::with_capacity(s.len()), |mut out, c| {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
        out
    })
}
