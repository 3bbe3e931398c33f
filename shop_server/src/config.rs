use std::env;

use flow_tools::FlowConfig;
use log::*;
use settlement_engine::db_types::{Clp, SegmentRules};
use shop_common::{parse_boolean_flag, Secret};

const DEFAULT_SHOP_HOST: &str = "127.0.0.1";
const DEFAULT_SHOP_PORT: u16 = 3001;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/shop.db";
const DEFAULT_PUBLIC_URL: &str = "http://localhost:3001";
const DEFAULT_EMAIL_FROM: &str = "Rapunzzel <onboarding@resend.dev>";
const DEFAULT_WHATSAPP_FROM: &str = "whatsapp:+14155238886";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The externally visible base URL of this server. The gateway callback and the buyer's return URL are built on
    /// top of it.
    pub public_url: String,
    pub segment_rules: SegmentRules,
    /// If true, a webhook call that carries a signature is rejected when the signature does not match.
    pub verify_webhook_signatures: bool,
    pub flow: FlowConfig,
    pub email: EmailConfig,
    pub whatsapp: WhatsAppConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SHOP_HOST.to_string(),
            port: DEFAULT_SHOP_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            segment_rules: SegmentRules::default(),
            verify_webhook_signatures: true,
            flow: FlowConfig::default(),
            email: EmailConfig::default(),
            whatsapp: WhatsAppConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SHOP_HOST").ok().unwrap_or_else(|| DEFAULT_SHOP_HOST.into());
        let port = env::var("SHOP_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SHOP_PORT. {e} Using the default, {DEFAULT_SHOP_PORT}, instead."
                    );
                    DEFAULT_SHOP_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SHOP_PORT);
        let database_url = env::var("SHOP_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ SHOP_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let public_url = env::var("SHOP_PUBLIC_URL")
            .ok()
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                warn!("🪛️ SHOP_PUBLIC_URL is not set. Payment callbacks will point at {DEFAULT_PUBLIC_URL}.");
                DEFAULT_PUBLIC_URL.to_string()
            });
        let segment_rules = segment_rules_from_env();
        let verify_webhook_signatures = parse_boolean_flag(env::var("SHOP_VERIFY_WEBHOOK_SIGNATURES").ok(), true);
        if !verify_webhook_signatures {
            warn!("🚨️ Webhook signature checks are disabled. Do not run like this in production.");
        }
        Self {
            host,
            port,
            database_url,
            public_url,
            segment_rules,
            verify_webhook_signatures,
            flow: FlowConfig::new_from_env_or_default(),
            email: EmailConfig::from_env_or_default(),
            whatsapp: WhatsAppConfig::from_env_or_default(),
        }
    }

    /// Where the gateway posts its server-to-server payment confirmation.
    pub fn confirmation_url(&self) -> String {
        format!("{}/api/flow/confirmation", self.public_url)
    }

    /// Where the buyer's browser lands after paying.
    pub fn return_url(&self) -> String {
        format!("{}/tienda/checkout/resultado", self.public_url)
    }
}

fn segment_rules_from_env() -> SegmentRules {
    let defaults = SegmentRules::default();
    let high_ticket_threshold = env::var("SHOP_HIGH_TICKET_THRESHOLD")
        .ok()
        .and_then(|s| {
            s.parse::<i64>()
                .map_err(|e| {
                    error!("🪛️ {s} is not a valid amount for SHOP_HIGH_TICKET_THRESHOLD. {e} Using the default.")
                })
                .ok()
        })
        .map(Clp::from)
        .unwrap_or(defaults.high_ticket_threshold);
    let frequent_order_count = env::var("SHOP_FREQUENT_ORDER_COUNT")
        .ok()
        .and_then(|s| match s.parse::<i64>() {
            Ok(n) if n > 0 => Some(n),
            Ok(n) => {
                error!("🪛️ SHOP_FREQUENT_ORDER_COUNT must be positive, not {n}. Using the default.");
                None
            },
            Err(e) => {
                error!("🪛️ {s} is not a valid count for SHOP_FREQUENT_ORDER_COUNT. {e} Using the default.");
                None
            },
        })
        .unwrap_or(defaults.frequent_order_count);
    SegmentRules { high_ticket_threshold, frequent_order_count }
}

/// Credentials for the transactional email provider.
#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub api_key: Secret<String>,
    /// The sender, e.g. `Shop <orders@example.com>`
    pub from: String,
    /// The shop's bank account, printed in transfer instructions. Use `\n` to separate lines.
    pub transfer_details: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self { api_key: Secret::default(), from: DEFAULT_EMAIL_FROM.to_string(), transfer_details: String::default() }
    }
}

impl EmailConfig {
    pub fn from_env_or_default() -> Self {
        let api_key = env::var("SHOP_RESEND_API_KEY").ok().unwrap_or_else(|| {
            warn!("🪛️ SHOP_RESEND_API_KEY is not set. Order confirmation emails will not be sent.");
            String::default()
        });
        let from = env::var("SHOP_EMAIL_FROM").ok().unwrap_or_else(|| DEFAULT_EMAIL_FROM.to_string());
        let transfer_details = env::var("SHOP_TRANSFER_DETAILS").ok().unwrap_or_default().replace("\\n", "\n");
        if transfer_details.trim().is_empty() {
            warn!("🪛️ SHOP_TRANSFER_DETAILS is not set. Transfer instructions will not include the bank account.");
        }
        Self { api_key: Secret::new(api_key), from, transfer_details }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_set()
    }
}

/// Credentials for sending WhatsApp messages through Twilio.
#[derive(Clone, Debug)]
pub struct WhatsAppConfig {
    pub account_sid: String,
    pub auth_token: Secret<String>,
    /// The sending number, in `whatsapp:+<number>` form.
    pub from: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self { account_sid: String::default(), auth_token: Secret::default(), from: DEFAULT_WHATSAPP_FROM.to_string() }
    }
}

impl WhatsAppConfig {
    pub fn from_env_or_default() -> Self {
        let account_sid = env::var("SHOP_TWILIO_ACCOUNT_SID").ok().unwrap_or_default();
        let auth_token = Secret::new(env::var("SHOP_TWILIO_AUTH_TOKEN").ok().unwrap_or_default());
        let from = env::var("SHOP_TWILIO_WHATSAPP_FROM").ok().unwrap_or_else(|| DEFAULT_WHATSAPP_FROM.to_string());
        let config = Self { account_sid, auth_token, from };
        if !config.is_configured() {
            warn!("🪛️ Twilio credentials are not configured. WhatsApp messages will not be sent.");
        }
        config
    }

    pub fn is_configured(&self) -> bool {
        !self.account_sid.trim().is_empty() && self.auth_token.is_set()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn callback_urls_use_the_public_url() {
        let config = ServerConfig { public_url: "https://rapunzzel.cl".into(), ..Default::default() };
        assert_eq!(config.confirmation_url(), "https://rapunzzel.cl/api/flow/confirmation");
        assert_eq!(config.return_url(), "https://rapunzzel.cl/tienda/checkout/resultado");
    }

    #[test]
    fn defaults() {
        let config = ServerConfig::new("0.0.0.0", 8080);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.public_url, DEFAULT_PUBLIC_URL);
        assert_eq!(config.segment_rules.high_ticket_threshold, Clp::from(100_000));
        assert_eq!(config.segment_rules.frequent_order_count, 3);
        assert!(config.verify_webhook_signatures);
        assert!(!config.email.is_configured());
        assert!(!config.whatsapp.is_configured());
    }
}
