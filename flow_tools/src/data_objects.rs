use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shop_common::{Clp, ClpConversionError, PaymentStatusCode, CLP_CURRENCY_CODE};

use crate::FlowApiError;

/// The parameters for a new payment order on the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPaymentRequest {
    /// Our order id. The gateway hands it back as `commerceOrder` in status lookups.
    pub commerce_order: String,
    pub subject: String,
    pub amount: Clp,
    /// The payer's email address.
    pub email: String,
    /// Where the gateway posts the server-to-server confirmation.
    pub url_confirmation: String,
    /// Where the buyer's browser is sent after paying.
    pub url_return: String,
    /// Free-form metadata, sent to the gateway as a JSON string.
    pub optional: Option<BTreeMap<String, String>>,
}

impl NewPaymentRequest {
    /// The unsigned form parameters for `/payment/create`.
    pub fn to_params(&self, api_key: &str) -> Result<BTreeMap<String, String>, FlowApiError> {
        if self.commerce_order.trim().is_empty() {
            return Err(FlowApiError::InvalidParameter("The commerce order id cannot be empty".into()));
        }
        if self.amount.value() <= 0 {
            return Err(FlowApiError::InvalidParameter(format!("Payment amount must be positive, not {}", self.amount)));
        }
        let mut params = BTreeMap::new();
        params.insert("apiKey".to_string(), api_key.to_string());
        params.insert("commerceOrder".to_string(), self.commerce_order.clone());
        params.insert("subject".to_string(), self.subject.clone());
        params.insert("currency".to_string(), CLP_CURRENCY_CODE.to_string());
        params.insert("amount".to_string(), self.amount.value().to_string());
        params.insert("email".to_string(), self.email.clone());
        params.insert("urlConfirmation".to_string(), self.url_confirmation.clone());
        params.insert("urlReturn".to_string(), self.url_return.clone());
        if let Some(optional) = &self.optional {
            let json = serde_json::to_string(optional).map_err(|e| FlowApiError::JsonError(e.to_string()))?;
            params.insert("optional".to_string(), json);
        }
        Ok(params)
    }
}

/// The raw response from `/payment/create`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatePaymentResponse {
    pub url: String,
    pub token: String,
    pub flow_order: i64,
}

/// A payment order that was accepted by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCreated {
    /// The URL the buyer must be redirected to, with the token already appended.
    pub url: String,
    pub token: String,
    pub flow_order: i64,
}

impl From<CreatePaymentResponse> for PaymentCreated {
    fn from(value: CreatePaymentResponse) -> Self {
        let url = format!("{}?token={}", value.url, value.token);
        Self { url, token: value.token, flow_order: value.flow_order }
    }
}

/// The gateway's view of a payment, as returned by `/payment/getStatus`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatus {
    pub flow_order: i64,
    pub commerce_order: String,
    pub status: PaymentStatusCode,
    pub amount: f64,
    #[serde(default)]
    pub payer: Option<String>,
    #[serde(default)]
    pub payment_data: Option<Value>,
}

impl PaymentStatus {
    pub fn amount_in_pesos(&self) -> Result<Clp, ClpConversionError> {
        Clp::from_gateway_amount(self.amount)
    }
}
