use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use settlement_engine::{
    db_types::{Clp, OrderId},
    GatewayPayment,
};
use shop_common::PaymentStatusCode;

/// The body of a buyer's verification request, sent by the checkout result page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub token: Option<String>,
}

/// The gateway's view of the payment, as reported back to the buyer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub status: PaymentStatusCode,
    pub commerce_order: OrderId,
    pub amount: Clp,
}

impl From<&GatewayPayment> for VerifyResponse {
    fn from(payment: &GatewayPayment) -> Self {
        Self { status: payment.status, commerce_order: payment.order_id.clone(), amount: payment.amount }
    }
}

/// The body of a request for bank transfer instructions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferRequest {
    #[serde(default)]
    pub shipping: Option<Clp>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentParams {
    pub order_id: String,
    pub subject: String,
    /// The amount in pesos. Fractions are rounded to the nearest peso.
    pub amount: f64,
    pub email: String,
    #[serde(default)]
    pub customer_data: Option<BTreeMap<String, Value>>,
}

impl CreatePaymentParams {
    /// The gateway only accepts flat string metadata, so nested values are sent as JSON text.
    pub fn metadata(&self) -> Option<BTreeMap<String, String>> {
        self.customer_data.as_ref().map(|data| {
            data.iter()
                .map(|(k, v)| {
                    let v = match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (k.clone(), v)
                })
                .collect()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePaymentResponse {
    pub url: String,
    pub token: String,
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn verify_response_mirrors_the_payment() {
        let payment = GatewayPayment::new("order-1001", PaymentStatusCode::Paid, Clp::from(120_000));
        let response = VerifyResponse::from(&payment);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json, json!({ "status": 2, "commerceOrder": "order-1001", "amount": 120000 }));
    }

    #[test]
    fn customer_data_is_flattened() {
        let params: CreatePaymentParams = serde_json::from_value(json!({
            "orderId": "order-1001",
            "subject": "Pedido",
            "amount": 120000.4,
            "email": "ana@example.com",
            "customerData": { "name": "Ana", "items": 2 }
        }))
        .unwrap();
        let metadata = params.metadata().unwrap();
        assert_eq!(metadata["name"], "Ana");
        assert_eq!(metadata["items"], "2");
    }
}
