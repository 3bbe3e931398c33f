use std::{collections::BTreeMap, sync::Arc};

use log::*;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    config::FlowConfig,
    data_objects::{CreatePaymentResponse, NewPaymentRequest, PaymentCreated, PaymentStatus},
    signature::SIGNATURE_PARAM,
    FlowApiError,
    FlowSigner,
};

#[derive(Clone)]
pub struct FlowApi {
    config: FlowConfig,
    signer: FlowSigner,
    client: Arc<Client>,
}

impl FlowApi {
    pub fn new(config: FlowConfig) -> Result<Self, FlowApiError> {
        let signer = FlowSigner::new(&config.secret_key)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FlowApiError::Initialization(e.to_string()))?;
        Ok(Self { config, signer, client: Arc::new(client) })
    }

    pub fn signer(&self) -> &FlowSigner {
        &self.signer
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    /// Signs `params` and posts them form-encoded to `path`.
    pub async fn signed_post<T: DeserializeOwned>(
        &self,
        path: &str,
        mut params: BTreeMap<String, String>,
    ) -> Result<T, FlowApiError> {
        let signature = self.signer.sign(&params);
        params.insert(SIGNATURE_PARAM.to_string(), signature);
        let url = self.url(path);
        trace!("🌊️ Sending signed request to {url}");
        let response =
            self.client.post(url).form(&params).send().await.map_err(|e| FlowApiError::RequestError(e.to_string()))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| FlowApiError::RequestError(e.to_string()))?;
        if status.is_success() {
            trace!("🌊️ Request successful. {status}");
            serde_json::from_str::<T>(&body).map_err(|e| FlowApiError::JsonError(e.to_string()))
        } else {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v["message"].as_str().map(String::from))
                .unwrap_or(body);
            Err(FlowApiError::QueryError { status: status.as_u16(), message })
        }
    }

    pub async fn create_payment(&self, request: NewPaymentRequest) -> Result<PaymentCreated, FlowApiError> {
        let params = request.to_params(&self.config.api_key)?;
        debug!("🌊️ Creating payment for order {} ({})", request.commerce_order, request.amount);
        let result = self.signed_post::<CreatePaymentResponse>("/payment/create", params).await?;
        info!("🌊️ Payment {} created for order {}", result.flow_order, request.commerce_order);
        Ok(result.into())
    }

    pub async fn payment_status(&self, token: &str) -> Result<PaymentStatus, FlowApiError> {
        if token.trim().is_empty() {
            return Err(FlowApiError::InvalidParameter("Payment token cannot be empty".into()));
        }
        let mut params = BTreeMap::new();
        params.insert("apiKey".to_string(), self.config.api_key.clone());
        params.insert("token".to_string(), token.to_string());
        debug!("🌊️ Fetching payment status");
        let result = self.signed_post::<PaymentStatus>("/payment/getStatus", params).await?;
        debug!("🌊️ Order {} has payment status {}", result.commerce_order, result.status);
        Ok(result)
    }
}
