use flow_tools::{FlowApi, FlowApiError, FlowConfig, FlowSigner, NewPaymentRequest, PaymentCreated};
use log::*;
use settlement_engine::{GatewayError, GatewayPayment, PaymentStatusLookup};

/// Plugs the Flow client into the settlement engine.
#[derive(Clone)]
pub struct FlowGateway {
    api: FlowApi,
}

impl FlowGateway {
    pub fn new(config: FlowConfig) -> Result<Self, FlowApiError> {
        let api = FlowApi::new(config)?;
        Ok(Self { api })
    }

    pub fn signer(&self) -> &FlowSigner {
        self.api.signer()
    }

    pub async fn create_payment(&self, request: NewPaymentRequest) -> Result<PaymentCreated, FlowApiError> {
        self.api.create_payment(request).await
    }
}

impl PaymentStatusLookup for FlowGateway {
    async fn payment_status(&self, token: &str) -> Result<GatewayPayment, GatewayError> {
        let status = self.api.payment_status(token).await.map_err(to_gateway_error)?;
        let amount = status.amount_in_pesos().map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        trace!("🌊️ Payment {} for order {} is {}", status.flow_order, status.commerce_order, status.status);
        Ok(GatewayPayment {
            order_id: status.commerce_order.into(),
            status: status.status,
            amount,
            payer: status.payer,
            payment_data: status.payment_data,
        })
    }
}

fn to_gateway_error(e: FlowApiError) -> GatewayError {
    match e {
        FlowApiError::Initialization(msg) | FlowApiError::RequestError(msg) => GatewayError::Unreachable(msg),
        FlowApiError::QueryError { status, message } => GatewayError::Rejected { status, message },
        FlowApiError::InvalidParameter(msg) => GatewayError::Rejected { status: 400, message: msg },
        FlowApiError::JsonError(msg) => GatewayError::InvalidResponse(msg),
    }
}
