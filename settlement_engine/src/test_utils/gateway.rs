use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
};

use crate::traits::{GatewayError, GatewayPayment, PaymentStatusLookup};

/// A payment gateway that answers from a script. Unknown tokens are rejected the way the real gateway rejects them.
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    responses: Arc<Mutex<HashMap<String, Result<GatewayPayment, GatewayError>>>>,
    lookups: Arc<AtomicUsize>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payment(self, token: &str, payment: GatewayPayment) -> Self {
        self.set_response(token, Ok(payment));
        self
    }

    pub fn with_failure(self, token: &str, error: GatewayError) -> Self {
        self.set_response(token, Err(error));
        self
    }

    pub fn set_response(&self, token: &str, response: Result<GatewayPayment, GatewayError>) {
        self.responses.lock().expect("gateway script lock poisoned").insert(token.to_string(), response);
    }

    /// The number of status lookups made so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl PaymentStatusLookup for ScriptedGateway {
    async fn payment_status(&self, token: &str) -> Result<GatewayPayment, GatewayError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let responses = self.responses.lock().expect("gateway script lock poisoned");
        responses.get(token).cloned().unwrap_or_else(|| {
            Err(GatewayError::Rejected { status: 400, message: format!("Token {token} is not valid") })
        })
    }
}
