use std::collections::BTreeMap;

use flow_tools::{FlowSigner, SIGNATURE_PARAM};
use log::*;

/// Decides whether an inbound webhook call may be acted upon.
///
/// Calls that carry a signature are verified against the shared secret. Calls without one are accepted, since the
/// gateway's confirmation only carries the token, and the token is resolved with a signed lookup anyway.
#[derive(Clone)]
pub struct WebhookSignatureCheck {
    signer: Option<FlowSigner>,
}

impl WebhookSignatureCheck {
    pub fn new(signer: FlowSigner) -> Self {
        Self { signer: Some(signer) }
    }

    pub fn disabled() -> Self {
        Self { signer: None }
    }

    pub fn is_acceptable(&self, params: &BTreeMap<String, String>) -> bool {
        match (&self.signer, params.get(SIGNATURE_PARAM)) {
            (Some(signer), Some(signature)) => {
                let valid = signer.verify(params, signature);
                if !valid {
                    warn!("💻️ Webhook signature does not match the parameters");
                }
                valid
            },
            (None, Some(_)) => {
                trace!("💻️ Webhook signature checks are disabled");
                true
            },
            (_, None) => true,
        }
    }
}
