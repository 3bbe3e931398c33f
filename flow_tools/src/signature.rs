//! Request signing for the gateway.
//!
//! The gateway authenticates every call with a parameter named `s`: the hex-encoded HMAC-SHA256 of all the other
//! parameters, sorted by name and concatenated as `name + value` with no separators. The same scheme is used when the
//! gateway calls us back, so [`FlowSigner::verify`] checks inbound parameters.
use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use shop_common::Secret;

use crate::FlowApiError;

type HmacSha256 = Hmac<Sha256>;

/// The name of the signature parameter. It is never part of the signed payload.
pub const SIGNATURE_PARAM: &str = "s";

#[derive(Clone)]
pub struct FlowSigner {
    mac: HmacSha256,
}

impl FlowSigner {
    pub fn new(secret: &Secret<String>) -> Result<Self, FlowApiError> {
        let mac = HmacSha256::new_from_slice(secret.reveal().as_bytes())
            .map_err(|e| FlowApiError::Initialization(format!("Invalid signing key. {e}")))?;
        Ok(Self { mac })
    }

    /// Signs the parameters. A `BTreeMap` iterates in key order, which is the order the gateway expects.
    pub fn sign(&self, params: &BTreeMap<String, String>) -> String {
        let mac = self.keyed_digest(params);
        hex::encode(mac.finalize().into_bytes())
    }

    /// Checks `signature` against the parameters in constant time. Malformed hex is simply not a valid signature.
    pub fn verify(&self, params: &BTreeMap<String, String>, signature: &str) -> bool {
        let Ok(expected) = hex::decode(signature.trim()) else {
            return false;
        };
        self.keyed_digest(params).verify_slice(&expected).is_ok()
    }

    fn keyed_digest(&self, params: &BTreeMap<String, String>) -> HmacSha256 {
        let mut mac = self.mac.clone();
        params.iter().filter(|(k, _)| k.as_str() != SIGNATURE_PARAM).for_each(|(k, v)| {
            mac.update(k.as_bytes());
            mac.update(v.as_bytes());
        });
        mac
    }
}
