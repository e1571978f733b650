use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Decentralized identifier anchored on the WeID ledger.
/// Format: `did:weid:<chain-id>:0x<40-hex-address>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeId(pub String);

impl WeId {
    /// Create a new WeId from a full DID URI string.
    pub fn new(uri: String) -> Result<Self, CoreError> {
        if !uri.starts_with("did:weid:") {
            return Err(CoreError::InvalidWeId(format!(
                "WeID must start with 'did:weid:', got: {}",
                uri
            )));
        }
        let parts: Vec<&str> = uri.split(':').collect();
        if parts.len() != 4 {
            return Err(CoreError::InvalidWeId(format!(
                "WeID must have format 'did:weid:<chain-id>:<address>', got: {}",
                uri
            )));
        }
        if !is_valid_address(parts[3]) {
            return Err(CoreError::InvalidWeId(format!(
                "WeID address must be 0x-prefixed 40-char hex, got: {}",
                parts[3]
            )));
        }
        Ok(Self(uri))
    }

    /// Create a WeId from chain-id and address components.
    pub fn from_parts(chain_id: &str, address: &str) -> Self {
        Self(format!("did:weid:{}:{}", chain_id, address))
    }

    /// Get the full DID URI.
    pub fn uri(&self) -> &str {
        &self.0
    }

    /// Extract the chain-id segment.
    pub fn chain_id(&self) -> Option<&str> {
        self.0.split(':').nth(2)
    }

    /// Extract the ledger address segment.
    pub fn address(&self) -> Option<&str> {
        self.0.split(':').nth(3)
    }
}

impl fmt::Display for WeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn is_valid_address(s: &str) -> bool {
    match s.strip_prefix("0x") {
        Some(hex_part) => {
            hex_part.len() == 40 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}
