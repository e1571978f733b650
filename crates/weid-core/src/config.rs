use serde::{Deserialize, Serialize};

/// Configuration for the WeID SDK.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdkConfig {
    /// Chain identifier embedded in every WeID URI.
    pub chain_id: String,
    /// Upper bound applied to registry page sizes.
    pub max_page_size: usize,
    /// Gateway round-trip timeout in milliseconds.
    pub gateway_timeout_ms: u64,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            chain_id: "1".into(),
            max_page_size: 1000,
            gateway_timeout_ms: 10_000,
            log_level: "info".into(),
        }
    }
}
