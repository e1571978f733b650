//! WeID Protocol Core
//!
//! Shared building blocks for the WeID identifier engine:
//! - The `WeId` decentralized identifier type
//! - The response envelope (`ResponseData` + `ErrorCode`) used at every
//!   service boundary
//! - SDK configuration

pub mod config;
pub mod error;
pub mod response;
pub mod types;

pub use config::SdkConfig;
pub use error::CoreError;
pub use response::{ErrorCode, ResponseData};
pub use types::WeId;
