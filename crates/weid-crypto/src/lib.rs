//! WeID Cryptographic Layer
//!
//! Key/signature provider for the WeID engine:
//! - Ed25519 key pair generation and signing
//! - BLAKE3 hashing
//! - Deterministic WeID derivation from a public key

pub mod error;
pub mod hashing;
pub mod keys;
pub mod signing;

pub use error::CryptoError;
pub use hashing::{derive_address, derive_weid, hash};
pub use keys::{KeyPair, PublicKey};
pub use signing::{sign, verify, Signature};
