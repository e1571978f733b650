use weid_core::WeId;

use crate::keys::PublicKey;

/// BLAKE3 hash (32 bytes).
pub type Hash = [u8; 32];

/// Hash arbitrary data using BLAKE3.
pub fn hash(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// Derive the ledger address for a public key: BLAKE3 of the raw key
/// bytes, truncated to 20 bytes, lowercase hex with 0x prefix.
///
/// The same public key always derives the same address.
pub fn derive_address(pubkey: &PublicKey) -> String {
    let digest = hash(pubkey.as_bytes());
    format!("0x{}", hex::encode(&digest[..20]))
}

/// Derive the full WeID for a public key on the given chain.
pub fn derive_weid(chain_id: &str, pubkey: &PublicKey) -> WeId {
    WeId::from_parts(chain_id, &derive_address(pubkey))
}
