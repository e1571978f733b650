//! WeID Identity Engine
//!
//! Document lifecycle and delegated authorization for ledger-anchored
//! WeIDs:
//! - Identifier creation (fresh key, caller key, or committee delegate)
//! - Key / authentication / service mutation with revoke and un-revoke
//! - Document assembly with explicit full (audit) and effective views
//! - Self-vs-delegate authorization resolution
//! - Block-height-indexed registry pagination

pub mod authorization;
pub mod document;
pub mod error;
pub mod lifecycle;
pub mod registry;
pub mod store;

pub use authorization::{AuthorizationResolver, SigningContext, SigningMode};
pub use document::{
    AuthenticationEntry, EffectiveDocument, PublicKeyEntry, ServiceEntry, WeIdDocument,
};
pub use error::{to_response, IdentityError};
pub use lifecycle::{
    AuthenticationArgs, CreateWeIdArgs, CreateWeIdData, PublicKeyArgs, ServiceArgs, WeIdService,
};
pub use registry::{RegistryCursor, RegistryEntry, RegistryReader, WeIdPage};
