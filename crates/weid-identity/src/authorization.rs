use std::sync::Arc;

use weid_core::WeId;
use weid_crypto::derive_weid;
use weid_ledger::{LedgerGateway, TransactionAuth};

use crate::document::WeIdDocument;
use crate::error::IdentityError;

/// Whether a signer acts for itself or as a privileged delegate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningMode {
    SelfSigned,
    Delegated,
}

/// A transaction authority plus the path it claims authorization under.
pub struct SigningContext {
    auth: TransactionAuth,
    mode: SigningMode,
}

impl SigningContext {
    /// Signer acting for its own identifier.
    pub fn self_signed(auth: TransactionAuth) -> Self {
        Self {
            auth,
            mode: SigningMode::SelfSigned,
        }
    }

    /// Signer acting under committee privilege on behalf of a subject.
    pub fn delegated(auth: TransactionAuth) -> Self {
        Self {
            auth,
            mode: SigningMode::Delegated,
        }
    }

    /// The underlying transaction authority.
    pub fn auth(&self) -> &TransactionAuth {
        &self.auth
    }

    /// The claimed authorization path.
    pub fn mode(&self) -> SigningMode {
        self.mode
    }

    /// Hex public key of the signer.
    pub fn public_key_hex(&self) -> String {
        self.auth.public_key_hex()
    }
}

/// Decides whether a signing context may create or mutate a subject's
/// document.
///
/// Authorization failures are final: they are resolved locally against
/// current state and are never retried.
pub struct AuthorizationResolver<G> {
    gateway: Arc<G>,
    chain_id: String,
}

impl<G: LedgerGateway> AuthorizationResolver<G> {
    pub fn new(gateway: Arc<G>, chain_id: impl Into<String>) -> Self {
        Self {
            gateway,
            chain_id: chain_id.into(),
        }
    }

    /// Authorize anchoring a new identifier.
    ///
    /// Self path: the signer's key must derive the subject itself.
    /// Delegate path: the signer must hold committee privilege.
    pub async fn authorize_creation(
        &self,
        subject: &WeId,
        ctx: &SigningContext,
    ) -> Result<(), IdentityError> {
        match ctx.mode() {
            SigningMode::SelfSigned => {
                let derived = derive_weid(&self.chain_id, &ctx.auth().public_key());
                if &derived == subject {
                    Ok(())
                } else {
                    self.deny(subject, ctx, "signer key does not derive the subject")
                }
            }
            SigningMode::Delegated => self.check_committee(subject, ctx).await,
        }
    }

    /// Authorize a mutation of an existing document.
    ///
    /// Self path: the signer derives the subject, or its key is listed as
    /// a non-revoked entry on the subject's document. Delegate path:
    /// committee privilege, independent of any relation to the subject.
    pub async fn authorize_mutation(
        &self,
        subject: &WeId,
        document: &WeIdDocument,
        ctx: &SigningContext,
    ) -> Result<(), IdentityError> {
        match ctx.mode() {
            SigningMode::SelfSigned => {
                let derived = derive_weid(&self.chain_id, &ctx.auth().public_key());
                if &derived == subject || document.has_live_key(&ctx.public_key_hex()) {
                    Ok(())
                } else {
                    self.deny(subject, ctx, "signer is neither subject nor a listed key")
                }
            }
            SigningMode::Delegated => self.check_committee(subject, ctx).await,
        }
    }

    async fn check_committee(
        &self,
        subject: &WeId,
        ctx: &SigningContext,
    ) -> Result<(), IdentityError> {
        if self
            .gateway
            .is_committee_member(&ctx.public_key_hex())
            .await?
        {
            Ok(())
        } else {
            self.deny(subject, ctx, "signer lacks committee privilege")
        }
    }

    fn deny(
        &self,
        subject: &WeId,
        ctx: &SigningContext,
        reason: &str,
    ) -> Result<(), IdentityError> {
        tracing::warn!(subject = %subject, mode = ?ctx.mode(), reason, "authorization denied");
        Err(IdentityError::Unauthorized(reason.to_string()))
    }
}
