use std::sync::Arc;

use serde::{Deserialize, Serialize};

use weid_core::{ResponseData, SdkConfig, WeId};
use weid_crypto::{derive_weid, KeyPair, PublicKey};
use weid_ledger::{
    ContractCall, LedgerGateway, Receipt, RevertReason, TransactionAuth, TxStatus,
};

use crate::authorization::{AuthorizationResolver, SigningContext};
use crate::document::WeIdDocument;
use crate::error::{to_response, IdentityError};
use crate::store;

/// Arguments for anchoring an identifier from a caller-supplied key.
/// The key pair signs the anchoring transaction and must match
/// `public_key`.
pub struct CreateWeIdArgs {
    /// Hex-encoded Ed25519 public key the identifier derives from.
    pub public_key: String,
    pub key_pair: KeyPair,
}

/// Result of anchoring a freshly generated identifier.
pub struct CreateWeIdData {
    pub weid: WeId,
    pub key_pair: KeyPair,
}

/// Arguments for key addition and revocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyArgs {
    /// Hex-encoded Ed25519 public key material.
    pub public_key: String,
    /// Controller recorded on the entry; defaults to the subject.
    #[serde(default)]
    pub controller: Option<WeId>,
}

/// Arguments for service upserts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceArgs {
    pub service_type: String,
    pub endpoint: String,
}

/// Arguments for authentication mutations, referencing a key entry by
/// its material.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationArgs {
    pub public_key: String,
}

/// Identifier lifecycle service.
///
/// Stateless over an `Arc`-shared gateway handle: concurrent callers may
/// mutate distinct identifiers fully in parallel. Writers to the same
/// identifier are ordered by the ledger, not locally.
///
/// Every mutating operation is a single ledger transaction. When a call
/// fails with the retryable `LedgerUnavailable` code the transaction may
/// still land on-chain (at-least-once effect, uncertain acknowledgment);
/// retrying is safe because each operation's contract semantics are
/// idempotent.
pub struct WeIdService<G> {
    gateway: Arc<G>,
    resolver: AuthorizationResolver<G>,
    config: SdkConfig,
}

impl<G: LedgerGateway> WeIdService<G> {
    pub fn new(gateway: Arc<G>, config: SdkConfig) -> Self {
        let resolver = AuthorizationResolver::new(Arc::clone(&gateway), config.chain_id.clone());
        Self {
            gateway,
            resolver,
            config,
        }
    }

    /// Create a WeID with a freshly generated key pair and return both.
    ///
    /// Each call draws fresh entropy, so two calls always yield two
    /// distinct identifiers.
    pub async fn create_weid(&self) -> ResponseData<CreateWeIdData> {
        to_response(self.create_weid_inner().await)
    }

    async fn create_weid_inner(&self) -> Result<CreateWeIdData, IdentityError> {
        let key_pair = KeyPair::generate();
        let weid = derive_weid(&self.config.chain_id, &key_pair.public_key());
        let ctx = SigningContext::self_signed(TransactionAuth::new(key_pair.clone()));
        self.anchor(&weid, &key_pair.public_key().to_hex(), &ctx)
            .await?;
        Ok(CreateWeIdData { weid, key_pair })
    }

    /// Create a WeID from a caller-supplied public key, self-signed.
    ///
    /// Deterministic: the same key always derives the same identifier.
    /// Re-anchoring an existing identifier is an explicit
    /// `IdentifierAlreadyExists` conflict, never a silent success.
    pub async fn create_weid_from_key(&self, args: CreateWeIdArgs) -> ResponseData<WeId> {
        to_response(self.create_weid_from_key_inner(args).await)
    }

    async fn create_weid_from_key_inner(
        &self,
        args: CreateWeIdArgs,
    ) -> Result<WeId, IdentityError> {
        let public_key = parse_public_key(&args.public_key)?;
        if args.key_pair.public_key() != public_key {
            return Err(IdentityError::InvalidArgument(
                "private key does not match the provided public key".into(),
            ));
        }
        let weid = derive_weid(&self.config.chain_id, &public_key);
        let ctx = SigningContext::self_signed(TransactionAuth::new(args.key_pair));
        self.anchor(&weid, &public_key.to_hex(), &ctx).await?;
        Ok(weid)
    }

    /// Create a WeID from a public key, with the anchoring transaction
    /// signed by a committee delegate instead of the subject.
    pub async fn delegate_create_weid(
        &self,
        public_key: &str,
        delegate_auth: TransactionAuth,
    ) -> ResponseData<WeId> {
        to_response(
            self.delegate_create_weid_inner(public_key, delegate_auth)
                .await,
        )
    }

    async fn delegate_create_weid_inner(
        &self,
        public_key: &str,
        delegate_auth: TransactionAuth,
    ) -> Result<WeId, IdentityError> {
        let public_key = parse_public_key(public_key)?;
        let weid = derive_weid(&self.config.chain_id, &public_key);
        let ctx = SigningContext::delegated(delegate_auth);
        self.anchor(&weid, &public_key.to_hex(), &ctx).await?;
        Ok(weid)
    }

    async fn anchor(
        &self,
        weid: &WeId,
        public_key_hex: &str,
        ctx: &SigningContext,
    ) -> Result<(), IdentityError> {
        self.resolver.authorize_creation(weid, ctx).await?;
        if self.gateway.query_document(weid).await?.is_some() {
            return Err(IdentityError::AlreadyExists(weid.uri().to_string()));
        }
        let receipt = self
            .gateway
            .submit(
                ContractCall::CreateWeId {
                    weid: weid.clone(),
                    public_key: public_key_hex.to_string(),
                },
                ctx.auth(),
            )
            .await?;
        let receipt = confirm(receipt, weid)?;
        tracing::info!(weid = %weid, block_number = receipt.block_number, "weid anchored");
        Ok(())
    }

    /// Add a public key to the document, or un-revoke an existing entry
    /// with identical material. Returns the entry's id.
    pub async fn add_public_key(
        &self,
        weid: &WeId,
        args: &PublicKeyArgs,
        auth: TransactionAuth,
    ) -> ResponseData<u32> {
        to_response(
            self.add_public_key_with(weid, args, &SigningContext::self_signed(auth))
                .await,
        )
    }

    /// Delegate variant of [`add_public_key`](Self::add_public_key);
    /// requires committee privilege.
    pub async fn delegate_add_public_key(
        &self,
        weid: &WeId,
        args: &PublicKeyArgs,
        delegate_auth: TransactionAuth,
    ) -> ResponseData<u32> {
        to_response(
            self.add_public_key_with(weid, args, &SigningContext::delegated(delegate_auth))
                .await,
        )
    }

    async fn add_public_key_with(
        &self,
        weid: &WeId,
        args: &PublicKeyArgs,
        ctx: &SigningContext,
    ) -> Result<u32, IdentityError> {
        let public_key = parse_public_key(&args.public_key)?;
        let material = public_key.to_hex();
        let controller = args.controller.clone().unwrap_or_else(|| weid.clone());

        let document = self.fetch_document(weid).await?;
        self.resolver
            .authorize_mutation(weid, &document, ctx)
            .await?;

        // Append-vs-un-revoke is decided from a fresh read; the contract
        // re-evaluates the same rule atomically at apply time, so a
        // concurrently ordered write cannot duplicate the entry.
        if let Some(entry) = document.find_key(&material) {
            tracing::debug!(
                weid = %weid,
                key_id = entry.id,
                revoked = entry.revoked,
                "key material already listed, id will be reused"
            );
        }

        let call = ContractCall::AddPublicKey {
            weid: weid.clone(),
            public_key: material,
            controller,
        };
        let mut receipt = self.gateway.submit(call.clone(), ctx.auth()).await?;
        if receipt.status == TxStatus::Reverted(RevertReason::StaleState) {
            // A conflicting write was ordered first: re-read, resubmit once.
            self.fetch_document(weid).await?;
            receipt = self.gateway.submit(call, ctx.auth()).await?;
        }
        let receipt = confirm(receipt, weid)?;
        let key_id = receipt.key_id.ok_or_else(|| {
            IdentityError::Inconsistency("confirmed key addition carried no key id".into())
        })?;
        tracing::info!(weid = %weid, key_id, "public key set");
        Ok(key_id)
    }

    /// Revoke a key entry and every authentication referencing it, as one
    /// non-splittable transaction. Idempotent: revoking an already
    /// revoked key succeeds and changes nothing.
    pub async fn revoke_public_key_with_authentication(
        &self,
        weid: &WeId,
        args: &PublicKeyArgs,
        auth: TransactionAuth,
    ) -> ResponseData<bool> {
        to_response(
            self.revoke_public_key_with(weid, args, &SigningContext::self_signed(auth))
                .await,
        )
    }

    async fn revoke_public_key_with(
        &self,
        weid: &WeId,
        args: &PublicKeyArgs,
        ctx: &SigningContext,
    ) -> Result<bool, IdentityError> {
        let public_key = parse_public_key(&args.public_key)?;
        let document = self.fetch_document(weid).await?;
        self.resolver
            .authorize_mutation(weid, &document, ctx)
            .await?;
        let receipt = self
            .gateway
            .submit(
                ContractCall::RevokePublicKey {
                    weid: weid.clone(),
                    public_key: public_key.to_hex(),
                },
                ctx.auth(),
            )
            .await?;
        confirm(receipt, weid)?;
        tracing::info!(weid = %weid, "public key revoked with its authentication");
        Ok(true)
    }

    /// Upsert a service endpoint by type.
    pub async fn set_service(
        &self,
        weid: &WeId,
        args: &ServiceArgs,
        auth: TransactionAuth,
    ) -> ResponseData<bool> {
        to_response(
            self.set_service_with(weid, args, &SigningContext::self_signed(auth))
                .await,
        )
    }

    /// Delegate variant of [`set_service`](Self::set_service).
    pub async fn delegate_set_service(
        &self,
        weid: &WeId,
        args: &ServiceArgs,
        delegate_auth: TransactionAuth,
    ) -> ResponseData<bool> {
        to_response(
            self.set_service_with(weid, args, &SigningContext::delegated(delegate_auth))
                .await,
        )
    }

    async fn set_service_with(
        &self,
        weid: &WeId,
        args: &ServiceArgs,
        ctx: &SigningContext,
    ) -> Result<bool, IdentityError> {
        if args.service_type.trim().is_empty() {
            return Err(IdentityError::InvalidArgument(
                "service type must not be empty".into(),
            ));
        }
        if args.endpoint.trim().is_empty() {
            return Err(IdentityError::InvalidArgument(
                "service endpoint must not be empty".into(),
            ));
        }
        let document = self.fetch_document(weid).await?;
        self.resolver
            .authorize_mutation(weid, &document, ctx)
            .await?;
        let receipt = self
            .gateway
            .submit(
                ContractCall::SetService {
                    weid: weid.clone(),
                    service_type: args.service_type.clone(),
                    endpoint: args.endpoint.clone(),
                },
                ctx.auth(),
            )
            .await?;
        confirm(receipt, weid)?;
        tracing::info!(weid = %weid, service_type = %args.service_type, "service set");
        Ok(true)
    }

    /// Add or un-revoke an authentication bound to an existing,
    /// non-revoked key entry.
    pub async fn set_authentication(
        &self,
        weid: &WeId,
        args: &AuthenticationArgs,
        auth: TransactionAuth,
    ) -> ResponseData<bool> {
        to_response(
            self.set_authentication_with(weid, args, &SigningContext::self_signed(auth))
                .await,
        )
    }

    /// Delegate variant of [`set_authentication`](Self::set_authentication).
    pub async fn delegate_set_authentication(
        &self,
        weid: &WeId,
        args: &AuthenticationArgs,
        delegate_auth: TransactionAuth,
    ) -> ResponseData<bool> {
        to_response(
            self.set_authentication_with(weid, args, &SigningContext::delegated(delegate_auth))
                .await,
        )
    }

    async fn set_authentication_with(
        &self,
        weid: &WeId,
        args: &AuthenticationArgs,
        ctx: &SigningContext,
    ) -> Result<bool, IdentityError> {
        let public_key = parse_public_key(&args.public_key)?;
        let material = public_key.to_hex();
        let document = self.fetch_document(weid).await?;
        self.resolver
            .authorize_mutation(weid, &document, ctx)
            .await?;
        match document.find_key(&material) {
            None => {
                return Err(IdentityError::DanglingReference(
                    "authentication references a public key not listed in the document".into(),
                ))
            }
            Some(entry) if entry.revoked => {
                return Err(IdentityError::InvalidArgument(
                    "authentication references a revoked public key".into(),
                ))
            }
            Some(_) => {}
        }
        let receipt = self
            .gateway
            .submit(
                ContractCall::SetAuthentication {
                    weid: weid.clone(),
                    public_key: material,
                },
                ctx.auth(),
            )
            .await?;
        // The pre-check can be invalidated by a concurrently ordered
        // revocation; the contract's verdict wins.
        if let TxStatus::Reverted(RevertReason::KeyNotFound) = receipt.status {
            return Err(IdentityError::DanglingReference(
                "authentication references a public key not listed in the document".into(),
            ));
        }
        confirm(receipt, weid)?;
        tracing::info!(weid = %weid, "authentication set");
        Ok(true)
    }

    /// Revoke an authentication only; the backing key entry is untouched.
    pub async fn revoke_authentication(
        &self,
        weid: &WeId,
        args: &AuthenticationArgs,
        auth: TransactionAuth,
    ) -> ResponseData<bool> {
        to_response(
            self.revoke_authentication_with(weid, args, &SigningContext::self_signed(auth))
                .await,
        )
    }

    async fn revoke_authentication_with(
        &self,
        weid: &WeId,
        args: &AuthenticationArgs,
        ctx: &SigningContext,
    ) -> Result<bool, IdentityError> {
        let public_key = parse_public_key(&args.public_key)?;
        let document = self.fetch_document(weid).await?;
        self.resolver
            .authorize_mutation(weid, &document, ctx)
            .await?;
        let receipt = self
            .gateway
            .submit(
                ContractCall::RevokeAuthentication {
                    weid: weid.clone(),
                    public_key: public_key.to_hex(),
                },
                ctx.auth(),
            )
            .await?;
        confirm(receipt, weid)?;
        tracing::info!(weid = %weid, "authentication revoked");
        Ok(true)
    }

    /// Whether a creation record is anchored for the identifier,
    /// regardless of subsequent revocations.
    pub async fn is_weid_exist(&self, weid: &WeId) -> ResponseData<bool> {
        let result = self
            .gateway
            .query_document(weid)
            .await
            .map(|record| record.is_some())
            .map_err(IdentityError::from);
        to_response(result)
    }

    /// Assemble the full (audit) document for an identifier.
    pub async fn get_weid_document(&self, weid: &WeId) -> ResponseData<WeIdDocument> {
        to_response(self.fetch_document(weid).await)
    }

    /// Canonical JSON form of the document, for external DID resolvers.
    pub async fn get_weid_document_json(&self, weid: &WeId) -> ResponseData<String> {
        to_response(
            self.fetch_document(weid)
                .await
                .and_then(|document| document.to_json()),
        )
    }

    async fn fetch_document(&self, weid: &WeId) -> Result<WeIdDocument, IdentityError> {
        let record = self
            .gateway
            .query_document(weid)
            .await?
            .ok_or_else(|| IdentityError::NotFound(weid.uri().to_string()))?;
        store::assemble_document(&record)
    }
}

fn parse_public_key(hex: &str) -> Result<PublicKey, IdentityError> {
    Ok(PublicKey::from_hex(hex)?)
}

fn confirm(receipt: Receipt, weid: &WeId) -> Result<Receipt, IdentityError> {
    match receipt.status {
        TxStatus::Confirmed => Ok(receipt),
        TxStatus::Reverted(reason) => Err(revert_error(reason, weid)),
    }
}

fn revert_error(reason: RevertReason, weid: &WeId) -> IdentityError {
    match reason {
        RevertReason::AlreadyExists => IdentityError::AlreadyExists(weid.uri().to_string()),
        RevertReason::IdentifierNotFound => IdentityError::NotFound(weid.uri().to_string()),
        RevertReason::KeyNotFound => {
            IdentityError::InvalidArgument("no matching public key entry".into())
        }
        RevertReason::KeyRevoked => {
            IdentityError::InvalidArgument("public key entry is revoked".into())
        }
        RevertReason::AuthenticationNotFound => {
            IdentityError::InvalidArgument("no authentication recorded for that key".into())
        }
        RevertReason::StaleState => {
            IdentityError::TransactionFailed("stale state, re-read before retrying".into())
        }
    }
}
