use std::sync::Arc;

use serde::{Deserialize, Serialize};

use weid_core::{ResponseData, SdkConfig, WeId};
use weid_crypto::PublicKey;
use weid_ledger::{Direction, EventCursor, LedgerGateway};

use crate::error::{to_response, IdentityError};
use crate::store;

/// Resume point for registry enumeration: a creation-log position plus
/// the page shape. Callers persist their own cursor between calls; the
/// engine holds nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryCursor {
    pub block_number: u64,
    pub index_in_block: u32,
    pub page_size: usize,
    pub direction: Direction,
}

impl RegistryCursor {
    /// Cursor at the start of the registry, walking forward.
    pub fn forward_start(page_size: usize) -> Self {
        Self {
            block_number: 0,
            index_in_block: 0,
            page_size,
            direction: Direction::Forward,
        }
    }

    /// Cursor at the tip of the registry, walking backward.
    pub fn backward_start(page_size: usize) -> Self {
        Self {
            block_number: u64::MAX,
            index_in_block: u32::MAX,
            page_size,
            direction: Direction::Backward,
        }
    }

    fn event_cursor(&self) -> EventCursor {
        EventCursor {
            block_number: self.block_number,
            index_in_block: self.index_in_block,
        }
    }
}

/// One creation-log record surfaced by enumeration: the identifier with
/// its anchor position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    pub weid: WeId,
    pub block_number: u64,
    pub index_in_block: u32,
}

/// A page of registry entries. `next_cursor` is `None` at the registry
/// boundary; otherwise it points at the first unreturned event, so
/// chaining pages in one direction never skips or duplicates an
/// identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeIdPage {
    pub entries: Vec<RegistryEntry>,
    pub next_cursor: Option<RegistryCursor>,
}

/// Read-side enumeration over the registry's creation-event log.
pub struct RegistryReader<G> {
    gateway: Arc<G>,
    config: SdkConfig,
}

impl<G: LedgerGateway> RegistryReader<G> {
    pub fn new(gateway: Arc<G>, config: SdkConfig) -> Self {
        Self { gateway, config }
    }

    /// Collect up to `page_size` identifiers starting at the cursor
    /// position (inclusive), in the cursor's direction. The page size is
    /// clamped to the configured maximum; zero is rejected.
    pub async fn get_weid_list(&self, cursor: RegistryCursor) -> ResponseData<WeIdPage> {
        to_response(self.get_weid_list_inner(cursor).await)
    }

    async fn get_weid_list_inner(
        &self,
        cursor: RegistryCursor,
    ) -> Result<WeIdPage, IdentityError> {
        if cursor.page_size == 0 {
            return Err(IdentityError::InvalidArgument(
                "page size must be positive".into(),
            ));
        }
        let page_size = cursor.page_size.min(self.config.max_page_size);

        // Fetch one extra event: it becomes the next cursor position.
        let events = self
            .gateway
            .creation_events(cursor.event_cursor(), cursor.direction, page_size + 1)
            .await?;

        let next_cursor = events.get(page_size).map(|overflow| RegistryCursor {
            block_number: overflow.block_number,
            index_in_block: overflow.index_in_block,
            page_size: cursor.page_size,
            direction: cursor.direction,
        });
        let entries = events
            .into_iter()
            .take(page_size)
            .map(|event| RegistryEntry {
                weid: event.weid,
                block_number: event.block_number,
                index_in_block: event.index_in_block,
            })
            .collect();

        Ok(WeIdPage {
            entries,
            next_cursor,
        })
    }

    /// Total number of anchored identifiers, independent of revocations.
    /// Equals the length of a full forward traversal.
    pub async fn get_weid_count(&self) -> ResponseData<u64> {
        let result = self
            .gateway
            .creation_count()
            .await
            .map_err(IdentityError::from);
        to_response(result)
    }

    /// For each hex public key, the identifiers whose document currently
    /// lists it as a non-revoked entry. Unmatched keys are simply absent
    /// from the result; a malformed key is an argument error.
    pub async fn get_weid_list_by_pubkey_list(
        &self,
        public_keys: &[String],
    ) -> ResponseData<Vec<WeId>> {
        to_response(self.lookup_by_public_keys(public_keys).await)
    }

    async fn lookup_by_public_keys(
        &self,
        public_keys: &[String],
    ) -> Result<Vec<WeId>, IdentityError> {
        let mut matched = Vec::new();
        for key_hex in public_keys {
            let material = PublicKey::from_hex(key_hex)?.to_hex();
            for candidate in self.gateway.weids_listing_key(&material).await? {
                if matched.contains(&candidate) {
                    continue;
                }
                let Some(record) = self.gateway.query_document(&candidate).await? else {
                    continue;
                };
                let document = store::assemble_document(&record)?;
                if document.has_live_key(&material) {
                    matched.push(candidate);
                }
            }
        }
        Ok(matched)
    }
}
