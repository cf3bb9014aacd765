//! Share-code registry and access-grant protocol.
//!
//! Ties the stateless code generator to the store so that a code, once
//! assigned, can never be handed to a second account, and implements the
//! two-sided exchange: the owner hands out a code, the redeemer presents
//! it, and both accounts end up with matching bookkeeping from a single
//! one-sided call.

use log::{info, warn};
use std::sync::Arc;
use thiserror::Error;

use crate::codes::CodeGenerator;
use crate::models::{AccessLevel, User};
use crate::store::{Store, StoreError};

/// Hard ceiling on candidate codes tried before giving up, independent
/// of wall-clock time.
pub const MAX_CODE_ATTEMPTS: usize = 100;

#[derive(Debug, Error)]
pub enum SharingError {
    #[error("share code {0} does not match any account")]
    CodeNotFound(String),
    #[error("no unique share code found after {0} attempts")]
    CodeSpaceExhausted(usize),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type SharingResult<T> = Result<T, SharingError>;

pub struct ShareService {
    store: Arc<Store>,
    codes: Arc<CodeGenerator>,
}

impl ShareService {
    pub fn new(store: Arc<Store>, codes: Arc<CodeGenerator>) -> Self {
        Self { store, codes }
    }

    /// Return the account's share code, assigning one first if it has
    /// none. Idempotent: an account keeps its first code forever.
    ///
    /// The store's unique index on the code column is the serialization
    /// point. A conflict means another account holds the candidate, so
    /// we retry with a fresh one, up to [`MAX_CODE_ATTEMPTS`].
    pub fn ensure_share_code(&self, user_id: &str) -> SharingResult<String> {
        let user = self.store.get_user(user_id)?;
        if let Some(code) = user.share_code {
            return Ok(code);
        }

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let candidate = self.codes.generate();
            match self.store.assign_share_code(user_id, &candidate) {
                Ok(true) => {
                    info!(
                        "assigned share code to user {} on attempt {}",
                        user_id, attempt
                    );
                    return Ok(candidate);
                }
                Ok(false) => {
                    // Lost a race against another writer assigning this
                    // same account's code; the winner's code stands.
                    if let Some(code) = self.store.get_user(user_id)?.share_code {
                        return Ok(code);
                    }
                }
                Err(StoreError::Conflict(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        warn!(
            "share-code space exhausted for user {} after {} attempts",
            user_id, MAX_CODE_ATTEMPTS
        );
        Err(SharingError::CodeSpaceExhausted(MAX_CODE_ATTEMPTS))
    }

    /// Record a one-directional grant from owner to grantee, assigning
    /// the owner a code first if needed. Appending is idempotent per
    /// grantee; the owner's code is returned either way.
    pub fn grant_access(
        &self,
        owner_id: &str,
        grantee_id: &str,
        level: AccessLevel,
    ) -> SharingResult<String> {
        let code = self.ensure_share_code(owner_id)?;
        let appended = self.store.append_share_grant(owner_id, grantee_id, level)?;
        if appended {
            info!(
                "user {} granted {} access to {}",
                owner_id,
                level.as_str(),
                grantee_id
            );
        }
        Ok(code)
    }

    /// Resolve a presented code to its owning account and wire both
    /// sides of the relationship: the requester records the redemption,
    /// the owner grants the requester view access. Both writes are
    /// idempotent, so redeeming the same code again changes nothing.
    /// Returns the owner account content for immediate display.
    pub fn redeem_code(&self, requester_id: &str, code: &str) -> SharingResult<User> {
        let normalized = code.trim().to_uppercase();
        let owner = match self.store.get_user_by_share_code(&normalized) {
            Ok(user) => user,
            Err(StoreError::NotFound(_)) => return Err(SharingError::CodeNotFound(normalized)),
            Err(e) => return Err(e.into()),
        };

        self.store
            .append_access_record(requester_id, &normalized, &owner.id)?;
        self.grant_access(&owner.id, requester_id, AccessLevel::View)?;

        // Re-read so the returned content reflects the new grant.
        Ok(self.store.get_user(&owner.id)?)
    }
}
