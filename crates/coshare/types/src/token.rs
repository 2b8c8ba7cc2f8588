//! Sharing tokens

use crate::identity::Identity;
use crate::ids::{CollectionId, OrgId, ShareToken, UserId};
use serde::{Deserialize, Serialize};

/// A minted, revocable anonymous-read grant for one collection.
///
/// The minting identity is recorded for revocation checks only; reads
/// through the token never consult it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharingToken {
    pub token: ShareToken,
    pub collection_id: CollectionId,
    pub minting_user: UserId,
    pub minting_org: OrgId,
}

impl SharingToken {
    /// Mint a fresh token for `collection_id` on behalf of `minter`.
    pub fn mint(collection_id: CollectionId, minter: &Identity) -> Self {
        Self {
            token: ShareToken::generate(),
            collection_id,
            minting_user: minter.user,
            minting_org: minter.org,
        }
    }

    pub fn minted_by(&self) -> Identity {
        Identity::new(self.minting_user, self.minting_org)
    }
}
