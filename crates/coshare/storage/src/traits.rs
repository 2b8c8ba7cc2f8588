use crate::StorageResult;
use async_trait::async_trait;
use coshare_types::{
    Collection, CollectionDraft, CollectionId, Identity, ShareToken, SharingToken,
};

/// Storage interface for collection records.
///
/// Implementations enforce the permission rules on every call; callers
/// never see a record the actor is not allowed to touch.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Persist a new collection owned by `actor` and return it with its
    /// assigned identifier.
    async fn create_collection(
        &self,
        draft: CollectionDraft,
        actor: &Identity,
    ) -> StorageResult<Collection>;

    /// Load one collection the actor may read.
    async fn get_collection(&self, id: &CollectionId, actor: &Identity)
        -> StorageResult<Collection>;

    /// Resolve a share token to its collection. Token possession is the
    /// credential; no identity is checked.
    async fn get_collection_from_token(&self, token: &ShareToken) -> StorageResult<Collection>;

    /// Replace data and grant flags of `collection.id`. Ownership fields in
    /// the payload are ignored and the stored owner is kept.
    async fn update_collection(
        &self,
        collection: Collection,
        actor: &Identity,
    ) -> StorageResult<Collection>;

    /// Remove a collection and, atomically, every token that references it.
    async fn delete_collection(&self, id: &CollectionId, actor: &Identity) -> StorageResult<()>;
}

/// Storage interface for anonymous sharing tokens.
#[async_trait]
pub trait SharingTokenStore: Send + Sync {
    /// Mint a new token for a collection the actor may share.
    async fn mint_token(
        &self,
        collection_id: &CollectionId,
        actor: &Identity,
    ) -> StorageResult<SharingToken>;

    /// Delete a token. Tokens whose collection has vanished are removed
    /// without an authorization check.
    async fn revoke_token(&self, token: &ShareToken, actor: &Identity) -> StorageResult<()>;
}

/// Unified storage bundle used by the service layer.
pub trait CoshareStorage: CollectionStore + SharingTokenStore + Send + Sync {}

impl<T> CoshareStorage for T where T: CollectionStore + SharingTokenStore + Send + Sync {}
