//! In-memory reference implementation for coshare storage traits.
//!
//! Both relations live behind one lock so cascade delete, mint and revoke
//! observe a consistent view. Production deployments should use the
//! PostgreSQL backend.

use crate::traits::{CollectionStore, SharingTokenStore};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use coshare_types::permission::{can_delete, can_read, can_revoke, can_share, can_write};
use coshare_types::{
    Collection, CollectionDraft, CollectionId, Identity, ShareToken, SharingToken,
};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Tables {
    collections: HashMap<CollectionId, Collection>,
    tokens: HashMap<ShareToken, SharingToken>,
}

/// In-memory coshare storage adapter.
#[derive(Default)]
pub struct InMemoryCoshareStorage {
    tables: RwLock<Tables>,
}

impl InMemoryCoshareStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live tokens referencing `collection_id`.
    pub fn token_count(&self, collection_id: &CollectionId) -> StorageResult<usize> {
        let guard = self.read()?;
        Ok(guard
            .tokens
            .values()
            .filter(|t| t.collection_id == *collection_id)
            .count())
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(poisoned)
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(poisoned)
    }
}

fn poisoned<T>(_: PoisonError<T>) -> StorageError {
    StorageError::Backend("tables lock poisoned".to_string())
}

#[async_trait]
impl CollectionStore for InMemoryCoshareStorage {
    async fn create_collection(
        &self,
        draft: CollectionDraft,
        actor: &Identity,
    ) -> StorageResult<Collection> {
        let mut guard = self.write()?;
        let collection = Collection::from_draft(draft, actor);
        guard.collections.insert(collection.id, collection.clone());
        Ok(collection)
    }

    async fn get_collection(
        &self,
        id: &CollectionId,
        actor: &Identity,
    ) -> StorageResult<Collection> {
        let guard = self.read()?;
        let collection = guard
            .collections
            .get(id)
            .ok_or(StorageError::CollectionNotFound)?;

        if !can_read(collection, actor) {
            return Err(StorageError::Unauthorized);
        }
        Ok(collection.clone())
    }

    async fn get_collection_from_token(&self, token: &ShareToken) -> StorageResult<Collection> {
        let guard = self.read()?;
        let sharing = guard.tokens.get(token).ok_or(StorageError::TokenNotFound)?;
        guard
            .collections
            .get(&sharing.collection_id)
            .cloned()
            .ok_or(StorageError::CollectionNotFound)
    }

    async fn update_collection(
        &self,
        collection: Collection,
        actor: &Identity,
    ) -> StorageResult<Collection> {
        let mut guard = self.write()?;
        let existing = guard
            .collections
            .get(&collection.id)
            .ok_or(StorageError::CollectionNotFound)?;

        if !can_write(existing, actor) {
            return Err(StorageError::Unauthorized);
        }

        let merged = existing.merged_with(collection);
        guard.collections.insert(merged.id, merged.clone());
        Ok(merged)
    }

    async fn delete_collection(&self, id: &CollectionId, actor: &Identity) -> StorageResult<()> {
        let mut guard = self.write()?;
        let existing = guard
            .collections
            .get(id)
            .ok_or(StorageError::CollectionNotFound)?;

        if !can_delete(existing, actor) {
            return Err(StorageError::Unauthorized);
        }

        guard.collections.remove(id);
        guard.tokens.retain(|_, t| t.collection_id != *id);
        Ok(())
    }
}

#[async_trait]
impl SharingTokenStore for InMemoryCoshareStorage {
    async fn mint_token(
        &self,
        collection_id: &CollectionId,
        actor: &Identity,
    ) -> StorageResult<SharingToken> {
        let mut guard = self.write()?;
        let collection = guard
            .collections
            .get(collection_id)
            .ok_or(StorageError::CollectionNotFound)?;

        if !can_share(collection, actor) {
            return Err(StorageError::Unauthorized);
        }

        let sharing = SharingToken::mint(*collection_id, actor);
        guard.tokens.insert(sharing.token.clone(), sharing.clone());
        Ok(sharing)
    }

    async fn revoke_token(&self, token: &ShareToken, actor: &Identity) -> StorageResult<()> {
        let mut guard = self.write()?;
        let sharing = guard.tokens.get(token).ok_or(StorageError::TokenNotFound)?;

        if let Some(collection) = guard.collections.get(&sharing.collection_id) {
            if !can_revoke(sharing, collection, actor) {
                return Err(StorageError::Unauthorized);
            }
        }

        guard.tokens.remove(token);
        Ok(())
    }
}
