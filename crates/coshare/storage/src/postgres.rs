//! PostgreSQL adapter for coshare storage.
//!
//! Every load-authorize-write sequence runs in one transaction holding a row
//! lock on the record it authorizes against, so a concurrent update cannot
//! slip between the permission check and the write. Collection deletion
//! removes its tokens in the same transaction. Locks are always taken
//! collection row first, then token rows.

use crate::traits::{CollectionStore, SharingTokenStore};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use coshare_types::permission::{can_delete, can_read, can_revoke, can_share, can_write};
use coshare_types::{
    Collection, CollectionDraft, CollectionId, Identity, OrgId, ShareToken, SharingToken, UserId,
};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use uuid::Uuid;

const COLLECTION_COLUMNS: &str = "id, owner_user, owner_org, data, org_view, org_edit, org_share";

/// PostgreSQL-backed storage adapter.
#[derive(Clone)]
pub struct PostgresCoshareStorage {
    pool: PgPool,
}

impl PostgresCoshareStorage {
    /// Connect to PostgreSQL and initialize required schema.
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        Self::connect_with_options(database_url, 10, 5).await
    }

    /// Connect with explicit pool parameters.
    pub async fn connect_with_options(
        database_url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(std::time::Duration::from_secs(connect_timeout_secs))
            .connect(database_url)
            .await
            .map_err(|e| StorageError::Backend(format!("failed to connect postgres: {e}")))?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create adapter from an existing pool.
    pub async fn from_pool(pool: PgPool) -> StorageResult<Self> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn init_schema(&self) -> StorageResult<()> {
        let ddl = [
            r#"
            CREATE TABLE IF NOT EXISTS coshare_collections (
                id UUID PRIMARY KEY,
                owner_user UUID NOT NULL,
                owner_org UUID NOT NULL,
                data TEXT NOT NULL,
                org_view BOOLEAN NOT NULL DEFAULT FALSE,
                org_edit BOOLEAN NOT NULL DEFAULT FALSE,
                org_share BOOLEAN NOT NULL DEFAULT FALSE
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS coshare_sharing_tokens (
                token TEXT PRIMARY KEY,
                collection_id UUID NOT NULL
                    REFERENCES coshare_collections (id) ON DELETE CASCADE,
                minting_user UUID NOT NULL,
                minting_org UUID NOT NULL
            )
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS coshare_sharing_tokens_collection_idx
                ON coshare_sharing_tokens (collection_id)
            "#,
        ];

        for stmt in ddl {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::Backend(format!("schema init failed: {e}")))?;
        }
        Ok(())
    }
}

#[async_trait]
impl CollectionStore for PostgresCoshareStorage {
    async fn create_collection(
        &self,
        draft: CollectionDraft,
        actor: &Identity,
    ) -> StorageResult<Collection> {
        let collection = Collection::from_draft(draft, actor);

        sqlx::query(
            r#"
            INSERT INTO coshare_collections
                (id, owner_user, owner_org, data, org_view, org_edit, org_share)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(*collection.id.as_uuid())
        .bind(*collection.owner_user.as_uuid())
        .bind(*collection.owner_org.as_uuid())
        .bind(collection.data.clone())
        .bind(collection.org_view)
        .bind(collection.org_edit)
        .bind(collection.org_share)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(collection)
    }

    async fn get_collection(
        &self,
        id: &CollectionId,
        actor: &Identity,
    ) -> StorageResult<Collection> {
        let row = sqlx::query(&format!(
            "SELECT {COLLECTION_COLUMNS} FROM coshare_collections WHERE id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        let collection = row
            .map(|r| collection_row_to_record(&r))
            .transpose()?
            .ok_or(StorageError::CollectionNotFound)?;

        if !can_read(&collection, actor) {
            return Err(StorageError::Unauthorized);
        }
        Ok(collection)
    }

    async fn get_collection_from_token(&self, token: &ShareToken) -> StorageResult<Collection> {
        let row = sqlx::query(
            r#"
            SELECT c.id, c.owner_user, c.owner_org, c.data, c.org_view, c.org_edit, c.org_share
              FROM coshare_sharing_tokens t
              LEFT JOIN coshare_collections c ON c.id = t.collection_id
             WHERE t.token = $1
            "#,
        )
        .bind(token.expose())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .ok_or(StorageError::TokenNotFound)?;

        let id: Option<Uuid> = row.try_get("id").map_err(backend)?;
        if id.is_none() {
            return Err(StorageError::CollectionNotFound);
        }
        collection_row_to_record(&row)
    }

    async fn update_collection(
        &self,
        collection: Collection,
        actor: &Identity,
    ) -> StorageResult<Collection> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let row = sqlx::query(&format!(
            "SELECT {COLLECTION_COLUMNS} FROM coshare_collections WHERE id = $1 FOR UPDATE"
        ))
        .bind(*collection.id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?
        .ok_or(StorageError::CollectionNotFound)?;
        let existing = collection_row_to_record(&row)?;

        if !can_write(&existing, actor) {
            return Err(StorageError::Unauthorized);
        }

        let merged = existing.merged_with(collection);
        sqlx::query(
            r#"
            UPDATE coshare_collections
               SET data = $1,
                   org_view = $2,
                   org_edit = $3,
                   org_share = $4
             WHERE id = $5
            "#,
        )
        .bind(merged.data.clone())
        .bind(merged.org_view)
        .bind(merged.org_edit)
        .bind(merged.org_share)
        .bind(*merged.id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        tx.commit().await.map_err(backend)?;
        Ok(merged)
    }

    async fn delete_collection(&self, id: &CollectionId, actor: &Identity) -> StorageResult<()> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let row = sqlx::query(&format!(
            "SELECT {COLLECTION_COLUMNS} FROM coshare_collections WHERE id = $1 FOR UPDATE"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?
        .ok_or(StorageError::CollectionNotFound)?;
        let existing = collection_row_to_record(&row)?;

        if !can_delete(&existing, actor) {
            return Err(StorageError::Unauthorized);
        }

        sqlx::query("DELETE FROM coshare_sharing_tokens WHERE collection_id = $1")
            .bind(*id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        sqlx::query("DELETE FROM coshare_collections WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        tx.commit().await.map_err(backend)?;
        Ok(())
    }
}

#[async_trait]
impl SharingTokenStore for PostgresCoshareStorage {
    async fn mint_token(
        &self,
        collection_id: &CollectionId,
        actor: &Identity,
    ) -> StorageResult<SharingToken> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let row = sqlx::query(&format!(
            "SELECT {COLLECTION_COLUMNS} FROM coshare_collections WHERE id = $1 FOR SHARE"
        ))
        .bind(*collection_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?
        .ok_or(StorageError::CollectionNotFound)?;
        let collection = collection_row_to_record(&row)?;

        if !can_share(&collection, actor) {
            return Err(StorageError::Unauthorized);
        }

        let sharing = SharingToken::mint(*collection_id, actor);
        sqlx::query(
            r#"
            INSERT INTO coshare_sharing_tokens (token, collection_id, minting_user, minting_org)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(sharing.token.expose())
        .bind(*sharing.collection_id.as_uuid())
        .bind(*sharing.minting_user.as_uuid())
        .bind(*sharing.minting_org.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        tx.commit().await.map_err(backend)?;
        Ok(sharing)
    }

    async fn revoke_token(&self, token: &ShareToken, actor: &Identity) -> StorageResult<()> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        // Lock order: collection row, then token row.
        let collection_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT collection_id FROM coshare_sharing_tokens WHERE token = $1",
        )
        .bind(token.expose())
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?
        .ok_or(StorageError::TokenNotFound)?;

        let collection = sqlx::query(&format!(
            "SELECT {COLLECTION_COLUMNS} FROM coshare_collections WHERE id = $1 FOR SHARE"
        ))
        .bind(collection_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?
        .map(|r| collection_row_to_record(&r))
        .transpose()?;

        let row = sqlx::query(
            r#"
            SELECT token, collection_id, minting_user, minting_org
              FROM coshare_sharing_tokens
             WHERE token = $1
               FOR UPDATE
            "#,
        )
        .bind(token.expose())
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?
        .ok_or(StorageError::TokenNotFound)?;
        let sharing = token_row_to_record(&row)?;
        if *sharing.collection_id.as_uuid() != collection_id {
            return Err(StorageError::TokenNotFound);
        }

        if let Some(collection) = &collection {
            if !can_revoke(&sharing, collection, actor) {
                return Err(StorageError::Unauthorized);
            }
        }

        sqlx::query("DELETE FROM coshare_sharing_tokens WHERE token = $1")
            .bind(token.expose())
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        tx.commit().await.map_err(backend)?;
        Ok(())
    }
}

fn collection_row_to_record(row: &PgRow) -> StorageResult<Collection> {
    Ok(Collection {
        id: CollectionId::from_uuid(row.try_get("id").map_err(backend)?),
        owner_user: UserId::from_uuid(row.try_get("owner_user").map_err(backend)?),
        owner_org: OrgId::from_uuid(row.try_get("owner_org").map_err(backend)?),
        data: row.try_get("data").map_err(backend)?,
        org_view: row.try_get("org_view").map_err(backend)?,
        org_edit: row.try_get("org_edit").map_err(backend)?,
        org_share: row.try_get("org_share").map_err(backend)?,
    })
}

fn token_row_to_record(row: &PgRow) -> StorageResult<SharingToken> {
    let token: String = row.try_get("token").map_err(backend)?;
    Ok(SharingToken {
        token: ShareToken::new(token),
        collection_id: CollectionId::from_uuid(row.try_get("collection_id").map_err(backend)?),
        minting_user: UserId::from_uuid(row.try_get("minting_user").map_err(backend)?),
        minting_org: OrgId::from_uuid(row.try_get("minting_org").map_err(backend)?),
    })
}

fn backend(err: sqlx::Error) -> StorageError {
    StorageError::Backend(err.to_string())
}
