#![cfg(feature = "postgres")]

//! Runs against a live PostgreSQL when `COSHARE_TEST_DATABASE_URL` is set;
//! otherwise every test returns early.

use coshare_storage::{CollectionStore, PostgresCoshareStorage, SharingTokenStore, StorageError};
use coshare_types::{CollectionDraft, Identity, OrgGrants, OrgId, UserId};

async fn connect() -> Option<PostgresCoshareStorage> {
    let url = std::env::var("COSHARE_TEST_DATABASE_URL").ok()?;
    Some(
        PostgresCoshareStorage::connect(&url)
            .await
            .expect("connect test database"),
    )
}

fn identity(org: OrgId) -> Identity {
    Identity::new(UserId::generate(), org)
}

#[tokio::test]
async fn postgres_collection_lifecycle() {
    let Some(storage) = connect().await else {
        return;
    };
    let org = OrgId::generate();
    let owner = identity(org);
    let colleague = identity(org);

    let created = storage
        .create_collection(CollectionDraft::new("one"), &owner)
        .await
        .unwrap();

    let denied = storage.get_collection(&created.id, &colleague).await;
    assert!(matches!(denied, Err(StorageError::Unauthorized)));

    let mut payload = created.clone();
    payload.org_view = true;
    payload.owner_user = colleague.user;
    let updated = storage.update_collection(payload, &owner).await.unwrap();
    assert_eq!(updated.owner_user, owner.user);

    let fetched = storage
        .get_collection(&created.id, &colleague)
        .await
        .unwrap();
    assert_eq!(fetched.data, "one");
    assert_eq!(fetched.owner_user, owner.user);

    storage
        .delete_collection(&created.id, &owner)
        .await
        .unwrap();
    let gone = storage.get_collection(&created.id, &owner).await;
    assert!(matches!(gone, Err(StorageError::CollectionNotFound)));
}

#[tokio::test]
async fn postgres_delete_cascades_tokens() {
    let Some(storage) = connect().await else {
        return;
    };
    let owner = identity(OrgId::generate());

    let created = storage
        .create_collection(
            CollectionDraft::new("two").with_grants(OrgGrants {
                view: true,
                edit: true,
                share: true,
            }),
            &owner,
        )
        .await
        .unwrap();
    let minted = storage.mint_token(&created.id, &owner).await.unwrap();

    let shared = storage
        .get_collection_from_token(&minted.token)
        .await
        .unwrap();
    assert_eq!(shared.id, created.id);

    storage
        .delete_collection(&created.id, &owner)
        .await
        .unwrap();

    let result = storage.get_collection_from_token(&minted.token).await;
    assert!(result.unwrap_err().is_not_found());
}

#[tokio::test]
async fn postgres_revoke_checks_share_authority() {
    let Some(storage) = connect().await else {
        return;
    };
    let org = OrgId::generate();
    let owner = identity(org);
    let colleague = identity(org);

    let created = storage
        .create_collection(CollectionDraft::new("three"), &owner)
        .await
        .unwrap();
    let minted = storage.mint_token(&created.id, &owner).await.unwrap();

    let denied = storage.revoke_token(&minted.token, &colleague).await;
    assert!(matches!(denied, Err(StorageError::Unauthorized)));

    storage.revoke_token(&minted.token, &owner).await.unwrap();
    let result = storage.get_collection_from_token(&minted.token).await;
    assert!(matches!(result, Err(StorageError::TokenNotFound)));

    storage
        .delete_collection(&created.id, &owner)
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn postgres_concurrent_revoke_and_delete_serialize() {
    let Some(storage) = connect().await else {
        return;
    };
    let owner = identity(OrgId::generate());

    for _ in 0..50 {
        let created = storage
            .create_collection(CollectionDraft::new("race"), &owner)
            .await
            .unwrap();
        let minted = storage.mint_token(&created.id, &owner).await.unwrap();

        let revoker = storage.clone();
        let token = minted.token.clone();
        let revoke = tokio::spawn(async move { revoker.revoke_token(&token, &owner).await });
        let deleter = storage.clone();
        let id = created.id;
        let delete = tokio::spawn(async move { deleter.delete_collection(&id, &owner).await });

        let revoked = revoke.await.unwrap();
        let deleted = delete.await.unwrap();

        assert!(
            matches!(revoked, Ok(()) | Err(StorageError::TokenNotFound)),
            "revoke failed: {revoked:?}"
        );
        assert!(deleted.is_ok(), "delete failed: {deleted:?}");

        let gone = storage.get_collection_from_token(&minted.token).await;
        assert!(gone.unwrap_err().is_not_found());
    }
}
