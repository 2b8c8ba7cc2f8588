//! Transport-facing collection service.

use std::sync::Arc;

use coshare_storage::CoshareStorage;
use coshare_types::{
    AccessAction, AccessEvent, Collection, CollectionDraft, CollectionId, Identity, ShareToken,
    SharingToken,
};
use tracing::{debug, info};

use crate::error::{ServiceError, ServiceResult};
use crate::events::{AccessEventSink, NoopEventSink};
use crate::identity::{IdentityResolver, RequestMetadata, TrustedHeaderResolver};
use crate::limiter::AnonymousReadLimiter;

/// Ties storage, the anonymous read limiter, identity resolution and the
/// access event sink together. Every successful call publishes exactly one
/// access event; failed calls publish none.
#[derive(Clone)]
pub struct CollectionService {
    storage: Arc<dyn CoshareStorage>,
    limiter: Arc<AnonymousReadLimiter>,
    events: Arc<dyn AccessEventSink>,
    resolver: Arc<dyn IdentityResolver>,
}

impl CollectionService {
    /// Service over `storage` with a default limiter, trusted-header
    /// identity and no event delivery.
    pub fn new(storage: Arc<dyn CoshareStorage>) -> Self {
        Self {
            storage,
            limiter: Arc::new(AnonymousReadLimiter::default()),
            events: Arc::new(NoopEventSink),
            resolver: Arc::new(TrustedHeaderResolver::default()),
        }
    }

    pub fn with_limiter(mut self, limiter: Arc<AnonymousReadLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_event_sink(mut self, events: Arc<dyn AccessEventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_identity_resolver(mut self, resolver: Arc<dyn IdentityResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn limiter(&self) -> &Arc<AnonymousReadLimiter> {
        &self.limiter
    }

    /// Resolve the caller of an authenticated request.
    pub fn authenticate(&self, metadata: &RequestMetadata) -> ServiceResult<Identity> {
        self.resolver.resolve(metadata).map_err(|e| {
            debug!("rejected unauthenticated request");
            ServiceError::from(e)
        })
    }

    pub async fn create_collection(
        &self,
        actor: &Identity,
        draft: CollectionDraft,
    ) -> ServiceResult<Collection> {
        let collection = self.storage.create_collection(draft, actor).await?;
        info!(
            collection_id = %collection.id,
            user = %actor.user,
            org = %actor.org,
            "collection created"
        );
        self.events.notify(AccessEvent::collection(
            AccessAction::Create,
            collection.id,
            *actor,
        ));
        Ok(collection)
    }

    pub async fn get_collection(
        &self,
        actor: &Identity,
        id: &CollectionId,
    ) -> ServiceResult<Collection> {
        let collection = self.storage.get_collection(id, actor).await?;
        debug!(collection_id = %id, user = %actor.user, "collection read");
        self.events
            .notify(AccessEvent::collection(AccessAction::Read, *id, *actor));
        Ok(collection)
    }

    /// Replace data and grants. Ownership in `collection` is ignored.
    pub async fn update_collection(
        &self,
        actor: &Identity,
        collection: Collection,
    ) -> ServiceResult<Collection> {
        let updated = self.storage.update_collection(collection, actor).await?;
        info!(
            collection_id = %updated.id,
            user = %actor.user,
            org = %actor.org,
            "collection updated"
        );
        self.events.notify(AccessEvent::collection(
            AccessAction::Update,
            updated.id,
            *actor,
        ));
        Ok(updated)
    }

    pub async fn delete_collection(
        &self,
        actor: &Identity,
        id: &CollectionId,
    ) -> ServiceResult<()> {
        self.storage.delete_collection(id, actor).await?;
        info!(
            collection_id = %id,
            user = %actor.user,
            org = %actor.org,
            "collection deleted"
        );
        self.events
            .notify(AccessEvent::collection(AccessAction::Delete, *id, *actor));
        Ok(())
    }

    pub async fn mint_share_token(
        &self,
        actor: &Identity,
        collection_id: &CollectionId,
    ) -> ServiceResult<SharingToken> {
        let sharing = self.storage.mint_token(collection_id, actor).await?;
        info!(
            collection_id = %collection_id,
            user = %actor.user,
            org = %actor.org,
            "share token minted"
        );
        self.events.notify(AccessEvent::shared(
            *collection_id,
            sharing.token.clone(),
            *actor,
        ));
        Ok(sharing)
    }

    pub async fn revoke_share_token(
        &self,
        actor: &Identity,
        token: &ShareToken,
    ) -> ServiceResult<()> {
        self.storage.revoke_token(token, actor).await?;
        info!(user = %actor.user, org = %actor.org, "share token revoked");
        self.events
            .notify(AccessEvent::revoked(token.clone(), *actor));
        Ok(())
    }

    /// Anonymous read through a share token. The limiter is consulted
    /// before storage, so a throttled request never reaches the backend.
    pub async fn get_shared_collection(&self, token: &ShareToken) -> ServiceResult<Collection> {
        if !self.limiter.try_acquire(token) {
            debug!("anonymous read throttled");
            return Err(ServiceError::RateLimited);
        }
        let collection = self.storage.get_collection_from_token(token).await?;
        debug!(collection_id = %collection.id, "anonymous shared read");
        self.events
            .notify(AccessEvent::read_shared(collection.id, token.clone()));
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{ORG_HEADER, USER_HEADER};
    use crate::limiter::LimiterConfig;
    use async_trait::async_trait;
    use coshare_storage::{
        CollectionStore, InMemoryCoshareStorage, SharingTokenStore, StorageError, StorageResult,
    };
    use coshare_types::{OrgGrants, OrgId, UserId};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<AccessEvent>>,
    }

    impl RecordingSink {
        fn actions(&self) -> Vec<AccessAction> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|e| e.action)
                .collect()
        }
    }

    impl AccessEventSink for RecordingSink {
        fn notify(&self, event: AccessEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    struct Fixture {
        service: CollectionService,
        sink: Arc<RecordingSink>,
    }

    fn fixture_with(storage: Arc<dyn CoshareStorage>, ceiling: u32) -> Fixture {
        let sink = Arc::new(RecordingSink::default());
        let limiter = Arc::new(AnonymousReadLimiter::new(LimiterConfig {
            ceiling,
            window: Duration::from_secs(15),
        }));
        let service = CollectionService::new(storage)
            .with_limiter(limiter)
            .with_event_sink(sink.clone());
        Fixture { service, sink }
    }

    fn fixture() -> Fixture {
        fixture_with(Arc::new(InMemoryCoshareStorage::new()), 250)
    }

    fn member(org: OrgId) -> Identity {
        Identity::new(UserId::generate(), org)
    }

    fn open_grants() -> OrgGrants {
        OrgGrants {
            view: true,
            edit: true,
            share: true,
        }
    }

    #[tokio::test]
    async fn test_each_success_emits_one_event() {
        let f = fixture();
        let owner = member(OrgId::generate());

        let created = f
            .service
            .create_collection(&owner, CollectionDraft::new("one"))
            .await
            .unwrap();
        f.service.get_collection(&owner, &created.id).await.unwrap();

        let mut payload = created.clone();
        payload.data = "two".to_string();
        f.service.update_collection(&owner, payload).await.unwrap();

        let minted = f
            .service
            .mint_share_token(&owner, &created.id)
            .await
            .unwrap();
        f.service
            .get_shared_collection(&minted.token)
            .await
            .unwrap();
        f.service
            .revoke_share_token(&owner, &minted.token)
            .await
            .unwrap();
        f.service
            .delete_collection(&owner, &created.id)
            .await
            .unwrap();

        assert_eq!(
            f.sink.actions(),
            vec![
                AccessAction::Create,
                AccessAction::Read,
                AccessAction::Update,
                AccessAction::Share,
                AccessAction::ReadShared,
                AccessAction::Revoke,
                AccessAction::Delete,
            ]
        );
    }

    #[tokio::test]
    async fn test_event_payloads() {
        let f = fixture();
        let owner = member(OrgId::generate());

        let created = f
            .service
            .create_collection(&owner, CollectionDraft::new("one"))
            .await
            .unwrap();
        let minted = f
            .service
            .mint_share_token(&owner, &created.id)
            .await
            .unwrap();
        f.service
            .get_shared_collection(&minted.token)
            .await
            .unwrap();

        let events = f.sink.events.lock().unwrap();
        assert_eq!(events[0].actor, Some(owner));
        assert_eq!(events[0].collection_id, Some(created.id));
        assert_eq!(events[1].shared_token.as_ref(), Some(&minted.token));
        assert_eq!(events[2].actor, None);
        assert_eq!(events[2].collection_id, Some(created.id));
    }

    #[tokio::test]
    async fn test_failures_emit_nothing() {
        let f = fixture();
        let org = OrgId::generate();
        let owner = member(org);
        let colleague = member(org);

        let created = f
            .service
            .create_collection(&owner, CollectionDraft::new("private"))
            .await
            .unwrap();

        let denied = f.service.get_collection(&colleague, &created.id).await;
        assert!(matches!(denied, Err(ServiceError::Unauthorized)));

        let missing = f
            .service
            .get_collection(&owner, &CollectionId::generate())
            .await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));

        let bogus = f
            .service
            .get_shared_collection(&ShareToken::new("nope"))
            .await;
        assert!(matches!(bogus, Err(ServiceError::NotFound(_))));

        assert_eq!(f.sink.actions(), vec![AccessAction::Create]);
    }

    #[tokio::test]
    async fn test_org_view_scenario() {
        let f = fixture();
        let org_a = OrgId::generate();
        let owner = member(org_a);
        let colleague = member(org_a);
        let outsider = member(OrgId::generate());

        let created = f
            .service
            .create_collection(
                &owner,
                CollectionDraft::new("roadmap").with_grants(OrgGrants {
                    view: true,
                    edit: false,
                    share: false,
                }),
            )
            .await
            .unwrap();

        let read = f
            .service
            .get_collection(&colleague, &created.id)
            .await
            .unwrap();
        assert_eq!(read.data, "roadmap");

        let mut payload = created.clone();
        payload.data = "hijacked".to_string();
        let write = f.service.update_collection(&colleague, payload).await;
        assert!(matches!(write, Err(ServiceError::Unauthorized)));

        let cross = f.service.get_collection(&outsider, &created.id).await;
        assert!(matches!(cross, Err(ServiceError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_shared_reads_are_rate_limited() {
        let f = fixture();
        let owner = member(OrgId::generate());
        let created = f
            .service
            .create_collection(&owner, CollectionDraft::new("public"))
            .await
            .unwrap();
        let minted = f
            .service
            .mint_share_token(&owner, &created.id)
            .await
            .unwrap();

        for _ in 0..250 {
            f.service
                .get_shared_collection(&minted.token)
                .await
                .unwrap();
        }
        let throttled = f.service.get_shared_collection(&minted.token).await;
        assert!(matches!(throttled, Err(ServiceError::RateLimited)));
    }

    #[tokio::test]
    async fn test_limiter_runs_before_storage() {
        let f = fixture_with(Arc::new(FailingStorage), 1);
        let token = ShareToken::new("anything");

        let first = f.service.get_shared_collection(&token).await;
        assert!(matches!(first, Err(ServiceError::Internal)));

        // Rejected by the limiter without reaching the failing backend.
        let second = f.service.get_shared_collection(&token).await;
        assert!(matches!(second, Err(ServiceError::RateLimited)));
    }

    #[tokio::test]
    async fn test_revoked_token_stops_working() {
        let f = fixture();
        let org = OrgId::generate();
        let owner = member(org);
        let sharer = member(org);

        let created = f
            .service
            .create_collection(&owner, CollectionDraft::new("x").with_grants(open_grants()))
            .await
            .unwrap();
        let minted = f
            .service
            .mint_share_token(&sharer, &created.id)
            .await
            .unwrap();
        f.service
            .revoke_share_token(&sharer, &minted.token)
            .await
            .unwrap();

        let after = f.service.get_shared_collection(&minted.token).await;
        assert!(matches!(after, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_backend_failure_is_opaque() {
        let f = fixture_with(Arc::new(FailingStorage), 250);
        let owner = member(OrgId::generate());

        let err = f
            .service
            .create_collection(&owner, CollectionDraft::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Internal));
        assert!(!err.to_string().contains("secret"));
        assert!(f.sink.actions().is_empty());
    }

    #[test]
    fn test_authenticate() {
        let service = CollectionService::new(Arc::new(InMemoryCoshareStorage::new()));
        let user = UserId::generate();
        let org = OrgId::generate();
        let metadata = RequestMetadata::new()
            .with(USER_HEADER, user.as_uuid().to_string())
            .with(ORG_HEADER, org.as_uuid().to_string());

        assert_eq!(
            service.authenticate(&metadata).unwrap(),
            Identity::new(user, org)
        );
        assert!(matches!(
            service.authenticate(&RequestMetadata::new()),
            Err(ServiceError::Unauthorized)
        ));
    }

    struct FailingStorage;

    fn failure<T>() -> StorageResult<T> {
        Err(StorageError::Backend(
            "connection to 10.0.0.7 refused (secret=hunter2)".to_string(),
        ))
    }

    #[async_trait]
    impl CollectionStore for FailingStorage {
        async fn create_collection(
            &self,
            _draft: CollectionDraft,
            _actor: &Identity,
        ) -> StorageResult<Collection> {
            failure()
        }

        async fn get_collection(
            &self,
            _id: &CollectionId,
            _actor: &Identity,
        ) -> StorageResult<Collection> {
            failure()
        }

        async fn get_collection_from_token(
            &self,
            _token: &ShareToken,
        ) -> StorageResult<Collection> {
            failure()
        }

        async fn update_collection(
            &self,
            _collection: Collection,
            _actor: &Identity,
        ) -> StorageResult<Collection> {
            failure()
        }

        async fn delete_collection(
            &self,
            _id: &CollectionId,
            _actor: &Identity,
        ) -> StorageResult<()> {
            failure()
        }
    }

    #[async_trait]
    impl SharingTokenStore for FailingStorage {
        async fn mint_token(
            &self,
            _collection_id: &CollectionId,
            _actor: &Identity,
        ) -> StorageResult<SharingToken> {
            failure()
        }

        async fn revoke_token(&self, _token: &ShareToken, _actor: &Identity) -> StorageResult<()> {
            failure()
        }
    }
}
