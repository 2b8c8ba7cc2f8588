//! Access events emitted after each successful operation

use crate::identity::Identity;
use crate::ids::{CollectionId, ShareToken};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened to a collection or token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccessAction {
    Create,
    Read,
    Update,
    Delete,
    Share,
    Revoke,
    ReadShared,
}

impl AccessAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessAction::Create => "create",
            AccessAction::Read => "read",
            AccessAction::Update => "update",
            AccessAction::Delete => "delete",
            AccessAction::Share => "share",
            AccessAction::Revoke => "revoke",
            AccessAction::ReadShared => "readShared",
        }
    }
}

/// Analytics notification for one operation.
///
/// `actor` is absent only for anonymous reads through a share token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEvent {
    pub action: AccessAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<CollectionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_token: Option<ShareToken>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<Identity>,
    pub occurred_at: DateTime<Utc>,
}

impl AccessEvent {
    /// Event for an authenticated operation on a collection.
    pub fn collection(action: AccessAction, collection_id: CollectionId, actor: Identity) -> Self {
        Self {
            action,
            collection_id: Some(collection_id),
            shared_token: None,
            actor: Some(actor),
            occurred_at: Utc::now(),
        }
    }

    pub fn shared(collection_id: CollectionId, token: ShareToken, actor: Identity) -> Self {
        Self {
            action: AccessAction::Share,
            collection_id: Some(collection_id),
            shared_token: Some(token),
            actor: Some(actor),
            occurred_at: Utc::now(),
        }
    }

    pub fn revoked(token: ShareToken, actor: Identity) -> Self {
        Self {
            action: AccessAction::Revoke,
            collection_id: None,
            shared_token: Some(token),
            actor: Some(actor),
            occurred_at: Utc::now(),
        }
    }

    pub fn read_shared(collection_id: CollectionId, token: ShareToken) -> Self {
        Self {
            action: AccessAction::ReadShared,
            collection_id: Some(collection_id),
            shared_token: Some(token),
            actor: None,
            occurred_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{OrgId, UserId};

    #[test]
    fn test_action_serializes_camel_case() {
        let json = serde_json::to_string(&AccessAction::ReadShared).unwrap();
        assert_eq!(json, "\"readShared\"");
        assert_eq!(AccessAction::ReadShared.as_str(), "readShared");
    }

    #[test]
    fn test_anonymous_read_has_no_actor() {
        let event = AccessEvent::read_shared(CollectionId::generate(), ShareToken::generate());
        assert!(event.actor.is_none());
        assert_eq!(event.action, AccessAction::ReadShared);

        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("actor").is_none());
    }

    #[test]
    fn test_revoke_event_carries_token_only() {
        let actor = Identity::new(UserId::generate(), OrgId::generate());
        let event = AccessEvent::revoked(ShareToken::new("t"), actor);
        assert!(event.collection_id.is_none());
        assert_eq!(event.shared_token, Some(ShareToken::new("t")));
        assert_eq!(event.actor, Some(actor));
    }
}
