//! Collection records and the caller payload that creates them

use crate::identity::Identity;
use crate::ids::{CollectionId, OrgId, UserId};
use serde::{Deserialize, Serialize};

/// Organization-level grants on a collection.
///
/// Each flag independently opens one capability to members of the
/// owning organization. All default to `false` (private).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgGrants {
    pub view: bool,
    pub edit: bool,
    pub share: bool,
}

/// Caller-supplied collection content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDraft {
    pub data: String,
    #[serde(default)]
    pub org_view: bool,
    #[serde(default)]
    pub org_edit: bool,
    #[serde(default)]
    pub org_share: bool,
}

impl CollectionDraft {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Default::default()
        }
    }

    pub fn with_grants(mut self, grants: OrgGrants) -> Self {
        self.org_view = grants.view;
        self.org_edit = grants.edit;
        self.org_share = grants.share;
        self
    }
}

/// A stored collection.
///
/// `id`, `owner_user` and `owner_org` are fixed at creation; updates may
/// only replace `data` and the grant flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub owner_user: UserId,
    pub owner_org: OrgId,
    pub data: String,
    pub org_view: bool,
    pub org_edit: bool,
    pub org_share: bool,
}

impl Collection {
    /// Build a new record owned by `owner` with a fresh identifier.
    pub fn from_draft(draft: CollectionDraft, owner: &Identity) -> Self {
        Self {
            id: CollectionId::generate(),
            owner_user: owner.user,
            owner_org: owner.org,
            data: draft.data,
            org_view: draft.org_view,
            org_edit: draft.org_edit,
            org_share: draft.org_share,
        }
    }

    pub fn grants(&self) -> OrgGrants {
        OrgGrants {
            view: self.org_view,
            edit: self.org_edit,
            share: self.org_share,
        }
    }

    /// Take content and flags from `incoming` while keeping this record's
    /// identity and ownership.
    pub fn merged_with(&self, incoming: Collection) -> Collection {
        Collection {
            id: self.id,
            owner_user: self.owner_user,
            owner_org: self.owner_org,
            data: incoming.data,
            org_view: incoming.org_view,
            org_edit: incoming.org_edit,
            org_share: incoming.org_share,
        }
    }
}
