//! Permission evaluation for collections and sharing tokens.
//!
//! All rules share one shape: the owning user may always act; anyone else
//! needs the matching org grant AND membership of the owning organization.
//! There is no cross-organization access.

use crate::collection::Collection;
use crate::identity::Identity;
use crate::token::SharingToken;
use serde::{Deserialize, Serialize};

/// An action an authenticated identity may attempt on a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Write,
    Delete,
    Share,
}

/// Decide whether `actor` may perform `action` on `collection`.
pub fn authorize(collection: &Collection, actor: &Identity, action: Action) -> bool {
    if actor.user == collection.owner_user {
        return true;
    }

    // Deletion rides on the edit grant; there is no separate delete flag.
    let granted = match action {
        Action::Read => collection.org_view,
        Action::Write | Action::Delete => collection.org_edit,
        Action::Share => collection.org_share,
    };

    granted && actor.org == collection.owner_org
}

pub fn can_read(collection: &Collection, actor: &Identity) -> bool {
    authorize(collection, actor, Action::Read)
}

pub fn can_write(collection: &Collection, actor: &Identity) -> bool {
    authorize(collection, actor, Action::Write)
}

pub fn can_delete(collection: &Collection, actor: &Identity) -> bool {
    authorize(collection, actor, Action::Delete)
}

pub fn can_share(collection: &Collection, actor: &Identity) -> bool {
    authorize(collection, actor, Action::Share)
}

/// Revocation follows the current share authority on the live collection,
/// with the minting user always allowed to take back their own token. The
/// collection owner holds share authority from any organization, so the
/// owner may revoke any token on the collection.
pub fn can_revoke(token: &SharingToken, collection: &Collection, actor: &Identity) -> bool {
    actor.user == token.minting_user || can_share(collection, actor)
}
