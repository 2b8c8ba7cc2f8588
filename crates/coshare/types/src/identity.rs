//! Resolved caller identity

use crate::ids::{OrgId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A verified `(user, org)` pair produced by identity resolution.
///
/// Every authenticated store and service call takes one of these
/// explicitly; there is no ambient request context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub user: UserId,
    pub org: OrgId,
}

impl Identity {
    pub fn new(user: UserId, org: OrgId) -> Self {
        Self { user, org }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.org)
    }
}
