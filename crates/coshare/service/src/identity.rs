//! Request identity resolution.
//!
//! Transports hand the resolver a bag of request metadata (HTTP headers,
//! RPC metadata); the resolver decides who is calling. Anything that cannot
//! be turned into a complete identity is `Unauthenticated`.

use std::collections::HashMap;

use coshare_types::{Identity, OrgId, UserId};
use thiserror::Error;
use uuid::Uuid;

/// Header carrying the caller's user id for [`TrustedHeaderResolver`].
pub const USER_HEADER: &str = "x-coshare-user";
/// Header carrying the caller's organization id for [`TrustedHeaderResolver`].
pub const ORG_HEADER: &str = "x-coshare-org";

/// Case-insensitive request metadata.
#[derive(Debug, Clone, Default)]
pub struct RequestMetadata {
    entries: HashMap<String, String>,
}

impl RequestMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous value under the same key.
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .insert(key.as_ref().to_ascii_lowercase(), value.into());
    }

    pub fn with(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RequestMetadata
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut metadata = RequestMetadata::new();
        for (key, value) in iter {
            metadata.insert(key, value);
        }
        metadata
    }
}

/// The caller could not be identified.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("unauthenticated")]
pub struct Unauthenticated;

/// Maps request metadata to a caller identity.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, metadata: &RequestMetadata) -> Result<Identity, Unauthenticated>;
}

/// Reads user and organization ids from headers set by a trusted front
/// proxy. Only suitable behind a gateway that strips client-supplied copies
/// of these headers.
#[derive(Debug, Clone)]
pub struct TrustedHeaderResolver {
    user_header: String,
    org_header: String,
}

impl TrustedHeaderResolver {
    pub fn new(user_header: impl Into<String>, org_header: impl Into<String>) -> Self {
        Self {
            user_header: user_header.into(),
            org_header: org_header.into(),
        }
    }

    fn parse(&self, metadata: &RequestMetadata, key: &str) -> Result<Uuid, Unauthenticated> {
        let raw = metadata.get(key).ok_or(Unauthenticated)?;
        Uuid::parse_str(raw.trim()).map_err(|_| Unauthenticated)
    }
}

impl Default for TrustedHeaderResolver {
    fn default() -> Self {
        Self::new(USER_HEADER, ORG_HEADER)
    }
}

impl IdentityResolver for TrustedHeaderResolver {
    fn resolve(&self, metadata: &RequestMetadata) -> Result<Identity, Unauthenticated> {
        let user = UserId::from_uuid(self.parse(metadata, &self.user_header)?);
        let org = OrgId::from_uuid(self.parse(metadata, &self.org_header)?);
        Ok(Identity::new(user, org))
    }
}
