//! Coshare core types.
//!
//! Identifiers, collection and sharing-token records, access events and
//! the pure permission rules shared by every storage backend.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

mod collection;
mod event;
mod identity;
mod ids;
pub mod permission;
mod token;

pub use collection::{Collection, CollectionDraft, OrgGrants};
pub use event::{AccessAction, AccessEvent};
pub use identity::Identity;
pub use ids::{CollectionId, OrgId, ShareToken, UserId};
pub use permission::Action;
pub use token::SharingToken;
