//! Coshare storage.
//!
//! Collections and sharing tokens behind async store traits. Every backend
//! enforces the permission rules from `coshare_types::permission` itself, so
//! callers cannot read or mutate what the acting identity may not touch.
//!
//! - `memory`: deterministic reference backend for tests and development.
//! - `postgres`: transactional source of truth (feature `postgres`).

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

mod error;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
mod traits;

pub use error::{StorageError, StorageResult};
pub use memory::InMemoryCoshareStorage;
#[cfg(feature = "postgres")]
pub use postgres::PostgresCoshareStorage;
pub use traits::{CollectionStore, CoshareStorage, SharingTokenStore};
