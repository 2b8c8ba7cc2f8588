//! Coshare service layer.
//!
//! [`CollectionService`] is the single entry point transports call. It
//! resolves callers through an [`IdentityResolver`], throttles anonymous
//! shared reads with an [`AnonymousReadLimiter`] and publishes an
//! [`coshare_types::AccessEvent`] for each successful operation through a
//! non-blocking [`AccessEventSink`].

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

mod error;
pub mod events;
pub mod identity;
pub mod limiter;
mod service;

pub use error::{ServiceError, ServiceResult};
pub use events::{
    spawn_event_consumer, AccessEventHandler, AccessEventSink, ChannelEventSink,
    EventConsumerHandle, NoopEventSink, TracingEventHandler, DEFAULT_EVENT_CAPACITY,
};
pub use identity::{IdentityResolver, RequestMetadata, TrustedHeaderResolver, Unauthenticated};
pub use limiter::{AnonymousReadLimiter, LimiterConfig};
pub use service::CollectionService;
