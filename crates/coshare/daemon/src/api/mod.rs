//! API surface of the daemon

pub mod rest;

pub use rest::create_router;
