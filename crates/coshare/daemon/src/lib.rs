//! Coshare daemon library
//!
//! This module provides the core components for the coshare daemon:
//! - REST API handlers
//! - Layered configuration
//! - Server lifecycle management

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod api;
pub mod config;
pub mod error;
pub mod server;

pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError};
pub use server::Server;
