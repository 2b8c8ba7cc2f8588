//! API request handlers

mod collections;
mod system;
mod tokens;

pub use collections::*;
pub use system::*;
pub use tokens::*;
