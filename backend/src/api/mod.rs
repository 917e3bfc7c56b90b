//! API handlers.

pub mod endpoints;
pub mod hooks;
pub mod version;
