//! Shared types for the onair stream endpoint service.
//!
//! This crate contains the domain model and API types shared between the
//! backend and any client tooling.

/// Default port for the onair backend server.
pub const DEFAULT_PORT: u16 = 8080;

pub mod api;
pub mod endpoint;

// Re-export commonly used types
pub use endpoint::{
    normalize_password, EndpointId, NewStreamEndpoint, StreamEndpoint, UpdateStreamEndpoint,
};
