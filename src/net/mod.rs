//! Networking modules for the user and catalog REST services.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` defines the backend seam and its HTTP implementation, and `types`
//! defines the wire schema shared with both services.

pub mod api;
pub mod types;
