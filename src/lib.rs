//! # recipebox
//!
//! Session & recipe client for the recipe demo services.
//!
//! A user logs in against the user service, the returned bearer token is
//! mirrored into durable storage, and recipes are created and listed against
//! the catalog service with that token.
//!
//! SYSTEM CONTEXT
//! ==============
//! `client` owns the operations and renders their status text, `session`
//! holds the active token, `storage` persists it, `net` talks HTTP, and
//! `bench` drives the catalog service under concurrent load. The binary in
//! `main.rs` is a thin command-line front end over `client`.

#[cfg(not(target_arch = "wasm32"))]
pub mod bench;
pub mod client;
pub mod config;
pub mod net;
pub mod session;
pub mod storage;

pub use client::{ClientError, RecipeClient};
pub use config::ClientConfig;
pub use net::api::{HttpBackend, RecipeBackend};
pub use session::{Session, SessionView};
pub use storage::{FileTokenStore, MemoryTokenStore, TokenStore};
