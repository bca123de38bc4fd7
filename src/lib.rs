//! depot — a content-addressed OCI Distribution v2 container image registry.
//!
//! Images are stored as blobs and manifests in a deduplicated on-disk store;
//! clients push and pull them over the Distribution v2 HTTP API, reference
//! them by tag or by digest, list tags, and delete artifacts.
//!
//! The protocol layer is exposed as [`api::create_router`] so it can be
//! served by any tower-compatible server or driven directly in tests.

pub mod api;
pub mod config;
pub mod error;
pub mod features;
pub mod service;
pub mod state;
pub mod storage;
pub mod types;
pub mod utils;

pub use api::create_router;
pub use config::{Args, Config};
pub use state::AppState;
