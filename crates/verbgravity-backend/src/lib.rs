//! verbgravity-backend: collaborator implementations.
//!
//! Implements the passage-analysis, session, and progress traits from
//! `verbgravity-core` over the REST API, plus an in-memory backend and
//! configuration loading.

pub mod config;
pub mod http;
pub mod mock;

pub use config::{load_config, load_config_from, VerbGravityConfig};
pub use http::HttpBackend;
pub use mock::InMemoryBackend;
pub use verbgravity_core::error::BackendError;
