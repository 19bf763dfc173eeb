//! Credential routing core for an LLM API gateway

// Public modules
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod synthesizer;

// Re-export commonly used types
pub use auth::{Auth, AuthRegistry, RoutingStrategy, Selector};
pub use config::Settings;
pub use error::AuthError;
