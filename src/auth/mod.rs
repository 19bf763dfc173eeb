//! Credential Routing Module
//!
//! This module picks one upstream credential per request from the set
//! configured for a provider.
//!
//! # Features
//! - Per-model cooldowns and global disable filtering
//! - Strict priority buckets: lower priorities serve only when every higher
//!   one is unavailable
//! - Three strategies: fill-first, round-robin, weighted random
//! - Virtual credentials that share one session across several projects
//!
//! # Example
//! ```ignore
//! use credential_router::auth::{Auth, AuthRegistry, PickOptions, RoutingStrategy};
//! use tokio_util::sync::CancellationToken;
//!
//! let registry = AuthRegistry::new(
//!     vec![
//!         Auth::new("key-a", "gemini").with_attribute("priority", "10"),
//!         Auth::new("key-b", "gemini"),
//!     ],
//!     RoutingStrategy::RoundRobin,
//! );
//!
//! let auth = registry.pick(&CancellationToken::new(), "gemini", "gemini-2.5-pro", &PickOptions::default())?;
//! println!("Using credential: {}", auth.id);
//! ```

mod availability;
mod registry;
mod runtime;
mod selector;
mod strategy;
mod types;

pub use availability::{available_auths, filter_available, top_priority_bucket};
pub use registry::{AuthRegistry, RegistryStats};
pub use runtime::{AuthRuntime, SharedCredential, VirtualCredential};
pub use selector::{FillFirstSelector, PickOptions, RoundRobinSelector, Selector, WeightedSelector};
pub use strategy::{selector_for, RoutingStrategy};
pub use types::{
    Auth, AuthStatus, ModelState, QuotaState, ATTR_PATH, ATTR_PRIORITY, ATTR_RUNTIME_ONLY,
    ATTR_SOURCE, ATTR_VIRTUAL_CHILDREN, ATTR_VIRTUAL_PARENT, ATTR_VIRTUAL_PRIMARY,
    ATTR_VIRTUAL_PROJECT, ATTR_WEIGHT, DEFAULT_PRIORITY, DEFAULT_WEIGHT,
};
