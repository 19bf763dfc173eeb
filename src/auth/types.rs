//! Credential record types
//!
//! This module defines the `Auth` record (one selectable credential, physical
//! or virtual) together with its per-model health state.

use super::runtime::AuthRuntime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

// ============================================================================
// Attribute Keys
// ============================================================================

/// Selection priority; higher buckets win
pub const ATTR_PRIORITY: &str = "priority";
/// Weighted-selection share
pub const ATTR_WEIGHT: &str = "weight";
/// File the credential was loaded from
pub const ATTR_SOURCE: &str = "source";
pub const ATTR_PATH: &str = "path";
/// Set on a primary that has been split into virtual credentials
pub const ATTR_VIRTUAL_PRIMARY: &str = "virtual_primary";
pub const ATTR_VIRTUAL_CHILDREN: &str = "virtual_children";
/// Set on virtual credentials
pub const ATTR_VIRTUAL_PARENT: &str = "virtual_parent";
pub const ATTR_VIRTUAL_PROJECT: &str = "virtual_project";
pub const ATTR_RUNTIME_ONLY: &str = "runtime_only";

/// Weight used when a credential carries no weight attribute
pub const DEFAULT_WEIGHT: i64 = 1;
/// Priority used when a credential carries no (or an unparsable) priority
pub const DEFAULT_PRIORITY: i64 = 0;

// ============================================================================
// Status
// ============================================================================

/// Lifecycle status of a credential, or of a credential for one model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    #[default]
    Active,
    Pending,
    Refreshing,
    Error,
    Disabled,
}

impl std::fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Pending => write!(f, "pending"),
            Self::Refreshing => write!(f, "refreshing"),
            Self::Error => write!(f, "error"),
            Self::Disabled => write!(f, "disabled"),
        }
    }
}

// ============================================================================
// Model State
// ============================================================================

/// Quota bookkeeping reported by the upstream for one model
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuotaState {
    pub exceeded: bool,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub next_recover_at: Option<DateTime<Utc>>,
}

/// Health of one credential for one model
///
/// A missing entry in `Auth::model_states` means no known restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModelState {
    pub status: AuthStatus,
    pub unavailable: bool,
    /// End of the cooldown window; `None` means no window was recorded
    #[serde(default)]
    pub next_retry_after: Option<DateTime<Utc>>,
    #[serde(default)]
    pub quota: QuotaState,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ModelState {
    /// Cooldown entry until `until`, optionally flagged as a quota hit
    pub fn cooldown(until: DateTime<Utc>, quota_exceeded: bool) -> Self {
        Self {
            status: AuthStatus::Error,
            unavailable: true,
            next_retry_after: Some(until),
            quota: QuotaState {
                exceeded: quota_exceeded,
                reason: if quota_exceeded { "quota".to_string() } else { String::new() },
                next_recover_at: quota_exceeded.then_some(until),
            },
            updated_at: Some(Utc::now()),
        }
    }

    /// Whether this state keeps the credential out of rotation at `now`
    ///
    /// Stale flags are ignored once `next_retry_after` has elapsed.
    pub fn is_blocking(&self, now: DateTime<Utc>) -> bool {
        if self.status == AuthStatus::Disabled {
            return true;
        }
        if !self.unavailable && !self.quota.exceeded {
            return false;
        }
        match self.next_retry_after {
            Some(retry_after) => now < retry_after,
            None => false,
        }
    }
}

// ============================================================================
// Auth
// ============================================================================

/// One selectable credential
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Auth {
    /// Unique within a registry; the tie-break and cycling key
    pub id: String,
    pub provider: String,
    pub label: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub status: AuthStatus,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub proxy_url: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub model_states: HashMap<String, ModelState>,
    /// Shared or virtual session handle; opaque to selection
    #[serde(skip)]
    pub runtime: Option<AuthRuntime>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Auth {
    /// Create an active credential with no attributes
    pub fn new(id: impl Into<String>, provider: impl Into<String>) -> Self {
        let provider = provider.into();
        Self {
            id: id.into(),
            label: provider.clone(),
            provider,
            ..Default::default()
        }
    }

    /// Set an attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Set the health state for one model
    pub fn with_model_state(mut self, model: impl Into<String>, state: ModelState) -> Self {
        self.model_states.insert(model.into(), state);
        self
    }

    /// Mark the credential disabled
    pub fn disabled(mut self) -> Self {
        self.disable();
        self
    }

    pub fn disable(&mut self) {
        self.disabled = true;
        self.status = AuthStatus::Disabled;
    }

    pub fn enable(&mut self) {
        self.disabled = false;
        self.status = AuthStatus::Active;
    }

    /// Globally disabled, either by flag or by status
    pub fn is_disabled(&self) -> bool {
        self.disabled || self.status == AuthStatus::Disabled
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Resolved priority: the `priority` attribute, or 0 when absent or malformed
    pub fn priority(&self) -> i64 {
        self.attribute(ATTR_PRIORITY)
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(DEFAULT_PRIORITY)
    }

    /// Resolved weight: 1 when absent, 0 when malformed or negative
    pub fn weight(&self) -> i64 {
        match self.attribute(ATTR_WEIGHT) {
            None => DEFAULT_WEIGHT,
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(weight) if weight >= 0 => weight,
                _ => 0,
            },
        }
    }

    /// Whether the credential is out of rotation for `model` at `now`
    pub fn is_blocked_for_model(&self, model: &str, now: DateTime<Utc>) -> bool {
        if self.is_disabled() {
            return true;
        }
        if model.is_empty() {
            return false;
        }
        self.model_states
            .get(model)
            .is_some_and(|state| state.is_blocking(now))
    }

    /// Synthesized from a multi-project primary
    pub fn is_virtual(&self) -> bool {
        self.attributes.contains_key(ATTR_VIRTUAL_PARENT)
    }

    /// ID of the primary this virtual credential was split from
    pub fn virtual_parent(&self) -> Option<&str> {
        self.attribute(ATTR_VIRTUAL_PARENT)
    }
}

// ============================================================================
// Tests
// ============================================================================
