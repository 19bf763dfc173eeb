//! Credential Registry
//!
//! This module provides `AuthRegistry`, which owns the credential set of a
//! process, routes picks to the configured selector, and is the reporting
//! path through which health changes are recorded.
//!
//! Records are never mutated in place: a health report swaps in an updated
//! copy, so a pick that already took its snapshot is unaffected.

use super::selector::{PickOptions, Selector};
use super::strategy::RoutingStrategy;
use super::types::{Auth, ModelState};
use crate::error::{AuthError, AuthResult};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio_util::sync::CancellationToken;

type ProviderMap = HashMap<String, Vec<Arc<Auth>>>;

// ============================================================================
// Auth Registry
// ============================================================================

/// Credentials grouped by provider, plus the active selector
#[derive(Debug)]
pub struct AuthRegistry {
    auths: RwLock<ProviderMap>,
    selector: RwLock<Arc<dyn Selector>>,
}

impl AuthRegistry {
    /// Create a registry using `strategy`
    pub fn new(auths: Vec<Auth>, strategy: RoutingStrategy) -> Self {
        Self::with_selector(auths, strategy.selector())
    }

    /// Create a registry with a pre-built selector
    pub fn with_selector(auths: Vec<Auth>, selector: Arc<dyn Selector>) -> Self {
        Self {
            auths: RwLock::new(group_by_provider(auths)),
            selector: RwLock::new(selector),
        }
    }

    /// Pick a credential for one request
    pub fn pick(
        &self,
        cancel: &CancellationToken,
        provider: &str,
        model: &str,
        options: &PickOptions,
    ) -> AuthResult<Arc<Auth>> {
        let candidates = self.auths_for(provider);
        let selector = Arc::clone(&*read(&self.selector));
        selector.pick(cancel, provider, model, options, &candidates)
    }

    /// Snapshot of a provider's credentials
    pub fn auths_for(&self, provider: &str) -> Vec<Arc<Auth>> {
        read(&self.auths).get(provider).cloned().unwrap_or_default()
    }

    /// Get a credential by ID
    pub fn get(&self, id: &str) -> Option<Arc<Auth>> {
        read(&self.auths)
            .values()
            .flatten()
            .find(|auth| auth.id == id)
            .cloned()
    }

    /// Rebuild from a fresh credential set
    ///
    /// Previous records, including virtual credentials and the shared
    /// sessions their primaries own, are dropped.
    pub fn replace_all(&self, auths: Vec<Auth>) {
        let grouped = group_by_provider(auths);
        let total: usize = grouped.values().map(Vec::len).sum();
        *write(&self.auths) = grouped;
        tracing::info!(credentials = total, "Credential registry rebuilt");
    }

    /// Switch routing strategy; a no-op when it is already active
    pub fn set_strategy(&self, strategy: RoutingStrategy) {
        let mut selector = write(&self.selector);
        if selector.strategy() == strategy {
            return;
        }
        tracing::info!(
            from = %selector.strategy(),
            to = %strategy,
            "Routing strategy changed"
        );
        *selector = strategy.selector();
    }

    pub fn strategy(&self) -> RoutingStrategy {
        read(&self.selector).strategy()
    }

    /// Record a cooldown for one model until `until`
    pub fn mark_model_cooldown(
        &self,
        id: &str,
        model: &str,
        until: DateTime<Utc>,
        quota_exceeded: bool,
    ) -> AuthResult<Arc<Auth>> {
        let updated = self.update(id, |auth| {
            auth.model_states
                .insert(model.to_string(), ModelState::cooldown(until, quota_exceeded));
        })?;
        tracing::warn!(
            credential = id,
            model = model,
            until = %until,
            quota_exceeded = quota_exceeded,
            "Credential cooling down for model"
        );
        Ok(updated)
    }

    /// Clear the health state recorded for one model
    pub fn mark_model_recovered(&self, id: &str, model: &str) -> AuthResult<Arc<Auth>> {
        let updated = self.update(id, |auth| {
            auth.model_states.remove(model);
        })?;
        tracing::info!(credential = id, model = model, "Credential recovered for model");
        Ok(updated)
    }

    /// Globally enable or disable a credential
    pub fn set_disabled(&self, id: &str, disabled: bool) -> AuthResult<Arc<Auth>> {
        let updated = self.update(id, |auth| {
            if disabled {
                auth.disable();
            } else {
                auth.enable();
            }
        })?;
        if disabled {
            tracing::warn!(credential = id, "Credential disabled");
        } else {
            tracing::info!(credential = id, "Credential enabled");
        }
        Ok(updated)
    }

    /// Get the number of credentials
    pub fn len(&self) -> usize {
        read(&self.auths).values().map(Vec::len).sum()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get registry statistics
    pub fn stats(&self) -> RegistryStats {
        let auths = read(&self.auths);
        let all = || auths.values().flatten();
        RegistryStats {
            total: all().count(),
            disabled: all().filter(|auth| auth.is_disabled()).count(),
            virtual_count: all().filter(|auth| auth.is_virtual()).count(),
            providers: auths.len(),
            strategy: self.strategy(),
        }
    }

    /// Replace one record with an updated copy
    fn update(&self, id: &str, apply: impl FnOnce(&mut Auth)) -> AuthResult<Arc<Auth>> {
        let mut auths = write(&self.auths);
        let slot = auths
            .values_mut()
            .flatten()
            .find(|auth| auth.id == id)
            .ok_or_else(|| AuthError::NotFound(id.to_string()))?;

        let mut next = (**slot).clone();
        apply(&mut next);
        next.updated_at = Some(Utc::now());
        let next = Arc::new(next);
        *slot = Arc::clone(&next);
        Ok(next)
    }
}

fn group_by_provider(auths: Vec<Auth>) -> ProviderMap {
    let mut grouped = ProviderMap::new();
    for auth in auths {
        grouped
            .entry(auth.provider.clone())
            .or_default()
            .push(Arc::new(auth));
    }
    grouped
}

fn read<T: ?Sized>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T: ?Sized>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// Registry Statistics
// ============================================================================

/// Statistics about a credential registry
#[derive(Debug, Clone)]
pub struct RegistryStats {
    /// Total number of credentials, primaries and virtuals included
    pub total: usize,
    /// Number of globally disabled credentials
    pub disabled: usize,
    /// Number of virtual credentials
    pub virtual_count: usize,
    /// Number of distinct providers
    pub providers: usize,
    /// Active routing strategy
    pub strategy: RoutingStrategy,
}

impl RegistryStats {
    /// At least one credential is enabled
    pub fn is_healthy(&self) -> bool {
        self.total > self.disabled
    }
}

// ============================================================================
// Tests
// ============================================================================
