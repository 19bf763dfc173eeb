//! Round-robin selection
//!
//! Cycles through the top priority bucket with one atomic cursor per
//! provider/model pair.

use super::{candidate_bucket, log_selected, PickOptions, Selector};
use crate::auth::strategy::RoutingStrategy;
use crate::auth::types::Auth;
use crate::error::AuthResult;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Cursor
// ============================================================================

/// Cycling position for one provider/model key
#[derive(Debug, Default)]
struct Cursor {
    counter: AtomicUsize,
}

impl Cursor {
    /// Advance once and return the index into a bucket of `total` entries
    ///
    /// The position is reinterpreted modulo the current bucket size, so a
    /// bucket that shrinks or grows between calls still wraps correctly.
    /// The counter wraps on overflow.
    fn next(&self, total: usize) -> usize {
        self.counter.fetch_add(1, Ordering::SeqCst) % total
    }

    fn position(&self) -> usize {
        self.counter.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Round-Robin Selector
// ============================================================================

/// Cycles through the top bucket in ID order
///
/// Each provider/model pair has its own cursor, created on first use.
#[derive(Debug, Default)]
pub struct RoundRobinSelector {
    cursors: DashMap<CursorKey, Cursor>,
}

/// `(provider, model)`; kept as a pair so IDs containing `:` never collide
type CursorKey = (String, String);

impl RoundRobinSelector {
    pub fn new() -> Self {
        Self {
            cursors: DashMap::new(),
        }
    }

    fn cursor_key(provider: &str, model: &str) -> CursorKey {
        (provider.to_string(), model.to_string())
    }

    fn next_index(&self, provider: &str, model: &str, total: usize) -> usize {
        let key = Self::cursor_key(provider, model);
        if let Some(cursor) = self.cursors.get(&key) {
            return cursor.next(total);
        }
        self.cursors.entry(key).or_default().next(total)
    }

    /// Number of picks served so far for a provider/model pair
    pub fn position(&self, provider: &str, model: &str) -> usize {
        self.cursors
            .get(&Self::cursor_key(provider, model))
            .map(|cursor| cursor.position())
            .unwrap_or(0)
    }

    /// Forget every cursor
    pub fn reset(&self) {
        self.cursors.clear();
    }
}

impl Selector for RoundRobinSelector {
    fn strategy(&self) -> RoutingStrategy {
        RoutingStrategy::RoundRobin
    }

    fn pick(
        &self,
        _cancel: &CancellationToken,
        provider: &str,
        model: &str,
        _options: &PickOptions,
        auths: &[Arc<Auth>],
    ) -> AuthResult<Arc<Auth>> {
        let bucket = candidate_bucket(self.strategy(), provider, model, auths)?;
        let index = self.next_index(provider, model, bucket.len());
        let selected = Arc::clone(&bucket[index]);
        log_selected(self.strategy(), provider, model, &selected);
        Ok(selected)
    }
}

// ============================================================================
// Tests
// ============================================================================
