//! Fill-first selection
//!
//! Stateless: always the first credential of the sorted top bucket.

use super::{candidate_bucket, log_selected, PickOptions, Selector};
use crate::auth::strategy::RoutingStrategy;
use crate::auth::types::Auth;
use crate::error::AuthResult;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Always the lexicographically smallest ID of the top bucket
///
/// Keeps using one credential until it becomes unavailable, then fails over
/// in a stable order. Stateless.
#[derive(Debug, Default, Clone, Copy)]
pub struct FillFirstSelector;

impl FillFirstSelector {
    pub fn new() -> Self {
        Self
    }
}

impl Selector for FillFirstSelector {
    fn strategy(&self) -> RoutingStrategy {
        RoutingStrategy::FillFirst
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
        // Buckets are sorted by ID and never empty
        let selected = Arc::clone(&bucket[0]);
        log_selected(self.strategy(), provider, model, &selected);
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{auths, pick};
    use super::*;

    #[test]
    fn test_pick_deterministic() {
        let selector = FillFirstSelector::new();
        let candidates = auths(&["b", "a", "c"]);
        for _ in 0..5 {
            let got = pick(&selector, "gemini", "", &candidates).unwrap();
            assert_eq!(got.id, "a");
        }
    }

    #[test]
    fn test_pick_respects_priority() {
        let selector = FillFirstSelector::new();
        let candidates = vec![
            Arc::new(Auth::new("a", "gemini")),
            Arc::new(Auth::new("z", "gemini").with_attribute("priority", "5")),
            Arc::new(Auth::new("y", "gemini").with_attribute("priority", "5")),
        ];
        let got = pick(&selector, "gemini", "", &candidates).unwrap();
        assert_eq!(got.id, "y");
    }
}
