//! Weighted random selection

use super::{candidate_bucket, log_selected, PickOptions, Selector};
use crate::auth::strategy::RoutingStrategy;
use crate::auth::types::Auth;
use crate::error::{AuthError, AuthResult, UnavailableReason};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Weighted random selection over the top bucket
///
/// Each credential owns a contiguous range of `[0, total)` sized by its
/// resolved weight, laid out in ID order; one uniform draw picks the range.
/// A single generator is shared by all callers and never reseeded.
#[derive(Debug)]
pub struct WeightedSelector {
    rng: Mutex<StdRng>,
}

impl Default for WeightedSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl WeightedSelector {
    /// Selector seeded from the OS entropy source
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Selector with a reproducible draw sequence
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// Uniform draw in `[0, total)`; `total` must be positive
    fn draw(&self, total: i64) -> i64 {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        rng.gen_range(0..total)
    }
}

/// Sum of positive weights, or `None` on overflow
fn total_weight(weights: &[i64]) -> Option<i64> {
    weights
        .iter()
        .filter(|weight| **weight > 0)
        .try_fold(0i64, |total, weight| total.checked_add(*weight))
}

impl Selector for WeightedSelector {
    fn strategy(&self) -> RoutingStrategy {
        RoutingStrategy::Weighted
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
        let weights: Vec<i64> = bucket.iter().map(|auth| auth.weight()).collect();

        let declined = |reason: UnavailableReason| {
            tracing::debug!(
                strategy = %self.strategy(),
                provider = %provider,
                model = %model,
                candidates = bucket.len(),
                reason = %reason,
                "No credential available"
            );
            AuthError::unavailable(provider, model, reason)
        };

        let total = match total_weight(&weights) {
            None => return Err(declined(UnavailableReason::WeightOverflow)),
            Some(total) if total <= 0 => return Err(declined(UnavailableReason::ZeroWeight)),
            Some(total) => total,
        };

        let mut target = self.draw(total);
        for (auth, weight) in bucket.iter().zip(weights) {
            if weight <= 0 {
                continue;
            }
            if target < weight {
                let selected = Arc::clone(auth);
                log_selected(self.strategy(), provider, model, &selected);
                return Ok(selected);
            }
            target -= weight;
        }

        // The draw is below the total, so a range always matches
        Err(declined(UnavailableReason::ZeroWeight))
    }
}

// ============================================================================
// Tests
// ============================================================================
