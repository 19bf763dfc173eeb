//! Credential selectors
//!
//! A selector picks exactly one credential for a request. All selectors share
//! the availability filter and priority bucketing in `auth::availability`
//! and differ only in how they break the tie inside the top bucket.

mod fill_first;
mod round_robin;
mod weighted;

pub use fill_first::FillFirstSelector;
pub use round_robin::RoundRobinSelector;
pub use weighted::WeightedSelector;

use super::availability::available_auths;
use super::strategy::RoutingStrategy;
use super::types::Auth;
use crate::error::AuthResult;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Per-request options passed through by the dispatcher
///
/// Selectors do not interpret these.
#[derive(Debug, Clone, Default)]
pub struct PickOptions {
    pub metadata: HashMap<String, Value>,
}

/// Picks one credential from a provider's candidates
pub trait Selector: Send + Sync + std::fmt::Debug {
    /// The strategy this selector implements
    fn strategy(&self) -> RoutingStrategy;

    /// Select a credential for `provider` / `model`
    ///
    /// `cancel` is accepted for the dispatcher's benefit; selection never
    /// blocks, so it is not polled. Fails with `auth_unavailable` when no
    /// candidate is eligible.
    fn pick(
        &self,
        cancel: &CancellationToken,
        provider: &str,
        model: &str,
        options: &PickOptions,
        auths: &[Arc<Auth>],
    ) -> AuthResult<Arc<Auth>>;
}

/// Filter and bucket the candidates as of now, logging a decline
fn candidate_bucket(
    strategy: RoutingStrategy,
    provider: &str,
    model: &str,
    auths: &[Arc<Auth>],
) -> AuthResult<Vec<Arc<Auth>>> {
    available_auths(provider, model, auths, Utc::now()).map_err(|err| {
        tracing::debug!(
            strategy = %strategy,
            provider = %provider,
            model = %model,
            candidates = auths.len(),
            error = %err,
            "No credential available"
        );
        err
    })
}

fn log_selected(strategy: RoutingStrategy, provider: &str, model: &str, auth: &Auth) {
    tracing::debug!(
        strategy = %strategy,
        provider = %provider,
        model = %model,
        credential = %auth.id,
        "Selected credential"
    );
}
