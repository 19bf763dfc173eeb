//! Availability filtering and priority bucketing
//!
//! Every selector runs the same two steps before its own tie-break: drop
//! credentials that are disabled or cooling down for the requested model,
//! then keep only the highest-priority group, sorted by ID.

use super::types::{Auth, AuthStatus};
use crate::error::{AuthError, AuthResult, UnavailableReason};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Credentials usable for `model` at `now`, in input order
pub fn filter_available(auths: &[Arc<Auth>], model: &str, now: DateTime<Utc>) -> Vec<Arc<Auth>> {
    auths
        .iter()
        .filter(|auth| !auth.is_blocked_for_model(model, now))
        .cloned()
        .collect()
}

/// The highest non-empty priority group, sorted ascending by ID
///
/// Priorities are resolved once per credential here.
pub fn top_priority_bucket(available: Vec<Arc<Auth>>) -> Vec<Arc<Auth>> {
    let prioritized: Vec<(i64, Arc<Auth>)> = available
        .into_iter()
        .map(|auth| (auth.priority(), auth))
        .collect();

    let Some(best) = prioritized.iter().map(|(priority, _)| *priority).max() else {
        return Vec::new();
    };

    let mut bucket: Vec<Arc<Auth>> = prioritized
        .into_iter()
        .filter(|(priority, _)| *priority == best)
        .map(|(_, auth)| auth)
        .collect();
    bucket.sort_by(|a, b| a.id.cmp(&b.id));
    bucket
}

/// Filter then bucket, declining with `auth_unavailable` when nothing is left
pub fn available_auths(
    provider: &str,
    model: &str,
    auths: &[Arc<Auth>],
    now: DateTime<Utc>,
) -> AuthResult<Vec<Arc<Auth>>> {
    if auths.is_empty() {
        return Err(AuthError::unavailable(
            provider,
            model,
            UnavailableReason::NoCandidates,
        ));
    }

    let available = filter_available(auths, model, now);
    if available.is_empty() {
        return Err(AuthError::Unavailable {
            provider: provider.to_string(),
            model: model.to_string(),
            reason: UnavailableReason::AllBlocked,
            retry_after: earliest_retry(auths, model, now),
        });
    }

    Ok(top_priority_bucket(available))
}

/// Earliest future cooldown end among enabled credentials
///
/// Disabled model states block with no time limit and give no hint.
fn earliest_retry(auths: &[Arc<Auth>], model: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    auths
        .iter()
        .filter(|auth| !auth.is_disabled())
        .filter_map(|auth| auth.model_states.get(model))
        .filter(|state| state.status != AuthStatus::Disabled)
        .filter_map(|state| state.next_retry_after)
        .filter(|retry_after| *retry_after > now)
        .min()
}
