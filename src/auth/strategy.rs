//! Routing strategies
//!
//! This module maps the configured routing strategy string onto one of the
//! three selectors.

use super::selector::{FillFirstSelector, RoundRobinSelector, Selector, WeightedSelector};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// Routing Strategy
// ============================================================================

/// Credential routing strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingStrategy {
    /// Weighted random selection (default)
    #[default]
    Weighted,
    /// Cycle through the top bucket per provider and model
    RoundRobin,
    /// Always the smallest ID of the top bucket
    FillFirst,
}

impl RoutingStrategy {
    /// Resolve a configured value (case-insensitive, trimmed)
    ///
    /// Returns the strategy and whether the input was recognized. Empty input
    /// is recognized and means weighted; anything unknown also resolves to
    /// weighted but reports `false` so the caller can log it.
    pub fn normalize_with_known(value: &str) -> (Self, bool) {
        let normalized = value.trim().to_lowercase();
        match normalized.as_str() {
            "" => (Self::Weighted, true),
            "fill-first" | "fillfirst" | "ff" => (Self::FillFirst, true),
            "round-robin" | "roundrobin" | "rr" => (Self::RoundRobin, true),
            "weighted" | "weight" => (Self::Weighted, true),
            _ => (Self::Weighted, false),
        }
    }

    /// Resolve a configured value, ignoring whether it was recognized
    pub fn normalize(value: &str) -> Self {
        Self::normalize_with_known(value).0
    }

    /// Canonical configuration name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weighted => "weighted",
            Self::RoundRobin => "round-robin",
            Self::FillFirst => "fill-first",
        }
    }

    /// Build a fresh selector for this strategy
    pub fn selector(&self) -> Arc<dyn Selector> {
        match self {
            Self::FillFirst => Arc::new(FillFirstSelector::new()),
            Self::RoundRobin => Arc::new(RoundRobinSelector::new()),
            Self::Weighted => Arc::new(WeightedSelector::new()),
        }
    }
}

impl std::fmt::Display for RoutingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the selector for a configured strategy string
pub fn selector_for(value: &str) -> Arc<dyn Selector> {
    RoutingStrategy::normalize(value).selector()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_defaults_to_weighted() {
        for input in ["", "   ", "unknown", "random"] {
            assert_eq!(RoutingStrategy::normalize(input), RoutingStrategy::Weighted);
        }
    }

    #[test]
    fn test_normalize_with_known() {
        let cases = [
            ("", RoutingStrategy::Weighted, true),
            ("   ", RoutingStrategy::Weighted, true),
            ("ff", RoutingStrategy::FillFirst, true),
            ("rr", RoutingStrategy::RoundRobin, true),
            ("weight", RoutingStrategy::Weighted, true),
            ("not-real", RoutingStrategy::Weighted, false),
        ];
        for (input, strategy, known) in cases {
            assert_eq!(
                RoutingStrategy::normalize_with_known(input),
                (strategy, known),
                "input {:?}",
                input
            );
        }
    }

    #[test]
    fn test_normalize_synonyms() {
        let cases = [
            (RoutingStrategy::FillFirst, vec!["fill-first", "fillfirst", "ff", " FF "]),
            (RoutingStrategy::RoundRobin, vec!["round-robin", "roundrobin", "rr", "Round-Robin"]),
            (RoutingStrategy::Weighted, vec!["weighted", "weight", "WEIGHTED"]),
        ];
        for (expected, inputs) in cases {
            for input in inputs {
                assert_eq!(RoutingStrategy::normalize(input), expected, "input {:?}", input);
            }
        }
    }

    #[test]
    fn test_selector_for() {
        assert_eq!(selector_for("fillfirst").strategy(), RoutingStrategy::FillFirst);
        assert_eq!(selector_for("rr").strategy(), RoutingStrategy::RoundRobin);
        assert_eq!(selector_for("weighted").strategy(), RoutingStrategy::Weighted);
        assert_eq!(selector_for("unknown").strategy(), RoutingStrategy::Weighted);
    }

    #[test]
    fn test_display_and_serde() {
        assert_eq!(RoutingStrategy::RoundRobin.to_string(), "round-robin");
        assert_eq!(
            serde_json::to_string(&RoutingStrategy::FillFirst).unwrap(),
            "\"fill-first\""
        );
        let parsed: RoutingStrategy = serde_json::from_str("\"round-robin\"").unwrap();
        assert_eq!(parsed, RoutingStrategy::RoundRobin);
    }
}
