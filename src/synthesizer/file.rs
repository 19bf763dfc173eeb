//! File-based credential loading
//!
//! Reads one JSON credential per file from an auth directory and turns each
//! into an `Auth`. Multi-project credentials are expanded into virtual
//! credentials. Bad files are skipped, never fatal.

use super::virtual_auth::{synthesize_virtual_auths, MULTI_PROJECT_PROVIDER};
use crate::auth::{Auth, AuthStatus, ATTR_PATH, ATTR_PRIORITY, ATTR_SOURCE, ATTR_WEIGHT, DEFAULT_WEIGHT};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Inputs for one synthesis pass
#[derive(Debug, Clone)]
pub struct SynthesisContext {
    pub auth_dir: PathBuf,
    /// Timestamp stamped on every produced record
    pub now: DateTime<Utc>,
}

impl SynthesisContext {
    pub fn new(auth_dir: impl Into<PathBuf>) -> Self {
        Self {
            auth_dir: auth_dir.into(),
            now: Utc::now(),
        }
    }
}

/// Builds credentials from the JSON files of an auth directory
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSynthesizer;

impl FileSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Load every `*.json` credential directly under `ctx.auth_dir`
    ///
    /// A missing directory yields no credentials. Files are visited in name
    /// order so the output is stable.
    pub fn synthesize(&self, ctx: &SynthesisContext) -> Vec<Auth> {
        let entries = match fs::read_dir(&ctx.auth_dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::debug!(
                    auth_dir = %ctx.auth_dir.display(),
                    error = %err,
                    "Auth directory not readable"
                );
                return Vec::new();
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .filter(|path| is_json_file(path))
            .collect();
        files.sort();

        let mut out = Vec::with_capacity(files.len());
        for path in files {
            let Some(metadata) = read_metadata(&path) else {
                continue;
            };
            let Some(mut auth) = auth_from_metadata(&ctx.auth_dir, &path, metadata, ctx.now) else {
                continue;
            };

            if auth.provider == MULTI_PROJECT_PROVIDER {
                let metadata = auth.metadata.clone();
                let virtuals = synthesize_virtual_auths(&mut auth, &metadata);
                if !virtuals.is_empty() {
                    tracing::info!(
                        credential = %auth.id,
                        virtuals = virtuals.len(),
                        "Split multi-project credential"
                    );
                    out.push(auth);
                    out.extend(virtuals);
                    continue;
                }
            }
            out.push(auth);
        }

        tracing::debug!(
            auth_dir = %ctx.auth_dir.display(),
            credentials = out.len(),
            "Loaded credentials"
        );
        out
    }
}

fn is_json_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase().ends_with(".json"))
        .unwrap_or(false)
}

/// Parse a credential file into a JSON object; `None` for anything unusable
fn read_metadata(path: &Path) -> Option<Map<String, Value>> {
    let data = match fs::read(path) {
        Ok(data) if !data.is_empty() => data,
        Ok(_) => return None,
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "Skipping unreadable auth file");
            return None;
        }
    };
    match serde_json::from_slice::<Value>(&data) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "Skipping malformed auth file");
            None
        }
    }
}

/// Build the physical credential for one parsed file
fn auth_from_metadata(
    auth_dir: &Path,
    path: &Path,
    metadata: Map<String, Value>,
    now: DateTime<Utc>,
) -> Option<Auth> {
    let kind = metadata.get("type").and_then(Value::as_str).unwrap_or_default();
    if kind.is_empty() {
        return None;
    }
    let mut provider = kind.to_lowercase();
    if provider == "gemini" {
        provider = MULTI_PROJECT_PROVIDER.to_string();
    }

    let label = match metadata.get("email").and_then(Value::as_str) {
        Some(email) if !email.is_empty() => email.to_string(),
        _ => provider.clone(),
    };

    // Relative to the auth dir, matching the file-backed token store
    let id = path
        .strip_prefix(auth_dir)
        .ok()
        .map(|rel| rel.to_string_lossy().to_string())
        .filter(|rel| !rel.is_empty())
        .unwrap_or_else(|| path.to_string_lossy().to_string());
    let full = path.to_string_lossy().to_string();

    let proxy_url = metadata
        .get("proxy_url")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let prefix = metadata
        .get("prefix")
        .and_then(Value::as_str)
        .map(normalize_prefix)
        .unwrap_or_default();

    let disabled = metadata
        .get("disabled")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let mut attributes = HashMap::from([
        (ATTR_SOURCE.to_string(), full.clone()),
        (ATTR_PATH.to_string(), full.clone()),
    ]);

    if let Some(raw) = metadata.get("priority") {
        match read_metadata_int(raw) {
            Some(priority) => {
                attributes.insert(ATTR_PRIORITY.to_string(), priority.to_string());
            }
            None => tracing::warn!(path = %full, "auth metadata priority invalid"),
        }
    }

    let mut weight = DEFAULT_WEIGHT;
    if let Some(raw) = metadata.get("weight") {
        match read_metadata_int(raw) {
            Some(value) => weight = value,
            None => tracing::warn!(path = %full, "auth metadata weight invalid"),
        }
    }
    if weight < 0 {
        tracing::warn!(path = %full, weight = weight, "auth weight < 0");
    }
    attributes.insert(ATTR_WEIGHT.to_string(), weight.to_string());

    Some(Auth {
        id,
        provider,
        label,
        prefix,
        status: if disabled {
            AuthStatus::Disabled
        } else {
            AuthStatus::Active
        },
        disabled,
        proxy_url,
        attributes,
        metadata,
        model_states: HashMap::new(),
        runtime: None,
        created_at: Some(now),
        updated_at: Some(now),
    })
}

/// A single path segment, or empty
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() || trimmed.contains('/') {
        return String::new();
    }
    trimmed.to_string()
}

/// Integer from a JSON number or numeric string
///
/// Floats must be integral and in range; strings must parse as base-10.
pub fn read_metadata_int(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(number) => {
            if let Some(value) = number.as_i64() {
                return Some(value);
            }
            let value = number.as_f64()?;
            // i64::MAX as f64 rounds up to 2^63, which is out of range
            if !value.is_finite()
                || value.trunc() != value
                || value < i64::MIN as f64
                || value >= i64::MAX as f64
            {
                return None;
            }
            Some(value as i64)
        }
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<i64>().ok()
        }
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
