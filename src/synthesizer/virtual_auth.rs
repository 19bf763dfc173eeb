//! Virtual credential synthesis
//!
//! A credential whose `project_id` lists several projects is split into one
//! virtual credential per project. The primary stays in the registry for
//! bookkeeping but is disabled; the virtuals are scheduled independently and
//! refresh through one `SharedCredential` owned by the primary.

use crate::auth::{
    Auth, AuthRuntime, AuthStatus, SharedCredential, VirtualCredential, ATTR_PATH,
    ATTR_RUNTIME_ONLY, ATTR_SOURCE, ATTR_VIRTUAL_CHILDREN, ATTR_VIRTUAL_PARENT,
    ATTR_VIRTUAL_PRIMARY, ATTR_VIRTUAL_PROJECT,
};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Provider whose credentials may span several projects
pub const MULTI_PROJECT_PROVIDER: &str = "gemini-cli";

/// Metadata overrides copied onto each virtual, as (canonical, alternate) spellings
const OVERRIDE_KEYS: [(&str, &str); 2] = [
    ("disable_cooling", "disable-cooling"),
    ("request_retry", "request-retry"),
];

/// Split `primary` into per-project virtual credentials
///
/// Returns no virtuals, and leaves the primary untouched, when fewer than two
/// distinct projects are listed. Otherwise the primary is disabled and given
/// the shared session.
pub fn synthesize_virtual_auths(primary: &mut Auth, metadata: &Map<String, Value>) -> Vec<Auth> {
    let projects = split_project_ids(metadata);
    if projects.len() <= 1 {
        return Vec::new();
    }

    let email = metadata
        .get("email")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let shared = Arc::new(SharedCredential::new(
        primary.id.clone(),
        email.clone(),
        metadata.clone(),
        projects.clone(),
    ));

    primary.disable();
    primary.runtime = Some(AuthRuntime::Shared(Arc::clone(&shared)));
    primary
        .attributes
        .insert(ATTR_VIRTUAL_PRIMARY.to_string(), "true".to_string());
    primary
        .attributes
        .insert(ATTR_VIRTUAL_CHILDREN.to_string(), projects.join(","));

    let source = primary.attribute(ATTR_SOURCE).unwrap_or_default();
    let path = primary.attribute(ATTR_PATH).unwrap_or_default();
    let provider = if primary.provider.is_empty() {
        MULTI_PROJECT_PROVIDER
    } else {
        primary.provider.as_str()
    };
    let label = if primary.label.is_empty() {
        provider
    } else {
        primary.label.as_str()
    };
    let proxy_url = primary.proxy_url.trim();

    projects
        .iter()
        .map(|project_id| {
            let mut attributes = HashMap::from([
                (ATTR_RUNTIME_ONLY.to_string(), "true".to_string()),
                (ATTR_VIRTUAL_PARENT.to_string(), primary.id.clone()),
                (ATTR_VIRTUAL_PROJECT.to_string(), project_id.clone()),
            ]);
            if !source.is_empty() {
                attributes.insert(ATTR_SOURCE.to_string(), source.to_string());
            }
            if !path.is_empty() {
                attributes.insert(ATTR_PATH.to_string(), path.to_string());
            }

            let mut virtual_metadata = Map::new();
            virtual_metadata.insert("email".to_string(), Value::from(email.as_str()));
            virtual_metadata.insert("project_id".to_string(), Value::from(project_id.as_str()));
            virtual_metadata.insert("virtual".to_string(), Value::Bool(true));
            virtual_metadata.insert("virtual_parent_id".to_string(), Value::from(primary.id.as_str()));
            if let Some(kind) = metadata.get("type") {
                virtual_metadata.insert("type".to_string(), kind.clone());
            }
            for (canonical, alternate) in OVERRIDE_KEYS {
                if let Some(value) = metadata.get(canonical).or_else(|| metadata.get(alternate)) {
                    virtual_metadata.insert(canonical.to_string(), value.clone());
                }
            }
            if !proxy_url.is_empty() {
                virtual_metadata.insert("proxy_url".to_string(), Value::from(proxy_url));
            }

            Auth {
                id: build_virtual_id(&primary.id, project_id),
                provider: provider.to_string(),
                label: format!("{} [{}]", label, project_id),
                prefix: primary.prefix.clone(),
                status: AuthStatus::Active,
                disabled: false,
                proxy_url: primary.proxy_url.clone(),
                attributes,
                metadata: virtual_metadata,
                model_states: HashMap::new(),
                runtime: Some(AuthRuntime::Virtual(VirtualCredential::new(
                    project_id.as_str(),
                    &shared,
                ))),
                created_at: primary.created_at,
                updated_at: primary.updated_at,
            }
        })
        .collect()
}

/// Comma-separated `project_id` entries, trimmed and deduplicated in order
pub fn split_project_ids(metadata: &Map<String, Value>) -> Vec<String> {
    let raw = metadata
        .get("project_id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim();
    if raw.is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

/// Deterministic virtual ID: `<base>::<project>` with path separators and
/// spaces in the project replaced by `_`
pub fn build_virtual_id(base_id: &str, project_id: &str) -> String {
    let project = match project_id.trim() {
        "" => "project",
        trimmed => trimmed,
    };
    let sanitized: String = project
        .chars()
        .map(|c| match c {
            '/' | '\\' | ' ' => '_',
            other => other,
        })
        .collect();
    format!("{}::{}", base_id, sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn metadata(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("metadata must be an object"),
        }
    }

    fn primary() -> Auth {
        let now = Utc::now();
        let mut auth = Auth::new("user.json", "gemini-cli")
            .with_attribute("source", "/auth/user.json")
            .with_attribute("path", "/auth/user.json");
        auth.label = "user@example.com".to_string();
        auth.prefix = "team".to_string();
        auth.proxy_url = " socks5://127.0.0.1:1080 ".to_string();
        auth.created_at = Some(now);
        auth.updated_at = Some(now);
        auth
    }

    #[test]
    fn test_split_deduplicates_in_order() {
        let meta = metadata(json!({"project_id": " p1, p1 ,p2,, p3 ,p2"}));
        assert_eq!(split_project_ids(&meta), vec!["p1", "p2", "p3"]);
        assert!(split_project_ids(&metadata(json!({"project_id": "  "}))).is_empty());
        assert!(split_project_ids(&metadata(json!({"project_id": 42}))).is_empty());
        assert!(split_project_ids(&metadata(json!({}))).is_empty());
    }

    #[test]
    fn test_build_virtual_id() {
        assert_eq!(build_virtual_id("user.json", "p1"), "user.json::p1");
        assert_eq!(build_virtual_id("user.json", "a/b\\c d"), "user.json::a_b_c_d");
        assert_eq!(build_virtual_id("user.json", "  "), "user.json::project");
        assert_eq!(
            build_virtual_id("user.json", "p1"),
            build_virtual_id("user.json", "p1")
        );
    }

    #[test]
    fn test_duplicate_projects_yield_two_virtuals() {
        let meta = metadata(json!({
            "type": "gemini",
            "email": "user@example.com",
            "project_id": "p1,p1,p2",
        }));
        let mut primary = primary();
        let virtuals = synthesize_virtual_auths(&mut primary, &meta);

        let ids: Vec<&str> = virtuals.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["user.json::p1", "user.json::p2"]);

        assert!(primary.is_disabled());
        assert_eq!(primary.status, AuthStatus::Disabled);
        assert_eq!(primary.attribute(ATTR_VIRTUAL_PRIMARY), Some("true"));
        assert_eq!(primary.attribute(ATTR_VIRTUAL_CHILDREN), Some("p1,p2"));
        assert!(matches!(primary.runtime, Some(AuthRuntime::Shared(_))));
    }

    #[test]
    fn test_virtual_fields() {
        let meta = metadata(json!({
            "type": "gemini",
            "email": "user@example.com",
            "project_id": "p1,p2",
        }));
        let mut primary = primary();
        let virtuals = synthesize_virtual_auths(&mut primary, &meta);
        let first = &virtuals[0];

        assert_eq!(first.provider, "gemini-cli");
        assert_eq!(first.label, "user@example.com [p1]");
        assert_eq!(first.prefix, "team");
        assert_eq!(first.proxy_url, primary.proxy_url);
        assert!(!first.is_disabled());
        assert!(first.is_virtual());
        assert_eq!(first.virtual_parent(), Some("user.json"));
        assert_eq!(first.attribute(ATTR_VIRTUAL_PROJECT), Some("p1"));
        assert_eq!(first.attribute(ATTR_RUNTIME_ONLY), Some("true"));
        assert_eq!(first.attribute(ATTR_SOURCE), Some("/auth/user.json"));
        assert_eq!(first.created_at, primary.created_at);

        assert_eq!(first.metadata["project_id"], json!("p1"));
        assert_eq!(first.metadata["virtual"], json!(true));
        assert_eq!(first.metadata["virtual_parent_id"], json!("user.json"));
        assert_eq!(first.metadata["type"], json!("gemini"));
        assert_eq!(first.metadata["proxy_url"], json!("socks5://127.0.0.1:1080"));
    }

    #[test]
    fn test_virtuals_share_primary_session() {
        let meta = metadata(json!({"email": "u@example.com", "project_id": "p1,p2"}));
        let mut primary = primary();
        let virtuals = synthesize_virtual_auths(&mut primary, &meta);

        let owner = primary.runtime.as_ref().and_then(AuthRuntime::shared).unwrap();
        for (virtual_auth, project) in virtuals.iter().zip(["p1", "p2"]) {
            let runtime = virtual_auth.runtime.as_ref().unwrap();
            assert_eq!(runtime.project_id(), Some(project));
            assert!(Arc::ptr_eq(&runtime.shared().unwrap(), &owner));
        }
        assert_eq!(owner.email(), "u@example.com");
    }

    #[test]
    fn test_single_project_is_not_split() {
        for project in ["p1", "p1, p1", "", " , "] {
            let meta = metadata(json!({"project_id": project}));
            let mut primary = primary();
            let virtuals = synthesize_virtual_auths(&mut primary, &meta);
            assert!(virtuals.is_empty(), "project {:?}", project);
            assert!(!primary.is_disabled());
            assert!(primary.runtime.is_none());
        }
    }

    #[test]
    fn test_override_keys_prefer_underscore() {
        let meta = metadata(json!({
            "project_id": "p1,p2",
            "disable_cooling": true,
            "disable-cooling": false,
            "request-retry": 5,
        }));
        let mut primary = primary();
        let virtuals = synthesize_virtual_auths(&mut primary, &meta);
        for virtual_auth in &virtuals {
            assert_eq!(virtual_auth.metadata["disable_cooling"], json!(true));
            assert_eq!(virtual_auth.metadata["request_retry"], json!(5));
            assert!(!virtual_auth.metadata.contains_key("request-retry"));
        }
    }

    #[test]
    fn test_virtual_ids_are_deterministic() {
        let meta = metadata(json!({"project_id": "alpha, beta/two"}));
        let first: Vec<String> = synthesize_virtual_auths(&mut primary(), &meta)
            .into_iter()
            .map(|v| v.id)
            .collect();
        let second: Vec<String> = synthesize_virtual_auths(&mut primary(), &meta)
            .into_iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(first, second);
        assert_eq!(first, vec!["user.json::alpha", "user.json::beta_two"]);
    }

    #[test]
    fn test_empty_provider_and_label_defaults() {
        let meta = metadata(json!({"project_id": "p1,p2"}));
        let mut primary = Auth::default();
        primary.id = "bare".to_string();
        let virtuals = synthesize_virtual_auths(&mut primary, &meta);
        assert_eq!(virtuals[0].provider, "gemini-cli");
        assert_eq!(virtuals[0].label, "gemini-cli [p1]");
        assert_eq!(virtuals[0].metadata["email"], json!(""));
        assert!(!virtuals[0].metadata.contains_key("proxy_url"));
    }
}
