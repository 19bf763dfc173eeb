//! Runtime session handles
//!
//! A multi-project credential is refreshed through one `SharedCredential`.
//! The disabled primary owns it; each virtual credential holds a weak handle
//! plus the project it is scheduled for, so the session is never duplicated.

use serde_json::{Map, Value};
use std::sync::{Arc, RwLock, Weak};

/// Refreshable session state shared by a primary and its virtual credentials
#[derive(Debug)]
pub struct SharedCredential {
    primary_id: String,
    email: String,
    project_ids: Vec<String>,
    /// Token payload; refreshers update it in place
    metadata: RwLock<Map<String, Value>>,
}

impl SharedCredential {
    pub fn new(
        primary_id: impl Into<String>,
        email: impl Into<String>,
        metadata: Map<String, Value>,
        project_ids: Vec<String>,
    ) -> Self {
        Self {
            primary_id: primary_id.into(),
            email: email.into(),
            project_ids,
            metadata: RwLock::new(metadata),
        }
    }

    pub fn primary_id(&self) -> &str {
        &self.primary_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn project_ids(&self) -> &[String] {
        &self.project_ids
    }

    /// Copy of the current session metadata
    pub fn metadata(&self) -> Map<String, Value> {
        match self.metadata.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Merge refreshed fields (e.g. a new access token) into the session
    pub fn merge_metadata(&self, fields: Map<String, Value>) {
        let mut guard = match self.metadata.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for (key, value) in fields {
            guard.insert(key, value);
        }
    }
}

/// Non-owning handle to a shared session, bound to one project
#[derive(Debug, Clone)]
pub struct VirtualCredential {
    project_id: String,
    shared: Weak<SharedCredential>,
}

impl VirtualCredential {
    pub fn new(project_id: impl Into<String>, shared: &Arc<SharedCredential>) -> Self {
        Self {
            project_id: project_id.into(),
            shared: Arc::downgrade(shared),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// The shared session, if its owner is still alive
    pub fn shared(&self) -> Option<Arc<SharedCredential>> {
        self.shared.upgrade()
    }
}

/// Runtime slot carried by an `Auth`
#[derive(Debug, Clone)]
pub enum AuthRuntime {
    /// Owned by the primary of a split credential
    Shared(Arc<SharedCredential>),
    Virtual(VirtualCredential),
}

impl AuthRuntime {
    /// The underlying shared session, whichever side of the split this is
    pub fn shared(&self) -> Option<Arc<SharedCredential>> {
        match self {
            Self::Shared(shared) => Some(Arc::clone(shared)),
            Self::Virtual(handle) => handle.shared(),
        }
    }

    pub fn project_id(&self) -> Option<&str> {
        match self {
            Self::Shared(_) => None,
            Self::Virtual(handle) => Some(handle.project_id()),
        }
    }
}
