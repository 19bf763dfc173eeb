//! Credential synthesis
//!
//! Turns credential files into `Auth` records, splitting multi-project
//! credentials into independently scheduled virtual credentials.

mod file;
mod virtual_auth;

pub use file::{read_metadata_int, FileSynthesizer, SynthesisContext};
pub use virtual_auth::{
    build_virtual_id, split_project_ids, synthesize_virtual_auths, MULTI_PROJECT_PROVIDER,
};
