//! Error types

pub mod types;

pub use types::{
    AuthError, AuthResult, UnavailableReason, CODE_AUTH_NOT_FOUND, CODE_AUTH_UNAVAILABLE,
};
