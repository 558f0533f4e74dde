//! # dpm_core
//!
//! Core domain logic for the DDS Permissions Manager (DPM) client: the session
//! context, the group-context selector, entity models and the rules shared by
//! the REST client and the reference backend.

pub mod auth;
pub mod codes;
pub mod display;
pub mod group_context;
pub mod kind;
pub mod models;
pub mod search;
pub mod session;
pub mod validation;

pub use kind::EntityKind;
pub use session::{SessionContext, SessionState};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
