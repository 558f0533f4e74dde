//! Business logic services.

pub mod access;
pub mod cookies;
