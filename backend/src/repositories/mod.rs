//! Typed access to the store's buckets.

pub mod audit_log;
pub mod cache;
pub mod common;
pub mod feedback;
pub mod invite;
pub mod password_reset;
pub mod session;
pub mod sweep;
pub mod user;
