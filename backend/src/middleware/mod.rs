pub mod access;

pub use access::{require_roles, AccessPolicy, ADMIN_ONLY, STAFF};
