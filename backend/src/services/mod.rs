pub mod admin;
pub mod audit_log;
pub mod session;
pub mod session_cache;
