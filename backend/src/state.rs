use std::sync::Arc;

use crate::{
    config::Config,
    db::Store,
    services::{audit_log::AuditLogService, session::SessionManager, session_cache::SessionCache},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub sessions: SessionManager,
    pub audit: AuditLogService,
    pub config: Config,
}

impl AppState {
    /// Wires the session manager and audit trail around an opened store.
    pub fn new(store: Store, cache: Arc<SessionCache>, config: Config) -> Self {
        let audit = AuditLogService::new(store.clone(), config.time_zone);
        let sessions = SessionManager::new(cache, store.clone(), audit.clone());
        Self {
            store,
            sessions,
            audit,
            config,
        }
    }

    pub fn page_limit(&self) -> u32 {
        self.config.page_limit
    }
}
