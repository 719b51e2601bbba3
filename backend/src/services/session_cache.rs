//! In-memory session registry, the source of truth for live sessions while
//! the process runs.

use dashmap::{mapref::entry::Entry, DashMap};

use crate::models::session::Session;

/// Result of [`SessionCache::extend_expiry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Renewal {
    Extended(Session),
    Expired,
    Missing,
}

/// Token-keyed session map. Every operation is atomic per key; callers never
/// need an external lock, and readers always receive copies.
#[derive(Debug, Default)]
pub struct SessionCache {
    sessions: DashMap<String, Session>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, token: &str) -> Option<Session> {
        self.sessions.get(token).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, session: Session) {
        self.sessions.insert(session.token.clone(), session);
    }

    /// Inserts `session` only if its token is not already taken.
    pub fn insert_new(&self, session: Session) -> bool {
        match self.sessions.entry(session.token.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(session);
                true
            }
        }
    }

    pub fn remove(&self, token: &str) -> Option<Session> {
        self.sessions.remove(token).map(|(_, session)| session)
    }

    /// Evicts the session only if it is still expired at `now`, so a
    /// concurrent renewal is never undone.
    pub fn remove_if_expired(&self, token: &str, now: i64) -> Option<Session> {
        self.sessions
            .remove_if(token, |_, session| session.is_expired_at(now))
            .map(|(_, session)| session)
    }

    /// Pushes the expiry of a cached session forward by `secs` from its
    /// current value, provided it is still live at `now`. A session found
    /// expired is evicted instead; a removed session is never re-inserted.
    pub fn extend_expiry(&self, token: &str, now: i64, secs: i64) -> Renewal {
        let Some(mut entry) = self.sessions.get_mut(token) else {
            return Renewal::Missing;
        };
        if !entry.is_expired_at(now) {
            entry.expiry += secs;
            return Renewal::Extended(entry.value().clone());
        }
        // The shard guard must be released before removing from it.
        drop(entry);
        self.remove_if_expired(token, now);
        Renewal::Expired
    }

    /// Copies of every cached session.
    pub fn snapshot(&self) -> Vec<Session> {
        self.sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn clear(&self) {
        self.sessions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;

    fn session(token: &str, expiry: i64) -> Session {
        Session {
            user: "U1".into(),
            token: token.into(),
            access: Role::Finance,
            created_on: 0,
            expiry,
        }
    }

    #[test]
    fn insert_new_refuses_taken_token() {
        let cache = SessionCache::new();
        assert!(cache.insert_new(session("a", 10)));
        assert!(!cache.insert_new(session("a", 99)));
        assert_eq!(cache.get("a").unwrap().expiry, 10);
    }

    #[test]
    fn extend_expiry_adds_to_current_value() {
        let cache = SessionCache::new();
        cache.insert(session("a", 100));
        assert!(matches!(cache.extend_expiry("a", 50, 60), Renewal::Extended(s) if s.expiry == 160));
        assert!(matches!(cache.extend_expiry("a", 50, 60), Renewal::Extended(s) if s.expiry == 220));
    }

    #[test]
    fn extend_expiry_evicts_session_that_lapsed() {
        let cache = SessionCache::new();
        cache.insert(session("a", 100));
        assert_eq!(cache.extend_expiry("a", 100, 60), Renewal::Expired);
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn extend_expiry_does_not_resurrect_removed_session() {
        let cache = SessionCache::new();
        cache.insert(session("a", 100));
        cache.remove("a");
        assert_eq!(cache.extend_expiry("a", 50, 60), Renewal::Missing);
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn remove_if_expired_keeps_live_sessions() {
        let cache = SessionCache::new();
        cache.insert(session("live", 200));
        cache.insert(session("dead", 100));
        assert!(cache.remove_if_expired("live", 150).is_none());
        assert!(cache.remove_if_expired("dead", 150).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn snapshot_returns_copies() {
        let cache = SessionCache::new();
        cache.insert(session("a", 100));
        let mut copies = cache.snapshot();
        copies[0].expiry = 0;
        assert_eq!(cache.get("a").unwrap().expiry, 100);
    }
}
