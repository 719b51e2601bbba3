//! Session lifecycle and request authorization.

use std::sync::Arc;

use axum::body::Bytes;
use serde_json::{Map, Value};

use crate::{
    db::{Store, StoreError},
    error::{Error, Result},
    models::{audit_log::RequestLog, session::Session, user::Role},
    repositories::session as checkpoint,
    services::{
        audit_log::AuditLogService,
        session_cache::{Renewal, SessionCache},
    },
    utils::{time::unix_now, token::generate_session_token},
};

/// Lifetime of a freshly created session.
pub const SESSION_TTL_SECS: i64 = 2 * 60 * 60;

/// Extension applied to a session's expiry on every authorized request.
pub const SESSION_RENEWAL_SECS: i64 = 60;

const AUTHORIZATION_SCHEME: &str = "Token";

/// Body of a request as seen by the access check.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Bytes(Bytes),
    /// The body could not be read; carries the reason.
    Unreadable(String),
}

/// The parts of an HTTP request the access check needs.
#[derive(Debug, Clone)]
pub struct AccessRequest {
    /// Caller address.
    pub origin: String,
    pub method: String,
    pub route: String,
    /// Raw query string, without the leading `?`.
    pub query: Option<String>,
    /// Raw `Authorization` header value.
    pub authorization: Option<String>,
    pub body: RequestBody,
}

/// Outcome of a granted validation.
#[derive(Debug)]
pub struct Validated {
    /// The session after its expiry was extended.
    pub session: Session,
    /// Set when the audit record could not be persisted. Access is still
    /// granted.
    pub audit_error: Option<StoreError>,
}

#[derive(Clone)]
pub struct SessionManager {
    cache: Arc<SessionCache>,
    store: Store,
    audit: AuditLogService,
}

impl SessionManager {
    pub fn new(cache: Arc<SessionCache>, store: Store, audit: AuditLogService) -> Self {
        Self {
            cache,
            store,
            audit,
        }
    }

    pub fn cache(&self) -> &Arc<SessionCache> {
        &self.cache
    }

    /// Issues a new session for `principal`. Token collisions are retried
    /// with a fresh token.
    pub fn create_session(&self, principal: &str, access: Role) -> Session {
        let now = unix_now();
        loop {
            let session = Session {
                user: principal.to_string(),
                token: generate_session_token(),
                access,
                created_on: now,
                expiry: now + SESSION_TTL_SECS,
            };
            if self.cache.insert_new(session.clone()) {
                tracing::debug!(user = %session.user, access = %session.access, "Session created");
                return session;
            }
        }
    }

    /// Copy of the cached session for `token`.
    pub fn get_session(&self, token: &str) -> Result<Session> {
        self.cache
            .get(token)
            .ok_or_else(|| Error::KeyNotFound(token.to_string()))
    }

    /// Drops the session from the cache. No store I/O.
    pub fn logout(&self, token: &str) -> Option<Session> {
        self.cache.remove(token)
    }

    /// Sessions are not stored entities and cannot be deleted through the
    /// generic entity path.
    pub fn delete_session(&self, _token: &str) -> Result<()> {
        Err(Error::NotApplicable("session".to_string()))
    }

    /// Authenticates the request, appends it to the audit trail and checks
    /// the session's role against `required_roles`. A granted request slides
    /// the session expiry forward.
    ///
    /// Failures before the audit step (header, lookup, expiry, body) leave no
    /// audit record. Once the body is parsed, exactly one record is appended
    /// whether or not access is granted.
    pub async fn validate_request(
        &self,
        required_roles: &[Role],
        request: &AccessRequest,
    ) -> Result<Validated> {
        let token = parse_authorization(request.authorization.as_deref())?;

        let session = self.cache.get(token).ok_or(Error::Unauthorized)?;

        let now = unix_now();
        if session.is_expired_at(now) {
            self.cache.remove_if_expired(token, now);
            tracing::debug!(user = %session.user, "Session expired");
            return Err(Error::SessionExpired);
        }

        let payload = parse_payload(&request.body)?;

        let entry = RequestLog {
            origin: request.origin.clone(),
            requestor: session.token.clone(),
            request_type: request.method.clone(),
            route: request.route.clone(),
            query_params: encode_query(request.query.as_deref()),
            payload,
        };
        let audit_error = match self.audit.record(&entry).await {
            Ok(()) => None,
            Err(err) => {
                tracing::warn!(
                    route = %entry.route,
                    error = %err,
                    "Failed to persist audit record"
                );
                Some(err)
            }
        };

        if !is_granted(session.access, required_roles) {
            tracing::debug!(
                user = %session.user,
                access = %session.access,
                route = %entry.route,
                "Access denied"
            );
            return Err(Error::Unauthorized);
        }

        // The session may have lapsed while the audit write waited.
        let session = match self
            .cache
            .extend_expiry(token, unix_now(), SESSION_RENEWAL_SECS)
        {
            Renewal::Extended(session) => session,
            Renewal::Expired => {
                tracing::debug!(user = %session.user, "Session expired");
                return Err(Error::SessionExpired);
            }
            Renewal::Missing => return Err(Error::Unauthorized),
        };

        Ok(Validated {
            session,
            audit_error,
        })
    }

    /// Restores the sessions checkpointed at the last shutdown. Only sessions
    /// that are still live are loaded; the checkpoint is emptied afterwards.
    pub async fn reconcile_load(&self) -> Result<usize> {
        let now = unix_now();
        let stored = checkpoint::load_checkpoint(&self.store).await?;
        let total = stored.len();
        let mut loaded = 0;
        for session in stored {
            if !session.is_expired_at(now) {
                self.cache.insert(session);
                loaded += 1;
            }
        }
        let cleared = checkpoint::clear_checkpoint(&self.store).await?;
        tracing::info!(loaded, discarded = total - loaded, cleared, "Sessions restored");
        Ok(loaded)
    }

    /// Writes every live cached session to the checkpoint. Expired sessions
    /// are dropped.
    pub async fn reconcile_save(&self) -> Result<usize> {
        let now = unix_now();
        let live: Vec<Session> = self
            .cache
            .snapshot()
            .into_iter()
            .filter(|session| !session.is_expired_at(now))
            .collect();
        let saved = checkpoint::save_checkpoint(&self.store, &live).await?;
        tracing::info!(saved, "Sessions checkpointed");
        Ok(saved)
    }
}

/// `admin` satisfies every requirement; other roles must be listed.
pub fn is_granted(access: Role, required_roles: &[Role]) -> bool {
    access == Role::Admin || required_roles.contains(&access)
}

/// Extracts the session token from a `Token <value>` header. The header is
/// split on its first space and the scheme compared exactly.
pub fn parse_authorization(header: Option<&str>) -> Result<&str> {
    let header = header.ok_or(Error::AuthorizationMissing)?;
    match header.split_once(' ') {
        Some((AUTHORIZATION_SCHEME, token)) if !token.is_empty() => Ok(token),
        _ => Err(Error::AuthorizationMalformed),
    }
}

/// An empty body is an empty payload; anything else must be a JSON object.
pub fn parse_payload(body: &RequestBody) -> Result<Map<String, Value>> {
    let bytes = match body {
        RequestBody::Bytes(bytes) => bytes,
        RequestBody::Unreadable(reason) => {
            tracing::debug!(reason = %reason, "Request body could not be read");
            return Err(Error::MalformedRequestBody);
        }
    };
    if bytes.is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(Error::MalformedPayload),
    }
}

/// Re-encodes a query string with its parameters sorted by key.
pub fn encode_query(query: Option<&str>) -> String {
    let Some(query) = query else {
        return String::new();
    };
    let mut pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}
