#![allow(dead_code)]
use std::{path::Path, sync::Arc};

use adminkit_backend::{
    config::Config,
    db::{bucket_path, buckets, open_store, Store},
    models::{
        session::Session,
        user::{Role, User},
    },
    repositories::user as user_repo,
    services::{
        admin::ensure_admin,
        session::{AccessRequest, RequestBody},
        session_cache::SessionCache,
    },
    state::AppState,
    utils::{
        password::hash_password,
        time::{day_bucket_name, today_local, unix_now},
        token::{generate_session_token, user_id_for_email},
    },
};
use axum::{
    body::{Body, Bytes},
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@adminkit.test";
pub const ADMIN_PASSWORD: &str = "admin-pass";

/// A fresh store in its own temporary directory. The directory is removed
/// when the context is dropped.
pub struct TestContext {
    pub dir: TempDir,
    pub store: Store,
    pub state: AppState,
}

pub fn test_config(dir: &Path) -> Config {
    Config {
        storage_path: dir.join("adminkit.db"),
        bind_addr: "127.0.0.1:0".into(),
        server_name: "adminkit".into(),
        admin_email: ADMIN_EMAIL.into(),
        admin_password: ADMIN_PASSWORD.into(),
        page_limit: 20,
        frontend_url: "http://frontend.test".into(),
        time_zone: chrono_tz::UTC,
        invite_sweep_hour: 20,
        reset_sweep_hour: 21,
    }
}

pub async fn setup() -> TestContext {
    let dir = TempDir::new().expect("create temp dir");
    let config = test_config(dir.path());
    let store = open_store(&config.storage_path).await.expect("open store");
    let state = AppState::new(store.clone(), Arc::new(SessionCache::new()), config);
    TestContext { dir, store, state }
}

/// Same as [`setup`], with the bootstrap administrator provisioned.
pub async fn setup_with_admin() -> TestContext {
    let ctx = setup().await;
    ensure_admin(&ctx.store, &ctx.state.config)
        .await
        .expect("ensure admin");
    ctx
}

pub async fn seed_user(store: &Store, email: &str, password: &str, role: Role) -> User {
    let now = unix_now();
    let user = User {
        uuid: user_id_for_email(email),
        first_name: "Test".into(),
        last_name: "User".into(),
        password: hash_password(password).expect("hash password"),
        email: email.to_string(),
        role,
        last_login: 0,
        last_modified: now,
        created_on: now,
        deleted: false,
        invite: "-".into(),
    };
    user_repo::put_user(store, &user).await.expect("seed user");
    user
}

/// Places a session with the given expiry straight into the cache.
pub fn insert_session(state: &AppState, user: &str, access: Role, expiry: i64) -> Session {
    let session = Session {
        user: user.to_string(),
        token: generate_session_token(),
        access,
        created_on: unix_now(),
        expiry,
    };
    state.sessions.cache().insert(session.clone());
    session
}

pub fn access_request(route: &str, authorization: Option<String>, body: &'static [u8]) -> AccessRequest {
    AccessRequest {
        origin: "127.0.0.1:50000".into(),
        method: "POST".into(),
        route: route.to_string(),
        query: None,
        authorization,
        body: RequestBody::Bytes(Bytes::from_static(body)),
    }
}

pub fn token_header(token: &str) -> Option<String> {
    Some(format!("Token {}", token))
}

/// Number of audit records stored today for `token`.
pub async fn audit_count(state: &AppState, token: &str) -> usize {
    let day = day_bucket_name(today_local(&state.config.time_zone));
    let bucket = bucket_path(&[buckets::LOG, &day, token]).expect("bucket path");
    if !state.store.bucket_exists(&bucket).await.expect("bucket exists") {
        return 0;
    }
    state.store.scan(&bucket).await.expect("scan").len()
}

/// Sends one request through the router and decodes the JSON reply
/// (`Value::Null` for an empty body).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Token {}", token));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
