use adminkit_backend::{
    models::{
        invite::{Invite, InviteStatus},
        password_reset::PassReset,
        user::Role,
    },
    repositories::{invite as invite_repo, password_reset as reset_repo, user as user_repo},
    router::router,
    utils::{
        password::verify_password,
        time::unix_now,
        token::{generate_record_id, user_id_for_email},
    },
};
use axum::http::StatusCode;
use serde_json::json;

mod support;

use support::{seed_user, send, setup, setup_with_admin, TestContext, ADMIN_EMAIL};

async fn pending_invite(ctx: &TestContext, email: &str, role: Role, expiry: i64) -> Invite {
    let invite = Invite {
        uuid: generate_record_id(),
        email: email.to_string(),
        role,
        status: InviteStatus::Pending,
        last_modified: 0,
        created_on: unix_now(),
        expiry,
        invited_by: user_id_for_email(ADMIN_EMAIL),
        deleted: false,
    };
    invite_repo::put_invite(&ctx.store, &invite).await.unwrap();
    invite
}

async fn open_reset(ctx: &TestContext, user: &str, expiry: i64) -> PassReset {
    let reset = PassReset {
        uuid: generate_record_id(),
        email: "fin@example.com".into(),
        user: user.to_string(),
        reset_url: String::new(),
        expiry,
        last_modified: 0,
        created_on: unix_now(),
        used: false,
    };
    reset_repo::put_reset(&ctx.store, &reset).await.unwrap();
    reset
}

#[tokio::test]
async fn registration_accepts_the_invite_and_takes_its_role() {
    let ctx = setup_with_admin().await;
    let app = router(ctx.state.clone());
    let invite = pending_invite(&ctx, "new@example.com", Role::Finance, unix_now() + 600).await;

    let (status, user) = send(
        &app,
        "POST",
        "/users",
        None,
        Some(json!({
            "invite": invite.uuid,
            "firstName": "Ada",
            "lastName": "Lovelace",
            "password": "difference-engine",
            "email": "New@Example.com",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["uuid"], user_id_for_email("new@example.com"));
    assert_eq!(user["role"], "finance");
    assert_eq!(user["invite"], invite.uuid.as_str());
    assert!(user.get("password").is_none());

    let accepted = invite_repo::get_invite(&ctx.store, &invite.uuid)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(accepted.status, InviteStatus::Accepted);

    let (status, session) = send(
        &app,
        "POST",
        "/sessions",
        None,
        Some(json!({ "email": "new@example.com", "password": "difference-engine" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(session["access"], "finance");

    let (status, body) = send(
        &app,
        "POST",
        "/users",
        None,
        Some(json!({
            "invite": invite.uuid,
            "firstName": "Ada",
            "lastName": "Lovelace",
            "password": "difference-engine",
            "email": "new@example.com",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invite is no longer pending");
}

#[tokio::test]
async fn registration_rejects_mismatched_or_expired_invites() {
    let ctx = setup().await;
    let app = router(ctx.state.clone());
    let live = pending_invite(&ctx, "a@example.com", Role::Management, unix_now() + 600).await;
    let expired = pending_invite(&ctx, "b@example.com", Role::Management, unix_now() - 10).await;

    let register = |invite: &str, email: &str| {
        json!({
            "invite": invite,
            "firstName": "Grace",
            "lastName": "Hopper",
            "password": "cobol-rules",
            "email": email,
        })
    };

    let (status, body) =
        send(&app, "POST", "/users", None, Some(register(live.uuid.as_str(), "other@example.com"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invite not associated with user being created");

    let (status, body) =
        send(&app, "POST", "/users", None, Some(register(expired.uuid.as_str(), "b@example.com"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invite expired");

    let (status, _) =
        send(&app, "POST", "/users", None, Some(register("missing", "a@example.com"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert!(user_repo::find_user_by_email(&ctx.store, "a@example.com")
        .await
        .unwrap()
        .is_none());
    let untouched = invite_repo::get_invite(&ctx.store, &live.uuid)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(untouched.status, InviteStatus::Pending);
}

#[tokio::test]
async fn password_reset_is_consumed_once() {
    let ctx = setup().await;
    let app = router(ctx.state.clone());
    let admin = ctx.state.sessions.create_session("root", Role::Admin);
    let user = seed_user(&ctx.store, "fin@example.com", "old-password", Role::Finance).await;
    let reset = open_reset(&ctx, &user.uuid, unix_now() + 600).await;

    let uri = format!("/users/{}/resetpassword", user.uuid);
    let payload = json!({ "password": "new-password", "resetId": reset.uuid });
    let (status, body) = send(&app, "PUT", &uri, Some(&admin.token), Some(payload.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("password").is_none());

    let stored = user_repo::get_user(&ctx.store, &user.uuid).await.unwrap().unwrap();
    assert!(verify_password("new-password", &stored.password).unwrap());
    assert!(reset_repo::get_reset(&ctx.store, &reset.uuid)
        .await
        .unwrap()
        .unwrap()
        .used);

    let (status, body) = send(&app, "PUT", &uri, Some(&admin.token), Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "password reset has already been used");
}

#[tokio::test]
async fn password_reset_must_be_live_and_belong_to_the_user() {
    let ctx = setup().await;
    let app = router(ctx.state.clone());
    let admin = ctx.state.sessions.create_session("root", Role::Admin);
    let user = seed_user(&ctx.store, "fin@example.com", "old-password", Role::Finance).await;
    let expired = open_reset(&ctx, &user.uuid, unix_now() - 10).await;
    let foreign = open_reset(&ctx, "someone-else", unix_now() + 600).await;

    let uri = format!("/users/{}/resetpassword", user.uuid);
    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&admin.token),
        Some(json!({ "password": "new-password", "resetId": expired.uuid })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "password reset has already expired");

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&admin.token),
        Some(json!({ "password": "new-password", "resetId": foreign.uuid })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid parameter type for 'resetId'");

    let stored = user_repo::get_user(&ctx.store, &user.uuid).await.unwrap().unwrap();
    assert!(verify_password("old-password", &stored.password).unwrap());
}

#[tokio::test]
async fn details_update_checks_password_pairs() {
    let ctx = setup().await;
    let app = router(ctx.state.clone());
    let admin = ctx.state.sessions.create_session("root", Role::Admin);
    let user = seed_user(&ctx.store, "fin@example.com", "old-password", Role::Finance).await;
    let uri = format!("/users/{}", user.uuid);
    let token = Some(admin.token.as_str());

    let (status, body) = send(&app, "PUT", &uri, token, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "supplied keys do not update entity");

    let (status, body) =
        send(&app, "PUT", &uri, token, Some(json!({ "newPassword": "brand-new-pass" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "parameters 'newPassword, currentPassword' are expected together in a request"
    );

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        token,
        Some(json!({ "newPassword": "brand-new-pass", "currentPassword": "wrong-guess" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "passwords do not match");

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        token,
        Some(json!({
            "firstName": "Renamed",
            "newPassword": "brand-new-pass",
            "currentPassword": "old-password",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["firstName"], "Renamed");
    assert_eq!(body["lastName"], "User");

    let stored = user_repo::get_user(&ctx.store, &user.uuid).await.unwrap().unwrap();
    assert!(verify_password("brand-new-pass", &stored.password).unwrap());
}

#[tokio::test]
async fn role_change_and_soft_delete() {
    let ctx = setup().await;
    let app = router(ctx.state.clone());
    let admin = ctx.state.sessions.create_session("root", Role::Admin);
    let user = seed_user(&ctx.store, "fin@example.com", "old-password", Role::Finance).await;
    let token = Some(admin.token.as_str());

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/users/{}/role", user.uuid),
        token,
        Some(json!({ "role": "management" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "management");

    let uri = format!("/users/{}", user.uuid);
    let (status, body) = send(&app, "DELETE", &uri, token, Some(json!({ "deleted": true }))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let stored = user_repo::get_user(&ctx.store, &user.uuid).await.unwrap().unwrap();
    assert!(stored.deleted);

    let (status, _) = send(
        &app,
        "POST",
        "/sessions",
        None,
        Some(json!({ "email": "fin@example.com", "password": "old-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "DELETE", "/users/nobody", token, Some(json!({ "deleted": true }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_listing_hides_admins_and_deleted_accounts() {
    let ctx = setup_with_admin().await;
    let app = router(ctx.state.clone());
    let admin = ctx.state.sessions.create_session("root", Role::Admin);
    let token = Some(admin.token.as_str());
    seed_user(&ctx.store, "a@example.com", "password-a", Role::Finance).await;
    seed_user(&ctx.store, "b@example.com", "password-b", Role::Management).await;
    let mut gone = seed_user(&ctx.store, "c@example.com", "password-c", Role::Finance).await;
    gone.deleted = true;
    user_repo::put_user(&ctx.store, &gone).await.unwrap();

    let (status, listed) = send(&app, "POST", "/users/list", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["meta"]["count"], 2);
    let results = listed["results"].as_array().unwrap();
    assert!(results.iter().all(|user| user["role"] != "admin"));
    assert!(results.iter().all(|user| user.get("password").is_none()));

    let (status, listed) = send(
        &app,
        "POST",
        "/users/list",
        token,
        Some(json!({ "term": "ADMIN", "offset": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["meta"]["count"], 1);
    assert_eq!(listed["results"][0]["email"], ADMIN_EMAIL);
}

#[tokio::test]
async fn failed_login_bookkeeping_leaves_no_session() {
    let ctx = setup_with_admin().await;
    let app = router(ctx.state.clone());

    // Reads keep working while every write to the user bucket is refused.
    for event in ["INSERT", "UPDATE"] {
        sqlx::query(&format!(
            "CREATE TRIGGER refuse_user_{event} BEFORE {event} ON kv_entries \
             WHEN NEW.bucket = 'user' BEGIN SELECT RAISE(ABORT, 'read-only'); END"
        ))
        .execute(ctx.store.pool())
        .await
        .unwrap();
    }

    let (status, _) = send(
        &app,
        "POST",
        "/sessions",
        None,
        Some(json!({ "email": ADMIN_EMAIL, "password": support::ADMIN_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(ctx.state.sessions.cache().is_empty());
}
