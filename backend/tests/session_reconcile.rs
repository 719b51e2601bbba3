use adminkit_backend::{
    db::buckets,
    models::user::Role,
    repositories::session as checkpoint,
    utils::time::unix_now,
};

mod support;

use support::{insert_session, setup};

#[tokio::test]
async fn save_checkpoints_only_live_sessions() {
    let ctx = setup().await;
    let live = ctx.state.sessions.create_session("U1", Role::Finance);
    let _dead = insert_session(&ctx.state, "U2", Role::Admin, unix_now() - 5);

    let saved = ctx.state.sessions.reconcile_save().await.unwrap();
    assert_eq!(saved, 1);

    let stored = checkpoint::load_checkpoint(&ctx.store).await.unwrap();
    assert_eq!(stored, vec![live]);
}

#[tokio::test]
async fn load_restores_live_sessions_and_clears_checkpoint() {
    let ctx = setup().await;
    let live = ctx.state.sessions.create_session("U1", Role::Management);
    ctx.state.sessions.reconcile_save().await.unwrap();

    // Simulate a restart with an empty cache.
    ctx.state.sessions.cache().clear();

    let loaded = ctx.state.sessions.reconcile_load().await.unwrap();
    assert_eq!(loaded, 1);
    assert_eq!(ctx.state.sessions.get_session(&live.token).unwrap(), live);
    assert!(ctx.store.scan(buckets::SESSION).await.unwrap().is_empty());
}

#[tokio::test]
async fn load_skips_sessions_that_expired_while_stopped() {
    let ctx = setup().await;
    let now = unix_now();
    let stale = insert_session(&ctx.state, "U1", Role::Finance, now - 10);
    let fresh = insert_session(&ctx.state, "U2", Role::Finance, now + 600);
    checkpoint::save_checkpoint(&ctx.store, &[stale.clone(), fresh.clone()])
        .await
        .unwrap();
    ctx.state.sessions.cache().clear();

    let loaded = ctx.state.sessions.reconcile_load().await.unwrap();
    assert_eq!(loaded, 1);
    assert!(ctx.state.sessions.get_session(&fresh.token).is_ok());
    assert!(ctx.state.sessions.get_session(&stale.token).is_err());
    assert!(ctx.store.scan(buckets::SESSION).await.unwrap().is_empty());
}

#[tokio::test]
async fn load_from_empty_checkpoint_is_a_no_op() {
    let ctx = setup().await;
    assert_eq!(ctx.state.sessions.reconcile_load().await.unwrap(), 0);
    assert!(ctx.state.sessions.cache().is_empty());
}
