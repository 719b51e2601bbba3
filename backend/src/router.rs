use axum::{
    http::Method,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers,
    middleware::{require_roles, AccessPolicy, ADMIN_ONLY, STAFF},
    state::AppState,
};

pub fn router(state: AppState) -> Router {
    // Public routes (no session)
    let public_routes = Router::new()
        .route("/sessions", post(handlers::sessions::login))
        .route("/sessions/{id}", get(handlers::sessions::get_session))
        .route("/users", post(handlers::users::register_user))
        .route("/resets", post(handlers::resets::create_reset));

    // Any signed-in role
    let staff_routes = Router::new()
        .route("/sessions/{id}", delete(handlers::sessions::logout))
        .route("/feedback", post(handlers::feedback::create_feedback))
        .route_layer(axum_middleware::from_fn_with_state(
            AccessPolicy::new(state.clone(), STAFF),
            require_roles,
        ));

    let admin_routes = Router::new()
        .route("/logs/list", post(handlers::logs::list_logs))
        .route("/users/list", post(handlers::users::list_users))
        .route(
            "/users/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user_details)
                .delete(handlers::users::delete_user),
        )
        .route("/users/{id}/role", put(handlers::users::update_user_role))
        .route(
            "/users/{id}/resetpassword",
            put(handlers::users::reset_user_password),
        )
        .route("/invites", post(handlers::invites::create_invite))
        .route("/invites/list", post(handlers::invites::list_invites))
        .route(
            "/invites/{id}",
            get(handlers::invites::get_invite)
                .put(handlers::invites::update_invite)
                .delete(handlers::invites::delete_invite),
        )
        .route("/invites/{id}/cancel", put(handlers::invites::cancel_invite))
        .route(
            "/resets/{id}",
            get(handlers::resets::get_reset).put(handlers::resets::mark_reset_used),
        )
        .route("/feedback/list", post(handlers::feedback::list_feedback))
        .route(
            "/feedback/{id}",
            get(handlers::feedback::get_feedback).put(handlers::feedback::update_feedback_status),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            AccessPolicy::new(state.clone(), ADMIN_ONLY),
            require_roles,
        ));

    Router::new()
        .merge(public_routes)
        .merge(staff_routes)
        .merge(admin_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([
                            Method::GET,
                            Method::POST,
                            Method::PUT,
                            Method::DELETE,
                            Method::OPTIONS,
                        ])
                        .allow_headers(Any)
                        .max_age(std::time::Duration::from_secs(24 * 60 * 60)),
                ),
        )
        .with_state(state)
}
