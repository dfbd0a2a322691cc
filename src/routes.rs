// src/routes.rs

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, post},
};
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{assist, attempts, auth, lessons, quizzes, sessions},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, quizzes, lessons, attempts, sessions, ai).
/// * Applies global middleware (Trace, CORS) and rate limiting on AI routes.
/// * Injects global state.
pub fn create_router(state: AppState) -> Router {
    let origins: [HeaderValue; 2] = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    // AI calls are the expensive surface; keep them rate limited per client.
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(2)
            .burst_size(5)
            .finish()
            .unwrap(),
    );

    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/access", post(auth::access))
        .merge(
            Router::new()
                .route("/me", get(auth::me))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let quiz_routes = Router::new()
        .route("/", get(quizzes::list_quizzes))
        .route("/{id}", get(quizzes::get_quiz))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .merge(
            Router::new()
                .route("/", post(quizzes::create_quiz))
                .route("/{id}", delete(quizzes::delete_quiz))
                // Double middleware protection: Auth first, then Admin check
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    admin_middleware,
                ))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let lesson_routes = Router::new()
        .route("/", get(lessons::list_lessons))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .merge(
            Router::new()
                .route("/", post(lessons::create_lesson))
                .route("/{id}", delete(lessons::delete_lesson))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    admin_middleware,
                ))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let attempt_routes = Router::new()
        .route("/mine", get(attempts::list_my_attempts))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .merge(
            Router::new()
                .route("/", get(attempts::list_attempts))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    admin_middleware,
                ))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let session_routes = Router::new()
        .route("/", post(sessions::start_session))
        .route("/{id}", get(sessions::get_session))
        .route("/{id}/answer", post(sessions::select_answer))
        .route("/{id}/advance", post(sessions::advance))
        .route("/{id}/retreat", post(sessions::retreat))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let ai_routes = Router::new()
        .route("/summarize", post(assist::summarize))
        .route("/extract-questions", post(assist::extract_questions))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .merge(
            Router::new()
                .route("/explain", post(assist::explain))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        )
        .layer(GovernorLayer::new(governor_conf));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/lessons", lesson_routes)
        .nest("/api/attempts", attempt_routes)
        .nest("/api/sessions", session_routes)
        .nest("/api/ai", ai_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
