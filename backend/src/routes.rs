// src/routes.rs

use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{admin, analytics, certifications, favorites, practice_tests, questions, responses},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Everything under `/api` requires a bearer token; `/api/admin`
///   additionally requires the admin role.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (store and config).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let certification_routes = Router::new()
        .route("/", get(certifications::list_certifications))
        .route("/{slug}", get(certifications::get_certification));

    let question_routes = Router::new()
        .route("/", get(questions::list_questions))
        .route("/{id}", get(questions::get_question))
        .route("/{id}/responses", post(responses::submit_answer));

    let response_routes = Router::new().route("/", get(responses::list_history));

    let test_routes = Router::new()
        .route(
            "/",
            get(practice_tests::list_tests).post(practice_tests::create_test),
        )
        .route(
            "/{id}",
            get(practice_tests::get_test).delete(practice_tests::delete_test),
        );

    let favorite_routes = Router::new()
        .route("/", get(favorites::list_favorites))
        .route(
            "/{question_id}",
            put(favorites::add_favorite).delete(favorites::remove_favorite),
        );

    let analytics_routes = Router::new().route("/accuracy", get(analytics::get_accuracy));

    // Runs after auth_middleware, which the enclosing api router applies.
    let admin_routes = Router::new()
        .route("/certifications", post(admin::upsert_certification))
        .route("/questions", post(admin::upsert_question))
        .route_layer(middleware::from_fn(admin_middleware));

    let api_routes = Router::new()
        .nest("/certifications", certification_routes)
        .nest("/questions", question_routes)
        .nest("/responses", response_routes)
        .nest("/tests", test_routes)
        .nest("/favorites", favorite_routes)
        .route("/sections", get(analytics::list_sections))
        .nest("/analytics", analytics_routes)
        .nest("/admin", admin_routes)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({ "status": "ok" })) }))
        .nest("/api", api_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
