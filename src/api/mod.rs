pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    Router,
    routing::{get, post, put},
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use std::sync::Arc;

use crate::{
    config::Settings,
    service::ServiceContext,
    web::uploads,
};
use state::AppState;

pub fn create_app(
    service_context: Arc<ServiceContext>,
    settings: Arc<Settings>,
) -> Router {
    let images_dir = settings.server.images_dir.clone();
    let app_state = AppState::new(service_context, settings);

    Router::new()
        .route("/health", get(handlers::root::health_check))
        .nest("/api/v1", api_routes(app_state.clone()))
        .nest_service(&format!("/{}", uploads::PUBLIC_PREFIX), ServeDir::new(images_dir))
        .with_state(app_state)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(public_routes())
        .merge(protected_routes(state))
        .layer(DefaultBodyLimit::max(uploads::MAX_FILE_SIZE + 64 * 1024))
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(handlers::users::register))
        .route("/sessions", post(handlers::users::login))
        .route("/email_checkers", post(handlers::users::check_email_availability))
        .route("/campaigns", get(handlers::campaigns::list))
        .route("/campaigns/:id", get(handlers::campaigns::get))
        // Called by the payment gateway, which signs the payload instead of
        // presenting a user token.
        .route("/transactions/notification", post(handlers::transactions::notification))
}

// Auth wraps each method router rather than the whole router, so an
// unmatched method on a shared path still answers 405.
fn protected_routes(state: AppState) -> Router<AppState> {
    let auth = axum::middleware::from_fn_with_state(state, middleware::auth::require_auth);

    Router::new()
        .route("/avatars", post(handlers::users::upload_avatar).route_layer(auth.clone()))
        .route("/users/fetch", get(handlers::users::fetch_user).route_layer(auth.clone()))
        .route("/campaigns", post(handlers::campaigns::create).route_layer(auth.clone()))
        .route("/campaigns/:id", put(handlers::campaigns::update).route_layer(auth.clone()))
        .route("/campaign-images", post(handlers::campaigns::upload_image).route_layer(auth.clone()))
        .route(
            "/campaigns/:id/transactions",
            get(handlers::transactions::list_for_campaign).route_layer(auth.clone()),
        )
        .route(
            "/transactions",
            get(handlers::transactions::list_for_user)
                .post(handlers::transactions::create)
                .route_layer(auth),
        )
}
