pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::TraceLayer,
};
use std::sync::Arc;

use crate::{
    config::Settings,
    service::ServiceContext,
};
use state::AppState;

pub fn create_app(service_context: Arc<ServiceContext>, settings: Arc<Settings>) -> Router {
    let app_state = AppState::new(service_context, settings);

    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))

        // Auth routes
        .route("/auth/login", post(handlers::auth::login))

        // API routes
        .nest("/api", api_routes(app_state.clone()))

        .with_state(app_state)

        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/leaderboard", leaderboard_routes())
        .merge(badge_routes(state.clone()))
        .merge(protected_routes(state))
}

// Leaderboards are public, including the event stream.
fn leaderboard_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::leaderboard::team_leaderboard))
        .route("/users", get(handlers::leaderboard::user_leaderboard))
        .route("/stats", get(handlers::leaderboard::stats))
        .route("/team/:id/history", get(handlers::leaderboard::team_history))
        .route("/stream", get(handlers::leaderboard::stream))
}

fn badge_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // The catalog is public
        .route("/badges", get(handlers::badges::list))
        .merge(Router::new()
            .route("/badges/me", get(handlers::badges::mine))
            .route("/badges/check", post(handlers::badges::check))
            .route_layer(axum::middleware::from_fn_with_state(
                state,
                middleware::auth::require_auth,
            ))
        )
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Missions and review
        .route("/missions/:id/submit", post(handlers::submissions::submit))
        .route("/submissions", get(handlers::submissions::list))
        .route("/submissions/:id", get(handlers::submissions::get))
        .route("/submissions/:id/review", post(handlers::submissions::review))

        // Notifications
        .route("/notifications", get(handlers::notifications::list))
        .route("/notifications/unread/count", get(handlers::notifications::unread_count))
        .route("/notifications/read-all", put(handlers::notifications::mark_all_read))
        .route("/notifications/:id/read", put(handlers::notifications::mark_read))
        .route("/notifications/:id", axum::routing::delete(handlers::notifications::delete))

        // Teams
        .route("/teams", post(handlers::teams::create))
        .route("/teams/:id/members", post(handlers::teams::add_member))
        .route("/teams/:id/members/:user_id", axum::routing::delete(handlers::teams::remove_member))
        .route("/teams/:id/captain/:user_id", put(handlers::teams::set_captain))

        // Users
        .route("/users/me/stats", get(handlers::users::my_stats))

        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_auth,
        ))
}
