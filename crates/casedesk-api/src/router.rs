//! Router configuration and server setup.

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ApiConfig;
use crate::handlers;
use crate::state::AppState;

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let origin = if config.allows_any_origin() {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Creates the API router with all routes configured.
pub fn create_router(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config));

    Router::new()
        // Health
        .route("/api/health", get(handlers::health))
        // Conversations
        .route("/api/conversations", post(handlers::start_conversation))
        .route(
            "/api/conversations/:id",
            get(handlers::get_conversation).delete(handlers::close_conversation),
        )
        .route(
            "/api/conversations/:id/messages",
            post(handlers::send_message),
        )
        .route(
            "/api/conversations/:id/reset",
            post(handlers::reset_conversation),
        )
        .route(
            "/api/conversations/:id/takeover",
            post(handlers::set_takeover),
        )
        // Tickets
        .route("/api/tickets", get(handlers::list_tickets))
        .route("/api/tickets/:id", get(handlers::get_ticket))
        .route("/api/tickets/:id/sla", get(handlers::get_ticket_sla))
        .route("/api/tickets/:id/status", post(handlers::update_ticket_status))
        .route("/api/tickets/:id/resume", post(handlers::resume_conversation))
        .route(
            "/api/tickets/:id/notes",
            get(handlers::list_ticket_notes).post(handlers::add_ticket_note),
        )
        // Rules
        .route("/api/rules", get(handlers::list_rules))
        .layer(middleware)
        .with_state(state)
}

/// Starts the API server.
pub async fn serve(config: ApiConfig, state: AppState) -> Result<(), std::io::Error> {
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on {}", addr);
    axum::serve(listener, create_router(state)).await
}
