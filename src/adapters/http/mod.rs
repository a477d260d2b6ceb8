//! HTTP adapters - REST API implementations.
//!
//! `build_router` assembles the chat routes with the cross-cutting layers:
//! request tracing and CORS. The request timeout is enforced inside the
//! chat handler so that it answers with the JSON error body.

pub mod chat;

pub use chat::{chat_router, ChatAppState};

use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{Environment, ServerConfig};

/// Build the complete router with all routes and middleware.
pub fn build_router(state: ChatAppState, server: &ServerConfig) -> Router {
    chat_router()
        .layer(cors_layer(server))
        .layer(TraceLayer::new_for_http())
        .with_state(state.with_turn_timeout(server.request_timeout()))
}

/// CORS for the browser front-end.
///
/// Listed origins are allowed explicitly. With none listed, development is
/// permissive and other environments allow no cross-origin calls.
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .into_iter()
        .filter_map(|origin| match HeaderValue::from_str(&origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if !origins.is_empty() {
        base.allow_origin(origins)
    } else if server.environment == Environment::Development {
        base.allow_origin(Any)
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_layer_builds_for_each_environment() {
        for environment in [Environment::Development, Environment::Staging, Environment::Production] {
            let server = ServerConfig {
                environment,
                ..Default::default()
            };
            let _ = cors_layer(&server);
        }
    }

    #[test]
    fn cors_layer_accepts_listed_origins() {
        let server = ServerConfig {
            cors_origins: Some("http://localhost:5173,bad\norigin".to_string()),
            ..Default::default()
        };
        let _ = cors_layer(&server);
    }
}
