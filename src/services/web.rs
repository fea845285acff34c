//! Axum-based HTTP server for the command API.
//!
//! Routes (GET and POST are equivalent, parameters come from the query string):
//! - `/shutter/aqara?deviceId=<id>&position=<0..1>` - move an Aqara shutter
//! - `/curtain/slide?deviceId=<id>&position=<0..1>` - move a Slide curtain
//!
//! | Outcome | Status |
//! |---------|--------|
//! | command delivered | 200 |
//! | missing or unparseable parameter | 400 |
//! | unknown device | 404 |
//! | device failure | 500 |

use std::collections::HashMap;
use std::future::Future;
use std::net::{AddrParseError, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::config::ApiConfig;
use crate::parsing::parse_command_params;
use crate::registry::DeviceRegistry;
use crate::traits::DeviceClass;

use super::api::{ApiResponse, CommandResponse};

type CommandReply = (StatusCode, Json<ApiResponse<CommandResponse>>);

// ============================================================================
// Route Handlers
// ============================================================================

async fn set_shutter(
    State(registry): State<Arc<DeviceRegistry>>,
    Query(params): Query<HashMap<String, String>>,
) -> CommandReply {
    handle_command(&registry, DeviceClass::AqaraShutter, &params).await
}

async fn set_curtain(
    State(registry): State<Arc<DeviceRegistry>>,
    Query(params): Query<HashMap<String, String>>,
) -> CommandReply {
    handle_command(&registry, DeviceClass::SlideCurtain, &params).await
}

/// Validate, look up and dispatch one command.
async fn handle_command(
    registry: &DeviceRegistry,
    class: DeviceClass,
    params: &HashMap<String, String>,
) -> CommandReply {
    let command = match parse_command_params(params) {
        Ok(command) => command,
        Err(e) => {
            debug!(route = class.route(), "rejected command: {}", e);
            return (StatusCode::BAD_REQUEST, Json(ApiResponse::err(e.to_string())));
        }
    };

    let Some(device) = registry.get(class, &command.device_id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::err(format!(
                "Device '{}' is unknown",
                command.device_id
            ))),
        );
    };

    if device.set_position(command.position).await {
        info!(
            device = %command.device_id,
            "{} moved to {}",
            class.noun(),
            command.position
        );
        (StatusCode::OK, Json(ApiResponse::ok(command.into())))
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::err(format!(
                "Unable to set the position of the {} at this time",
                class.noun()
            ))),
        )
    }
}

/// Fallback handler for 404
async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::err("Not found")),
    )
}

// ============================================================================
// Server Builder
// ============================================================================

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Address to bind to
    pub addr: SocketAddr,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            addr: ([0, 0, 0, 0], 8080).into(),
            cors_permissive: false,
        }
    }
}

impl WebServerConfig {
    /// Create a new config with the given address
    pub fn new(addr: impl Into<SocketAddr>) -> Self {
        Self {
            addr: addr.into(),
            ..Default::default()
        }
    }

    /// Set whether CORS should be permissive
    pub fn cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Create from the `[api]` config section
    pub fn from_config(config: &ApiConfig) -> Result<Self, AddrParseError> {
        Ok(Self {
            addr: config.socket_addr().parse()?,
            cors_permissive: config.cors_permissive,
        })
    }
}

/// Build the Axum router with all routes
pub fn build_router(registry: Arc<DeviceRegistry>, config: &WebServerConfig) -> Router {
    let mut router = Router::new()
        .route(
            DeviceClass::AqaraShutter.route(),
            get(set_shutter).post(set_shutter),
        )
        .route(
            DeviceClass::SlideCurtain.route(),
            get(set_curtain).post(set_curtain),
        )
        .fallback(not_found)
        .with_state(registry);

    if config.cors_permissive {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router.layer(TraceLayer::new_for_http())
}

/// Serve the command API until `shutdown` resolves.
pub async fn run_server(
    registry: Arc<DeviceRegistry>,
    config: WebServerConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let router = build_router(registry, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("Command API listening on http://{}", config.addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
