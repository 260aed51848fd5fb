use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tally_common::AggregatedToken;
use tally_utils::assets::AssetAggregator;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

#[derive(Clone)]
struct ServerState {
    aggregator: Arc<AssetAggregator>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// A failed request, rendered as `{"error": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<tally_utils::Error> for ApiError {
    fn from(err: tally_utils::Error) -> Self {
        let (status, reason) = match &err {
            tally_utils::Error::InvalidIdentity(_) => (StatusCode::BAD_REQUEST, err.to_string()),
            tally_utils::Error::NameNotResolved(_) => (StatusCode::NOT_FOUND, err.to_string()),
            // Upstream detail stays in the server log.
            tally_utils::Error::ResolutionFailed { name, .. } => (
                StatusCode::BAD_GATEWAY,
                format!("ENS resolution of '{name}' failed"),
            ),
            tally_utils::Error::Provider(_) => (
                StatusCode::BAD_GATEWAY,
                "balance provider request failed".to_string(),
            ),
            _ => (
                StatusCode::BAD_GATEWAY,
                "upstream request failed".to_string(),
            ),
        };
        Self {
            status,
            message: format!("Failed to fetch tokens: {reason}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

pub fn router(aggregator: Arc<AssetAggregator>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/tokens/{wallet}", get(get_tokens))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ServerState { aggregator })
}

async fn get_tokens(
    State(state): State<ServerState>,
    Path(wallet): Path<String>,
) -> Result<Json<Vec<AggregatedToken>>, ApiError> {
    match state.aggregator.get_tokens(&wallet).await {
        Ok(tokens) => Ok(Json(tokens)),
        Err(err) => {
            if err.is_user_error() {
                tracing::info!(%wallet, %err, "rejected token request");
            } else {
                tracing::error!(%wallet, %err, "token request failed");
            }
            Err(err.into())
        }
    }
}

/// Start the HTTP server. Runs until `shutdown_signal` is cancelled.
///
/// Returns an error if the server fails to bind or crashes.
pub async fn serve(
    config: &ServerConfig,
    aggregator: Arc<AssetAggregator>,
    shutdown_signal: CancellationToken,
) -> crate::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| crate::Error::PortBindingFailed(addr.clone(), e))?;

    tracing::info!("Server running on http://{addr}");

    axum::serve(listener, router(aggregator))
        .with_graceful_shutdown(async move { shutdown_signal.cancelled().await })
        .await
        .map_err(crate::Error::ServerCrashed)?;

    Ok(())
}
