//! The trusted backend half of the token exchange.
//!
//! Clients `POST /api/token` with no body and get `{access_token,
//! expires_in}` back. Only this process holds the client credentials.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::json;
use tracing::{error, info};

use crate::fetch::auth::TokenSource;

const EXCHANGE_FAILED: &str = "OAuth2 token 取得失敗";

pub fn router(source: Arc<dyn TokenSource>) -> Router {
    Router::new()
        .route("/api/token", post(issue_token))
        .with_state(source)
}

#[tracing::instrument(skip_all)]
async fn issue_token(State(source): State<Arc<dyn TokenSource>>) -> Response {
    match source.exchange().await {
        Ok(grant) => {
            info!(expires_in = grant.expires_in, "Token issued");
            Json(grant).into_response()
        }
        Err(e) => {
            error!(error = %e, "Token exchange failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": EXCHANGE_FAILED })),
            )
                .into_response()
        }
    }
}

/// Serves the token endpoint on `addr` until Ctrl+C.
pub async fn serve(addr: SocketAddr, source: Arc<dyn TokenSource>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Token server listening");

    axum::serve(listener, router(source))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Token server shutting down");
        })
        .await?;
    Ok(())
}
