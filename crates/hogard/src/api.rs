use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Deserialize;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing::warn;

use crate::agent::Agent;
use crate::agent::AgentError;
use crate::whatsapp::extract_message;
use crate::whatsapp::InboundMessage;
use crate::whatsapp::Messenger;
use crate::whatsapp::SenderAllowlist;

/// Reply to anything that is not a text message
pub const NON_TEXT_REPLY: &str = "Solo acepto texto por ahora 🙂";

/// Reply when the agent answered with nothing
pub const EMPTY_ANSWER_REPLY: &str = "Hecho.";

pub const CONFIG_ERROR_REPLY: &str = "Error de configuración. Revisa los logs.";

pub const AGENT_ERROR_REPLY: &str = "Ocurrió un error procesando tu mensaje. Intenta de nuevo.";

/// Response for the /v1/ping endpoint
#[derive(Serialize)]
struct PingResponse {
    status: String,
}

/// Response for the /v1/info endpoint
#[derive(Serialize)]
struct InfoResponse {
    version: String,
    hostname: String,
}

/// Acknowledgement for every webhook delivery
#[derive(Serialize)]
struct AckResponse {
    ok: bool,
}

/// Query of the webhook verification handshake.
///
/// Meta sends `hub.*` names; the bare names are accepted as well.
#[derive(Debug, Deserialize)]
struct VerifyParams {
    #[serde(default, alias = "hub.mode")]
    mode: String,

    #[serde(default, alias = "hub.verify_token")]
    token: String,

    #[serde(default, alias = "hub.challenge")]
    challenge: String,
}

/// Shared application state
pub struct AppState {
    version: &'static str,
    verify_token: String,
    allowlist: SenderAllowlist,
    agent: Arc<dyn Agent>,
    messenger: Arc<dyn Messenger>,
}

impl AppState {
    pub fn new(
        verify_token: String,
        allowlist: SenderAllowlist,
        agent: Arc<dyn Agent>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            verify_token,
            allowlist,
            agent,
            messenger,
        }
    }
}

/// Handler for GET /v1/ping
#[tracing::instrument]
async fn ping() -> impl IntoResponse {
    tracing::debug!("Handling /v1/ping request");
    (
        StatusCode::OK,
        Json(PingResponse {
            status: "ok".to_string(),
        }),
    )
}

/// Handler for GET /v1/info
#[tracing::instrument(skip(state))]
async fn info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    tracing::debug!("Handling /v1/info request");

    let hostname = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());

    (
        StatusCode::OK,
        Json(InfoResponse {
            version: state.version.to_string(),
            hostname,
        }),
    )
}

/// Handler for GET /webhook (subscription handshake)
#[tracing::instrument(skip(state, params))]
async fn verify(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VerifyParams>,
) -> impl IntoResponse {
    if params.mode == "subscribe"
        && !state.verify_token.is_empty()
        && params.token == state.verify_token
    {
        info!("Webhook verified");
        (StatusCode::OK, params.challenge)
    } else {
        warn!("Webhook verification failed (mode '{}')", params.mode);
        (StatusCode::FORBIDDEN, "Verification failed".to_string())
    }
}

/// Handler for POST /webhook
///
/// Always acknowledges so the provider does not redeliver; the message itself
/// is processed in its own task.
#[tracing::instrument(skip(state, body))]
async fn receive(State(state): State<Arc<AppState>>, body: Bytes) -> impl IntoResponse {
    let ack = Json(AckResponse { ok: true });

    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Failed to parse webhook JSON: {}", e);
            return ack;
        }
    };

    let Some(message) = extract_message(&payload) else {
        tracing::debug!("Webhook delivery without a message");
        return ack;
    };

    if !state.allowlist.is_allowed(&message.from) {
        warn!("Ignoring message from unauthorized number {}", message.from);
        return ack;
    }

    tokio::spawn(handle_message(state, message));
    ack
}

/// Run one inbound message through the agent and send the reply
pub async fn handle_message(state: Arc<AppState>, message: InboundMessage) {
    let reply = match &message.text {
        None => NON_TEXT_REPLY.to_string(),
        Some(text) => {
            info!("Message from {}: {}", message.from, text);
            let prompt = format!(
                "Usuario: {}\nResponde con la acción realizada y usa las herramientas si hace falta.",
                text
            );
            match state.agent.run(&prompt).await {
                Ok(answer) if answer.trim().is_empty() => EMPTY_ANSWER_REPLY.to_string(),
                Ok(answer) => answer,
                Err(AgentError::Config(what)) => {
                    warn!("Agent configuration error: {} is not configured", what);
                    CONFIG_ERROR_REPLY.to_string()
                }
                Err(e) => {
                    warn!("Agent failed: {}", e);
                    AGENT_ERROR_REPLY.to_string()
                }
            }
        }
    };

    if let Err(e) = state.messenger.send_text(&message.from, &reply).await {
        warn!("Failed to reply to {}: {}", message.from, e);
    }
}

/// Create the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/ping", get(ping))
        .route("/v1/info", get(info))
        .route("/webhook", get(verify).post(receive))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP API server
///
/// This function will bind to the specified address and serve the API endpoints.
/// It will run until the provided shutdown signal is triggered.
///
/// # Arguments
/// * `listen` - The IP address to listen on (e.g., "0.0.0.0")
/// * `port` - The port to listen on (e.g., 8000)
/// * `state` - Agent, messenger and webhook policy shared by all requests
/// * `shutdown_rx` - A oneshot receiver that will trigger graceful shutdown
pub async fn serve(
    listen: &str,
    port: u16,
    state: Arc<AppState>,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", listen, port).parse()?;
    info!("Starting HTTP API server on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_rx.await.ok();
            info!("HTTP API server shutting down gracefully");
        })
        .await?;

    Ok(())
}
