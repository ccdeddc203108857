// system-tests/src/candidate.rs
// ============================================================================
// Module: Reference Candidate
// Description: HTTP function invoker wrapping an uppercase function.
// Purpose: Give the request/reply suite a known-good and known-bad target.
// Dependencies: axum, serde_json, tokio
// ============================================================================

//! ## Overview
//! A [`Candidate`] is an axum application exposing the "uppercase" function.
//! [`Candidate::Compliant`] follows every request/reply rule,
//! [`Candidate::MandatoryOnly`] skips the 415/406 negotiation statuses, and
//! [`Candidate::NonCompliant`] answers every route. [`CandidateServer`] binds
//! one to a socket and shuts it down on request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header::ACCEPT;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::post;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Plain text media type.
const TEXT_PLAIN: &str = "text/plain";
/// JSON media type.
const APPLICATION_JSON: &str = "application/json";
/// Time allowed for in-flight requests after shutdown is signalled.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

// ============================================================================
// SECTION: Candidate
// ============================================================================

/// Degree of request/reply compliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    /// Satisfies every case, mandatory and optional.
    Compliant,
    /// Satisfies the MUST cases only.
    MandatoryOnly,
    /// Replies with the function output on every route and method.
    NonCompliant,
}

impl Candidate {
    /// Builds the axum application.
    #[must_use]
    pub fn router(self) -> Router {
        match self {
            Self::Compliant => Router::new().route("/", post(invoke)).with_state(Negotiation::Strict),
            Self::MandatoryOnly => {
                Router::new().route("/", post(invoke)).with_state(Negotiation::Lenient)
            }
            Self::NonCompliant => Router::new().fallback(answer_anything),
        }
    }
}

/// Handling of unsupported media types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Negotiation {
    /// Reject with 415 and 406.
    Strict,
    /// Fall back to plain text.
    Lenient,
}

/// Output encoding chosen from `Accept`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    /// `text/plain`.
    Text,
    /// `application/json`.
    Json,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Decodes the input, applies the function, and encodes the output.
async fn invoke(
    State(negotiation): State<Negotiation>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let content_type = header_text(&headers, CONTENT_TYPE.as_str()).map(|value| essence(&value));
    let input = match content_type.as_deref() {
        Some(APPLICATION_JSON) => match serde_json::from_str::<String>(&body) {
            Ok(input) => input,
            Err(err) => {
                return (StatusCode::INTERNAL_SERVER_ERROR, format!("decode: {err}"))
                    .into_response();
            }
        },
        Some(TEXT_PLAIN) | None => body,
        Some(_) if negotiation == Negotiation::Lenient => body,
        Some(other) => {
            return (StatusCode::UNSUPPORTED_MEDIA_TYPE, format!("unsupported {other}"))
                .into_response();
        }
    };
    let output = input.to_uppercase();
    let accept = header_text(&headers, ACCEPT.as_str()).unwrap_or_else(|| "*/*".to_string());
    let encoding = match choose_encoding(&accept) {
        Some(encoding) => encoding,
        None if negotiation == Negotiation::Lenient => Encoding::Text,
        None => return (StatusCode::NOT_ACCEPTABLE, format!("cannot produce {accept}")).into_response(),
    };
    encode(encoding, &output)
}

/// Replies with the function output regardless of the request.
async fn answer_anything() -> Response {
    encode(Encoding::Text, "HELLO")
}

/// Encodes `output` with a single `Content-Type`.
fn encode(encoding: Encoding, output: &str) -> Response {
    let (media_type, body) = match encoding {
        Encoding::Text => (TEXT_PLAIN, output.to_string()),
        Encoding::Json => match serde_json::to_string(output) {
            Ok(body) => (APPLICATION_JSON, body),
            Err(err) => {
                return (StatusCode::INTERNAL_SERVER_ERROR, format!("encode: {err}"))
                    .into_response();
            }
        },
    };
    (StatusCode::OK, [(CONTENT_TYPE, HeaderValue::from_static(media_type))], body).into_response()
}

// ============================================================================
// SECTION: Media Types
// ============================================================================

/// Returns a header value as text, if present and visible ASCII.
fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|value| value.to_str().ok()).map(str::to_string)
}

/// Lowercase `type/subtype` of a media type, without parameters.
fn essence(value: &str) -> String {
    value.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
}

/// Picks the first supported encoding listed in `accept`.
fn choose_encoding(accept: &str) -> Option<Encoding> {
    accept.split(',').map(essence).find_map(|range| {
        match range.as_str() {
            TEXT_PLAIN | "text/*" | "*/*" => Some(Encoding::Text),
            APPLICATION_JSON | "application/*" => Some(Encoding::Json),
            _ => None,
        }
    })
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Candidate bound to a socket.
pub struct CandidateServer {
    /// Bound address.
    address: SocketAddr,
    /// Shutdown trigger, taken on shutdown.
    shutdown: Option<oneshot::Sender<()>>,
    /// Serving task.
    task: JoinHandle<()>,
}

impl CandidateServer {
    /// Binds `candidate` to `address` and starts serving.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the address cannot be bound.
    pub async fn bind(candidate: Candidate, address: SocketAddr) -> io::Result<Self> {
        let listener = TcpListener::bind(address).await?;
        let address = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let app = candidate.router();
        let task = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });
        Ok(Self {
            address,
            shutdown: Some(shutdown_tx),
            task,
        })
    }

    /// Returns the bound address.
    #[must_use]
    pub const fn address(&self) -> SocketAddr {
        self.address
    }

    /// Stops accepting connections and waits briefly for in-flight requests.
    pub async fn shutdown(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if tokio::time::timeout(SHUTDOWN_GRACE, &mut self.task).await.is_err() {
            self.task.abort();
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
