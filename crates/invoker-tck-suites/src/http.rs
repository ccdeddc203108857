// crates/invoker-tck-suites/src/http.rs
// ============================================================================
// Module: HTTP Exchange Helpers
// Description: One-shot HTTP requests against a candidate instance.
// Purpose: Give verification procedures a small, failure-typed HTTP surface.
// Dependencies: reqwest, invoker-tck-core
// ============================================================================

//! ## Overview
//! Every transport error is converted into a [`VerificationFailure`] so a
//! procedure can use `?` throughout. Responses are fully buffered; bodies are
//! compared as text. Requests are bounded by [`REQUEST_TIMEOUT`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use invoker_tck_core::VerificationFailure;
use invoker_tck_core::runtime::DEFAULT_INSTANCE_HOST;
use reqwest::Client;
use reqwest::Method;
use reqwest::header::ACCEPT;
use reqwest::header::CONTENT_TYPE;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Upper bound on a single request, connect through body.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// SECTION: Request
// ============================================================================

/// Request sent to the candidate.
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    /// HTTP method.
    pub method: &'a Method,
    /// Request path, starting with `/`.
    pub path: &'a str,
    /// `Content-Type` header value.
    pub content_type: &'a str,
    /// `Accept` header value, if any.
    pub accept: Option<&'a str>,
    /// Request body.
    pub body: &'a str,
}

/// Buffered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// Status code.
    pub status: u16,
    /// Every `Content-Type` header value, in order.
    pub content_types: Vec<String>,
    /// Response body decoded lossily as UTF-8.
    pub body: String,
}

impl Exchange {
    /// Returns the media type of the single `Content-Type` header.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationFailure`] when the header is absent, repeated, or
    /// malformed.
    pub fn media_type(&self) -> Result<String, VerificationFailure> {
        let [value] = self.content_types.as_slice() else {
            return Err(VerificationFailure::new("No Content-Type set on response"));
        };
        parse_media_type(value)
            .map_err(|err| VerificationFailure::new(format!("Error parsing content-type: {err}")))
    }
}

/// Sends `request` to the candidate listening on `port`.
///
/// # Errors
///
/// Returns [`VerificationFailure`] on any transport error.
pub async fn send(port: u16, request: Request<'_>) -> Result<Exchange, VerificationFailure> {
    let url = format!("http://{DEFAULT_INSTANCE_HOST}:{port}{}", request.path);
    let client = Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|err| VerificationFailure::with_context("http client", err))?;
    let mut builder = client
        .request(request.method.clone(), &url)
        .header(CONTENT_TYPE, request.content_type)
        .body(request.body.to_string());
    if let Some(accept) = request.accept {
        builder = builder.header(ACCEPT, accept);
    }
    let context = format!("{} {url}", request.method);
    let response =
        builder.send().await.map_err(|err| VerificationFailure::with_context(&context, err))?;
    let status = response.status().as_u16();
    let content_types = response
        .headers()
        .get_all(CONTENT_TYPE)
        .iter()
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .collect();
    let body = response.bytes().await.map_err(|err| VerificationFailure::with_context(&context, err))?;
    Ok(Exchange {
        status,
        content_types,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

// ============================================================================
// SECTION: Media Types
// ============================================================================

/// Extracts the lowercase `type/subtype` from a `Content-Type` value,
/// ignoring parameters.
///
/// # Errors
///
/// Returns a message when the value is not a `type/subtype` pair of tokens.
pub fn parse_media_type(value: &str) -> Result<String, String> {
    let essence = value.split(';').next().unwrap_or_default().trim();
    let Some((kind, subtype)) = essence.split_once('/') else {
        return Err(format!("mime: expected slash after first token in '{value}'"));
    };
    if !is_token(kind) || !is_token(subtype) {
        return Err(format!("mime: invalid media type '{value}'"));
    }
    Ok(essence.to_ascii_lowercase())
}

/// Returns true for a non-empty RFC 7230 token.
fn is_token(text: &str) -> bool {
    !text.is_empty()
        && text.bytes().all(|byte| {
            byte.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&byte)
        })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
