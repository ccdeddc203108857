// crates/invoker-tck-suites/src/request_reply.rs
// ============================================================================
// Module: Request / Reply Suite
// Description: Conformance cases for HTTP request/reply function invokers.
// Purpose: Check routing, content negotiation, and error statuses.
// Dependencies: invoker-tck-core, reqwest
// ============================================================================

//! ## Overview
//! The candidate wraps an "uppercase" function and must expose it on `POST /`,
//! honor `Accept` for `text/plain` and `application/json`, and map decoding and
//! encoding problems onto HTTP statuses. Requirement levels follow RFC 2119
//! wording in each description.

// ============================================================================
// SECTION: Imports
// ============================================================================

use invoker_tck_core::Suite;
use invoker_tck_core::SuiteError;
use invoker_tck_core::TestCase;
use invoker_tck_core::TestCaseBuilder;
use invoker_tck_core::VerificationFailure;
use reqwest::Method;

use crate::http::Exchange;
use crate::http::Request;
use crate::http::send;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Suite name.
pub const SUITE_NAME: &str = "rr";
/// Suite description.
pub const SUITE_DESCRIPTION: &str = "Request / Reply Interaction";
/// Port the candidate listens on inside its container.
pub const DEFAULT_PORT: u16 = 8080;
/// Logical image of the uppercase function.
pub const IMAGE: &str = "upper";

/// Request body sent to the function.
const INPUT: &str = "hello";
/// Expected function output.
const OUTPUT: &str = "HELLO";
/// Plain text media type.
const TEXT_PLAIN: &str = "text/plain";
/// JSON media type.
const APPLICATION_JSON: &str = "application/json";

// ============================================================================
// SECTION: Suite
// ============================================================================

/// Builds the request/reply suite.
///
/// # Errors
///
/// Returns [`SuiteError`] if a case declaration is invalid.
pub fn suite() -> Result<Suite, SuiteError> {
    let cases = vec![
        case("rr-0001", "MUST NOT reply on paths other than / or methods other than POST")
            .verify(rejects_other_routes)
            .build()?,
        case("rr-0002", "MUST honor the Accept header").verify(honors_accept).build()?,
        case("rr-0003", "SHOULD reply with 415 on unrecognized Content-Type")
            .optional()
            .verify(rejects_unknown_content_type)
            .build()?,
        case("rr-0004", "MUST reply with 5xx on unmarshalling error")
            .verify(fails_on_malformed_input)
            .build()?,
        case("rr-0005", "SHOULD reply with 406 on inability to marshall back")
            .optional()
            .verify(rejects_unacceptable_output)
            .build()?,
    ];
    Suite::new(SUITE_NAME, SUITE_DESCRIPTION, DEFAULT_PORT, cases)
}

/// Starts a case declaration bound to the suite image.
fn case(name: &str, description: &str) -> TestCaseBuilder {
    TestCase::builder(name).description(description).image(IMAGE)
}

// ============================================================================
// SECTION: Verification Procedures
// ============================================================================

/// rr-0001: the function is reachable only through `POST /`.
///
/// # Errors
///
/// Returns [`VerificationFailure`] when another route produces the output.
pub async fn rejects_other_routes(port: u16) -> Result<(), VerificationFailure> {
    for (method, path) in [(Method::POST, "/bogus"), (Method::PUT, "/")] {
        let exchange = send(port, Request {
            method: &method,
            path,
            content_type: TEXT_PLAIN,
            accept: None,
            body: INPUT,
        })
        .await?;
        if exchange.body == OUTPUT {
            return Err(VerificationFailure::new("The function should only be exposed on /"));
        }
    }
    Ok(())
}

/// rr-0002: the reply is encoded according to `Accept`.
///
/// # Errors
///
/// Returns [`VerificationFailure`] on a wrong status, body, or content type.
pub async fn honors_accept(port: u16) -> Result<(), VerificationFailure> {
    for (accept, expected) in [(TEXT_PLAIN, OUTPUT.to_string()), (APPLICATION_JSON, format!("\"{OUTPUT}\""))]
    {
        let exchange = post_root(port, TEXT_PLAIN, accept, INPUT).await?;
        expect_status(&exchange, 200)?;
        if exchange.body != expected {
            return Err(VerificationFailure::new(format!(
                "Expected result as {accept} {expected}, got {}",
                exchange.body
            )));
        }
        let media_type = exchange.media_type()?;
        if media_type != accept {
            return Err(VerificationFailure::new(format!(
                "Expected response Content-Type to be set to {accept}, got {media_type}"
            )));
        }
    }
    Ok(())
}

/// rr-0003: an unrecognized request content type is refused with 415.
///
/// # Errors
///
/// Returns [`VerificationFailure`] on any other status.
pub async fn rejects_unknown_content_type(port: u16) -> Result<(), VerificationFailure> {
    let exchange = post_root(port, "bogus/content-type", TEXT_PLAIN, INPUT).await?;
    if exchange.status != 415 {
        return Err(VerificationFailure::new(format!(
            "Expected 415 http code, got {}",
            exchange.status
        )));
    }
    Ok(())
}

/// rr-0004: a body that fails to decode yields a server error.
///
/// # Errors
///
/// Returns [`VerificationFailure`] when the status is below 500.
pub async fn fails_on_malformed_input(port: u16) -> Result<(), VerificationFailure> {
    let exchange = post_root(port, APPLICATION_JSON, TEXT_PLAIN, "\"hello").await?;
    if exchange.status < 500 {
        return Err(VerificationFailure::new(format!(
            "Expected 5xx http code, got {}",
            exchange.status
        )));
    }
    Ok(())
}

/// rr-0005: an output that cannot be encoded as requested yields 406.
///
/// # Errors
///
/// Returns [`VerificationFailure`] on any other status.
pub async fn rejects_unacceptable_output(port: u16) -> Result<(), VerificationFailure> {
    let exchange = post_root(port, TEXT_PLAIN, "not/gonna-happen", INPUT).await?;
    if exchange.status != 406 {
        return Err(VerificationFailure::new(format!(
            "Expected 406 http code, got {}",
            exchange.status
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Posts `body` to `/` with the given content type and accept headers.
async fn post_root(
    port: u16,
    content_type: &str,
    accept: &str,
    body: &str,
) -> Result<Exchange, VerificationFailure> {
    send(port, Request {
        method: &Method::POST,
        path: "/",
        content_type,
        accept: Some(accept),
        body,
    })
    .await
}

/// Fails unless the exchange carries `expected`.
fn expect_status(exchange: &Exchange, expected: u16) -> Result<(), VerificationFailure> {
    if exchange.status == expected {
        Ok(())
    } else {
        Err(VerificationFailure::new(format!(
            "Expected http status {expected}, got {}",
            exchange.status
        )))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
