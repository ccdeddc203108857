// system-tests/tests/docker.rs
// ============================================================================
// Module: Docker System Tests
// Description: Built-in suites against a real candidate image under Docker.
// Purpose: Exercise the testcontainers engine and config wiring end to end.
// Dependencies: invoker-tck-config, invoker-tck-core, invoker-tck-docker, invoker-tck-suites
// ============================================================================

//! ## Overview
//! Requires a Docker daemon and `INVOKER_TCK_SYSTEM_TEST_IMAGE` naming a
//! request/reply candidate image. Without either the tests return early,
//! unless `INVOKER_TCK_SYSTEM_TEST_REQUIRE_DOCKER` demands Docker.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;

use invoker_tck_config::TckConfig;
use invoker_tck_core::CaseStatus;
use invoker_tck_core::ImageRef;
use invoker_tck_core::LifecycleManager;
use invoker_tck_core::MemoryEventSink;
use invoker_tck_core::ReadinessProber;
use invoker_tck_core::RunOptions;
use invoker_tck_core::Runner;
use invoker_tck_core::TckEventKind;
use invoker_tck_core::runtime::EXIT_PASSED;
use invoker_tck_core::runtime::summarize;
use invoker_tck_docker::TestcontainersEngine;
use invoker_tck_docker::ensure_docker_available;
use invoker_tck_suites::all_suites;
use invoker_tck_suites::request_reply;
use system_tests::config::SystemTestConfig;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the candidate image when Docker scenarios should run.
fn docker_image(system: &SystemTestConfig) -> Result<Option<String>, String> {
    if let Err(err) = ensure_docker_available() {
        if system.require_docker {
            return Err(err.to_string());
        }
        return Ok(None);
    }
    Ok(system.image.clone())
}

/// Builds the TCK configuration mapping the suite image to `image`.
fn tck_config(system: &SystemTestConfig, image: String) -> TckConfig {
    let mut config = TckConfig::default();
    config.images.insert(request_reply::IMAGE.to_string(), image);
    config.run.verification_timeout_sec = system.timeout.map(|timeout| timeout.as_secs());
    config.validate().expect("system test config");
    config
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn candidate_image_conforms_to_request_reply() -> Result<(), Box<dyn std::error::Error>> {
    let system = SystemTestConfig::load()?;
    let Some(image) = docker_image(&system)? else {
        return Ok(());
    };
    let config = tck_config(&system, image.clone());

    let engine = Arc::new(TestcontainersEngine::new());
    let events = Arc::new(MemoryEventSink::new());
    let lifecycle = LifecycleManager::new(
        engine.clone(),
        config.port_allocator(),
        ReadinessProber::new(config.readiness_policy()),
    )
    .with_images(config.image_resolver())
    .with_events(events.clone());
    let runner = Runner::new(Arc::new(lifecycle), config.run_options());

    let reports = runner.run_all(&all_suites()?).await?;

    let summary = summarize(&reports);
    assert_eq!(summary.exit_code, EXIT_PASSED, "{}", summary.rendered);
    assert_eq!(engine.tracked().await, 0);
    let pulled = ImageRef::new(image);
    assert!(events.kinds().iter().any(|kind| matches!(
        kind,
        TckEventKind::ImagePulled { image } if *image == pulled
    )));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_image_fails_every_case() -> Result<(), Box<dyn std::error::Error>> {
    let system = SystemTestConfig::load()?;
    if docker_image(&system)?.is_none() {
        return Ok(());
    }
    let config = tck_config(&system, "invoker-tck/does-not-exist:0.0.0".to_string());

    let engine = Arc::new(TestcontainersEngine::new());
    let lifecycle = LifecycleManager::new(
        engine.clone(),
        config.port_allocator(),
        ReadinessProber::new(config.readiness_policy()),
    )
    .with_images(config.image_resolver());
    let runner = Runner::new(Arc::new(lifecycle), RunOptions::default());

    let reports = runner.run_all(&all_suites()?).await?;

    assert!(reports[0].outcomes.iter().all(|outcome| outcome.status == CaseStatus::Failed));
    assert_eq!(engine.tracked().await, 0);
    Ok(())
}
