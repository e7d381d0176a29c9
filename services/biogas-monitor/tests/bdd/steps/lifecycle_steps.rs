//! BDD step definitions for the monitor builder and lifecycle

use std::sync::Arc;

use cucumber::{given, then, when};
use tokio_util::sync::CancellationToken;

use biogas_monitor::io::HttpClient;
use biogas_monitor::MonitorServiceBuilder;

use crate::world::MonitorWorld;

fn build_monitor_builder(world: &mut MonitorWorld) -> MonitorServiceBuilder {
    let http: Arc<dyn HttpClient> = world.backend();
    let mut builder = MonitorServiceBuilder::new(world.config.clone()).with_http_client(http);
    if let Some(cancel) = world.cancel.take() {
        builder = builder.with_cancellation_token(cancel);
    }
    builder
}

#[given("a default monitor config without dashboard")]
fn default_config(world: &mut MonitorWorld) {
    world.config.dashboard.enabled = false;
}

#[given(expr = "the API base URL is {string}")]
fn base_url(world: &mut MonitorWorld, url: String) {
    world.config.api.base_url = url;
}

#[given(expr = "a sensor polling interval of {int} seconds")]
fn sensor_interval(world: &mut MonitorWorld, seconds: u64) {
    world.config.polling.sensor_interval_seconds = seconds;
}

#[given("a pre-cancelled cancellation token")]
fn pre_cancelled_token(world: &mut MonitorWorld) {
    let token = CancellationToken::new();
    token.cancel();
    world.cancel = Some(token);
}

#[when("the monitor is built")]
fn monitor_is_built(world: &mut MonitorWorld) {
    let builder = build_monitor_builder(world);
    world.build_succeeded = Some(builder.build().is_ok());
}

#[when("the monitor is built and started")]
async fn monitor_is_built_and_started(world: &mut MonitorWorld) {
    let builder = build_monitor_builder(world);
    match builder.build() {
        Ok(monitor) => {
            world.build_succeeded = Some(true);
            world.start_succeeded = Some(monitor.start().await.is_ok());
        }
        Err(_) => {
            world.build_succeeded = Some(false);
            world.start_succeeded = Some(false);
        }
    }
}

#[then("the build should succeed")]
fn build_should_succeed(world: &mut MonitorWorld) {
    assert_eq!(
        world.build_succeeded,
        Some(true),
        "Expected build to succeed"
    );
}

#[then("the build should fail")]
fn build_should_fail(world: &mut MonitorWorld) {
    assert_eq!(world.build_succeeded, Some(false), "Expected build to fail");
}

#[then("the lifecycle should complete successfully")]
fn lifecycle_should_complete(world: &mut MonitorWorld) {
    assert_eq!(
        world.build_succeeded,
        Some(true),
        "Expected build to succeed"
    );
    assert_eq!(
        world.start_succeeded,
        Some(true),
        "Expected start to succeed"
    );
}
