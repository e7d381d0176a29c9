//! BDD step definitions for the operator dashboard

use axum::body::Body;
use axum::http::{header, Method, Request};
use cucumber::{then, when};
use tower::ServiceExt;

use biogas_monitor::dashboard::build_router;

use crate::world::MonitorWorld;

async fn send(world: &mut MonitorWorld, request: Request<Body>) {
    let feeds = world.feeds();
    let api = world.api();
    let response = build_router(feeds, api).oneshot(request).await.unwrap();
    world.response_status = Some(response.status().as_u16());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    world.response_body = Some(String::from_utf8(body.to_vec()).unwrap());
}

fn json_body(world: &MonitorWorld) -> serde_json::Value {
    let body = world.response_body.as_ref().expect("no response body");
    serde_json::from_str(body).unwrap_or_else(|e| panic!("invalid JSON ({}): {}", e, body))
}

#[when(expr = "the dashboard path {string} is requested")]
async fn dashboard_get(world: &mut MonitorWorld, path: String) {
    let request = Request::builder().uri(path).body(Body::empty()).unwrap();
    send(world, request).await;
}

#[when(expr = "the dashboard is asked to predict pH {float} with production {float}")]
async fn dashboard_predict(world: &mut MonitorWorld, ph: f64, production: f64) {
    let body = serde_json::json!({ "ph": ph, "biogas_production": production });
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(world, request).await;
}

#[when("the dashboard reset button is pressed")]
async fn dashboard_reset(world: &mut MonitorWorld) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/reset-alarm")
        .body(Body::empty())
        .unwrap();
    send(world, request).await;
}

#[then(expr = "the dashboard should answer with HTTP {int}")]
fn dashboard_status(world: &mut MonitorWorld, code: u16) {
    assert_eq!(world.response_status, Some(code));
}

#[then(expr = "the page should contain {string}")]
fn page_contains(world: &mut MonitorWorld, expected: String) {
    let body = world.response_body.as_ref().expect("no response body");
    assert!(
        body.contains(&expected),
        "Expected response to contain '{}', but it didn't.\nResponse body:\n{}",
        expected,
        body
    );
}

#[then(expr = "the page should not contain {string}")]
fn page_lacks(world: &mut MonitorWorld, unexpected: String) {
    let body = world.response_body.as_ref().expect("no response body");
    assert!(
        !body.contains(&unexpected),
        "Expected response not to contain '{}'.\nResponse body:\n{}",
        unexpected,
        body
    );
}

#[then(expr = "the JSON field {string} should be {string}")]
fn json_field_is(world: &mut MonitorWorld, pointer: String, expected: String) {
    let json = json_body(world);
    let value = json
        .pointer(&pointer)
        .unwrap_or_else(|| panic!("no field at {} in {}", pointer, json));
    let actual = match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    assert_eq!(actual, expected, "field {} in {}", pointer, json);
}

#[then(expr = "the JSON array {string} should have {int} element(s)")]
fn json_array_len(world: &mut MonitorWorld, pointer: String, count: usize) {
    let json = json_body(world);
    let array = json
        .pointer(&pointer)
        .and_then(|v| v.as_array())
        .unwrap_or_else(|| panic!("no array at {} in {}", pointer, json));
    assert_eq!(array.len(), count);
}
