#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use sih_erp::{app, AppState, Catalog, Hub, MemoryStore, Registry, Settings};
use tower::ServiceExt;

/// Router over a fresh in-memory store, plus the hub it publishes to.
pub fn test_app() -> (Router, Hub) {
    let catalog = Catalog::standard().unwrap();
    let hub = Hub::default();
    let store = MemoryStore::new(&catalog);
    let registry = Registry::memory(catalog, &store, hub.clone());
    let settings = Settings::from_lookup(|_| None).unwrap();
    (app(AppState::new(registry, hub.clone(), store), &settings), hub)
}

pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, String) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

pub async fn json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let (status, text) = send(app, req).await;
    let value = if text.is_empty() { Value::Null } else { serde_json::from_str(&text).unwrap() };
    (status, value)
}

pub async fn soap(app: &Router, uri: &str, action: Option<&str>, envelope: &str) -> (StatusCode, String) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "text/xml; charset=utf-8");
    if let Some(a) = action {
        builder = builder.header("SOAPAction", a);
    }
    send(app, builder.body(Body::from(envelope.to_string())).unwrap()).await
}

/// Wrap an operation element in a SOAP 1.1 envelope.
pub fn envelope(operation: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <soap:Body>{}</soap:Body>
</soap:Envelope>"#,
        operation
    )
}
