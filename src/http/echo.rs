//! Placeholder application routes.
//!
//! The binary has no business handlers of its own; these echo what the
//! pipeline handed over so deployments and `shield-cli probe` can see the
//! sanitized envelope and the session decision.

use axum::{
    extract::Path,
    routing::{any, get},
    Extension, Json, Router,
};
use serde_json::{json, Value};

use crate::error::ShieldResult;
use crate::security::RequestEnvelope;
use crate::session::SessionContext;
use crate::validation::{number_value, validate_id, validate_pagination};

pub fn router() -> Router {
    Router::new()
        .route("/api/echo", any(echo))
        .route("/api/echo/{id}", any(echo_item))
        .route("/api/products", get(list_products))
}

fn describe(envelope: Option<RequestEnvelope>, session: Option<SessionContext>) -> Value {
    let envelope = envelope.unwrap_or_default();
    json!({
        "body": envelope.body,
        "params": envelope.params,
        "query": envelope.query,
        "session": session.map(|s| s.id),
    })
}

async fn echo(
    envelope: Option<Extension<RequestEnvelope>>,
    session: Option<Extension<SessionContext>>,
) -> Json<Value> {
    Json(describe(envelope.map(|e| e.0), session.map(|s| s.0)))
}

async fn echo_item(
    Path(id): Path<String>,
    envelope: Option<Extension<RequestEnvelope>>,
    session: Option<Extension<SessionContext>>,
) -> ShieldResult<Json<Value>> {
    let id = validate_id(&Value::String(id), "id")?;
    let mut out = describe(envelope.map(|e| e.0), session.map(|s| s.0));
    out["id"] = number_value(id);
    Ok(Json(out))
}

async fn list_products(envelope: Option<Extension<RequestEnvelope>>) -> ShieldResult<Json<Value>> {
    let query = envelope.map(|e| e.0.query).unwrap_or_default();
    let page = validate_pagination(query)?;
    Ok(Json(json!({ "items": [], "pagination": page })))
}
