use axum::Json;
use serde_json::{json, Value};

/// Liveness probe
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "It worked!!" }))
}
