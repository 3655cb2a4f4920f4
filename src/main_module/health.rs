use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use log::warn;

use crate::core::shared::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let store_ok = match state.crm.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Health check: store unavailable: {e}");
            false
        }
    };

    let status = if store_ok { "healthy" } else { "degraded" };
    let code = if store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(serde_json::json!({
            "status": status,
            "service": "crmserver",
            "version": env!("CARGO_PKG_VERSION"),
            "database": store_ok
        })),
    )
}
