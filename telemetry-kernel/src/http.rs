/**
 * API HTTP - Serveur Axum du kernel de télémétrie
 *
 * RÔLE :
 * Couche mince entre la query string et le TelemetryStore.
 *
 * ROUTES :
 * - GET  /info                          -> {"UUID": ...} identité de l'instance
 * - GET|POST /telemetry/setVesselTelemetry -> upsert puis snapshot complet
 * - GET  /telemetry/getVessels          -> snapshot complet
 *
 * Toutes les réponses sont du JSON en 200 ; les erreurs passent par `errorcode`.
 */

use crate::codes::ErrorCode;
use crate::identity::{InfoResponse, InstanceIdentity};
use crate::models::VesselTelemetry;
use crate::params::{telemetry_from_query, QueryParams};
use crate::store::{now_millis, SharedStore};
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub identity: InstanceIdentity,
}

#[derive(Debug, Serialize)]
struct VesselsResponse {
    errorcode: ErrorCode,
    vessels: Vec<VesselTelemetry>,
    count: usize,
    timestamp: i64,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    errorcode: ErrorCode,
}

fn vessels_response(store: &SharedStore) -> Response {
    let vessels = store.snapshot();
    Json(VesselsResponse {
        errorcode: ErrorCode::Success,
        count: vessels.len(),
        vessels,
        timestamp: now_millis(),
    })
    .into_response()
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/info", get(info))
        .route(
            "/telemetry/setVesselTelemetry",
            get(set_vessel_telemetry).post(set_vessel_telemetry),
        )
        .route("/telemetry/getVessels", get(get_vessels))
        .with_state(app_state)
}

/// Sert le router jusqu'à annulation du token (arrêt propre)
pub async fn serve(listener: TcpListener, app_state: AppState, shutdown: CancellationToken) -> std::io::Result<()> {
    axum::serve(listener, build_router(app_state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

// GET /info
async fn info(State(app): State<AppState>, headers: HeaderMap) -> Json<InfoResponse> {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    log::info!("[http] health check request from {}", host);
    Json(app.identity.info())
}

// GET|POST /telemetry/setVesselTelemetry
async fn set_vessel_telemetry(
    State(app): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let (key, telemetry) = match telemetry_from_query(&QueryParams(params)) {
        Ok(parsed) => parsed,
        Err(code) => return Json(ErrorResponse { errorcode: code }).into_response(),
    };

    let saved = app.store.upsert(&key, telemetry);
    log::info!(
        "[http] saved telemetry for vessel {}: X={}, Y={}, Z={}, Direction={}",
        key, saved.x, saved.y, saved.z, saved.direction
    );

    vessels_response(&app.store)
}

// GET /telemetry/getVessels
async fn get_vessels(State(app): State<AppState>) -> Response {
    vessels_response(&app.store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TelemetryStore;
    use serde_json::Value;

    fn app_state() -> AppState {
        AppState {
            store: TelemetryStore::shared(),
            identity: InstanceIdentity::new(),
        }
    }

    fn params(pairs: &[(&str, &str)]) -> Query<Vec<(String, String)>> {
        Query(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    async fn body_json(resp: Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_id_does_not_touch_store() {
        let app = app_state();
        let resp = set_vessel_telemetry(State(app.clone()), params(&[("type", "2")])).await;
        assert_eq!(body_json(resp).await, serde_json::json!({ "errorcode": 1201 }));
        assert_eq!(app.store.len(), 0);
    }

    #[tokio::test]
    async fn test_missing_type_does_not_touch_store() {
        let app = app_state();
        let resp = set_vessel_telemetry(State(app.clone()), params(&[("veh_id", "5")])).await;
        assert_eq!(body_json(resp).await, serde_json::json!({ "errorcode": 1202 }));
        assert_eq!(app.store.len(), 0);
    }

    #[tokio::test]
    async fn test_set_returns_full_snapshot() {
        let app = app_state();
        set_vessel_telemetry(State(app.clone()), params(&[("veh_id", "1"), ("type", "1")])).await;
        let resp = set_vessel_telemetry(State(app.clone()), params(&[("veh_id", "2"), ("type", "4")])).await;

        let after = now_millis();
        let json = body_json(resp).await;
        assert_eq!(json["errorcode"], -1);
        assert_eq!(json["count"], 2);
        assert_eq!(json["vessels"].as_array().unwrap().len(), 2);
        assert!(json["timestamp"].as_i64().unwrap() <= after);
    }

    #[tokio::test]
    async fn test_malformed_id_stored_under_raw_key() {
        let app = app_state();
        set_vessel_telemetry(
            State(app.clone()),
            params(&[("veh_id", "abc"), ("type", "2"), ("veh_x", "notanumber")]),
        )
        .await;

        let json = body_json(get_vessels(State(app.clone())).await).await;
        let vessel = &json["vessels"][0];
        assert_eq!(vessel["id"], -1);
        assert_eq!(vessel["x"], 0.0);

        // même clé brute -> remplacement, pas de doublon
        set_vessel_telemetry(State(app.clone()), params(&[("veh_id", "abc"), ("type", "3")])).await;
        assert_eq!(app.store.len(), 1);
        assert_eq!(app.store.snapshot()[0].vessel_type.code(), 3);
    }

    #[tokio::test]
    async fn test_get_vessels_empty() {
        let json = body_json(get_vessels(State(app_state())).await).await;
        assert_eq!(json["errorcode"], -1);
        assert_eq!(json["count"], 0);
        assert_eq!(json["vessels"], serde_json::json!([]));
    }

    async fn spawn_server() -> (String, AppState, CancellationToken) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let app = app_state();
        let shutdown = CancellationToken::new();
        tokio::spawn(serve(listener, app.clone(), shutdown.clone()));
        (base, app, shutdown)
    }

    #[tokio::test]
    async fn test_end_to_end_set_then_get() {
        let (base, _app, shutdown) = spawn_server().await;
        let client = reqwest::Client::new();

        let set = client
            .get(format!(
                "{base}/telemetry/setVesselTelemetry?veh_id=42&veh_x=1.5&veh_y=2.5&veh_z=0&veh_abs_spd=10&veh_dir=90&type=2&tgt_x=0&tgt_y=0"
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(set.status(), 200);
        assert_eq!(
            set.headers()[reqwest::header::CONTENT_TYPE].to_str().unwrap(),
            "application/json"
        );

        let json: Value = client
            .get(format!("{base}/telemetry/getVessels"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(json["errorcode"], -1);
        assert_eq!(json["count"], 1);
        let vessel = &json["vessels"][0];
        assert_eq!(vessel["id"], 42);
        assert_eq!(vessel["x"], 1.5);
        assert_eq!(vessel["y"], 2.5);
        assert_eq!(vessel["type"], 2);
        assert_eq!(vessel["hastgt"], false);

        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_end_to_end_post_and_info() {
        let (base, app, shutdown) = spawn_server().await;
        let client = reqwest::Client::new();

        let json: Value = client
            .post(format!("{base}/telemetry/setVesselTelemetry?veh_id=7&type=3&tgt_x=3&tgt_y=5"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(json["count"], 1);
        assert_eq!(json["vessels"][0]["hastgt"], true);

        let info: Value = client
            .get(format!("{base}/info"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(info["UUID"], app.identity.uuid().to_string());

        let again: Value = client.get(format!("{base}/info")).send().await.unwrap().json().await.unwrap();
        assert_eq!(again, info);

        shutdown.cancel();
    }
}
