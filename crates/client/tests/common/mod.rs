//! In-process fake backend for client integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::extract::{Path, RawQuery, State};
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use voe_client::VoeApi;

/// One request as the fake backend saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub body: Value,
}

#[derive(Debug, Clone, Default)]
pub struct Backend {
    pub requests: Arc<Mutex<Vec<Recorded>>>,
}

impl Backend {
    fn record(&self, method: Method, path: String, query: Option<String>, body: Value) {
        self.requests.lock().unwrap().push(Recorded {
            method,
            path,
            query,
            body,
        });
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn camera_json(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "rtsp": "rtsp://cam.local/stream",
        "media_source": null,
        "area": "{\"useAOI\": true, \"AOIs\": []}",
        "lines": "",
        "danger_zones": "",
        "is_demo": false,
        "location": 1,
        "media_type": "camera",
        "tag_list": "[{\"name\": \"site\", \"value\": \"north\"}]",
        "username": null,
        "password": null,
        "allowed_devices": "[\"device-1\"]",
        "snapshot": "",
        "is_live": true,
        "status": "{\"device-1\": \"connected\"}",
        "symphony_id": format!("camera-{id}")
    })
}

pub fn device_json(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "iothub": "hub-a",
        "iotedge_device": "dev-a",
        "architecture": "X64",
        "acceleration": "CPU",
        "tag_list": "",
        "symphony_id": format!("device-{id}"),
        "solution_id": "",
        "status": "",
        "is_k8s": false,
        "cluster_type": "current"
    })
}

pub fn skill_json(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "flow": "{\"nodes\": [], \"edges\": []}",
        "raw_data": "",
        "screenshot": "",
        "tag_list": "",
        "symphony_id": format!("skill-{id}"),
        "fps": "15.0",
        "acceleration": "CPU"
    })
}

pub fn deployment_json(id: i64, name: &str, skill: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "configure": format!("[{{\"camera\": \"camera-1\", \"skills\": [{{\"id\": \"{skill}\", \"configured\": true}}]}}]"),
        "tag_list": "",
        "symphony_id": format!("deployment-{id}"),
        "compute_device": 1,
        "status": "{\"status_code\": \"0\", \"status_description\": \"running\"}",
        "iothub_insights": ""
    })
}

fn with_id(mut body: Value, id: i64, symphony_prefix: &str) -> Value {
    if let Value::Object(map) = &mut body {
        map.insert("id".into(), json!(id));
        map.insert("symphony_id".into(), json!(format!("{symphony_prefix}-{id}")));
    }
    body
}

async fn list_cameras(State(backend): State<Backend>) -> Json<Value> {
    backend.record(Method::GET, "/api/cameras".into(), None, Value::Null);
    Json(json!([camera_json(1, "dock"), camera_json(2, "gate")]))
}

async fn camera_status(State(backend): State<Backend>, Path(id): Path<i64>) -> Json<Value> {
    backend.record(Method::GET, format!("/api/cameras/{id}/update_status"), None, Value::Null);
    Json(camera_json(id, "dock"))
}

async fn create_camera(State(backend): State<Backend>, Json(body): Json<Value>) -> Json<Value> {
    backend.record(Method::POST, "/api/cameras/".into(), None, body.clone());
    let name = body["name"].as_str().unwrap_or_default().to_string();
    Json(camera_json(10, &name))
}

async fn bulk_delete_cameras(State(backend): State<Backend>, RawQuery(query): RawQuery) -> StatusCode {
    backend.record(Method::DELETE, "/api/cameras/bulk-delete".into(), query, Value::Null);
    StatusCode::NO_CONTENT
}

async fn list_devices(State(backend): State<Backend>) -> Json<Value> {
    backend.record(Method::GET, "/api/compute_devices".into(), None, Value::Null);
    Json(json!([device_json(1, "edge-a")]))
}

async fn create_device(State(backend): State<Backend>, Json(body): Json<Value>) -> Json<Value> {
    backend.record(Method::POST, "/api/compute_devices".into(), None, body.clone());
    let mut created = with_id(body, 7, "device");
    if let Value::Object(map) = &mut created {
        map.insert("status".into(), json!(""));
        map.insert("solution_id".into(), json!(""));
    }
    Json(created)
}

async fn update_device(
    State(backend): State<Backend>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Json<Value> {
    backend.record(Method::PATCH, format!("/api/compute_devices/{id}"), None, body.clone());
    let mut updated = device_json(id, "edge-a");
    if let (Value::Object(map), Value::Object(changes)) = (&mut updated, body) {
        map.extend(changes);
    }
    Json(updated)
}

async fn list_iothubs(State(backend): State<Backend>) -> Json<Value> {
    backend.record(Method::GET, "/api/compute_devices/list-iothub".into(), None, Value::Null);
    Json(json!({"iothub": ["hub-a", "hub-b"]}))
}

async fn list_iothub_devices(State(backend): State<Backend>, RawQuery(query): RawQuery) -> Json<Value> {
    backend.record(Method::GET, "/api/compute_devices/list-devices".into(), query, Value::Null);
    Json(json!({"devices": ["dev-a"]}))
}

/// Accepts any kubeconfig except one encoding the text `bad`.
async fn validate_config(State(backend): State<Backend>, Json(body): Json<Value>) -> impl IntoResponse {
    backend.record(Method::POST, "/api/compute_devices/validate_config".into(), None, body.clone());
    if body["config_data"] == "YmFk" {
        (StatusCode::BAD_REQUEST, "cluster unreachable").into_response()
    } else {
        Json(json!({"status": "ok"})).into_response()
    }
}

async fn list_deployments(State(backend): State<Backend>) -> Json<Value> {
    backend.record(Method::GET, "/api/deployments/".into(), None, Value::Null);
    Json(json!([deployment_json(1, "line-1", "skill-1")]))
}

async fn list_skills(State(backend): State<Backend>) -> Json<Value> {
    backend.record(Method::GET, "/api/cascades".into(), None, Value::Null);
    Json(json!([skill_json(1, "counter"), skill_json(2, "unused")]))
}

async fn create_skill(State(backend): State<Backend>, Json(body): Json<Value>) -> Json<Value> {
    backend.record(Method::POST, "/api/cascades/".into(), None, body.clone());
    Json(with_id(body, 3, "skill"))
}

async fn delete_skill(State(backend): State<Backend>, Path(id): Path<i64>) -> StatusCode {
    backend.record(Method::DELETE, format!("/api/cascades/{id}/"), None, Value::Null);
    StatusCode::NO_CONTENT
}

async fn broken() -> &'static str {
    "<html>not json</html>"
}

pub fn router(backend: Backend) -> Router {
    Router::new()
        .route("/api/cameras", get(list_cameras))
        .route("/api/cameras/", post(create_camera))
        .route("/api/cameras/bulk-delete", delete(bulk_delete_cameras))
        .route("/api/cameras/{id}/update_status", get(camera_status))
        .route("/api/compute_devices", get(list_devices).post(create_device))
        .route("/api/compute_devices/{id}", patch(update_device))
        .route("/api/compute_devices/list-iothub", get(list_iothubs))
        .route("/api/compute_devices/list-devices", get(list_iothub_devices))
        .route("/api/compute_devices/validate_config", post(validate_config))
        .route("/api/deployments/", get(list_deployments))
        .route("/api/cascades", get(list_skills))
        .route("/api/cascades/", post(create_skill))
        .route("/api/cascades/{id}/", delete(delete_skill))
        .route("/broken/api/cameras", get(broken))
        .with_state(backend)
}

/// Serve the fake backend on an ephemeral port.
pub async fn spawn() -> (VoeApi, Backend) {
    let backend = Backend::default();
    let app = router(backend.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (VoeApi::new(format!("http://{addr}")), backend)
}
