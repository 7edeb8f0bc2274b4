//! Integration tests for the REST client against the fake backend.

mod common;

use assert_matches::assert_matches;
use axum::http::Method;

use voe_client::ApiError;
use voe_core::entities::ConnectionStatus;
use voe_core::wizard::camera::MediaType;

// ---------------------------------------------------------------------------
// Test: list responses are normalized
// ---------------------------------------------------------------------------

#[tokio::test]
async fn camera_list_is_normalized() {
    let (api, backend) = common::spawn().await;

    let cameras = api.list_cameras().await.unwrap();

    assert_eq!(cameras.len(), 2);
    let dock = &cameras[0];
    assert_eq!(dock.name, "dock");
    assert_eq!(dock.media_type, MediaType::Camera);
    assert!(dock.use_aoi);
    assert!(!dock.use_counting_line);
    assert_eq!(dock.tag_list.len(), 1);
    assert_eq!(dock.tag_list[0].value, "north");
    assert_eq!(dock.allowed_devices, ["device-1"]);
    assert_eq!(dock.status["device-1"], ConnectionStatus::Connected);
    assert_eq!(dock.username, "");

    assert_eq!(backend.recorded()[0].method, Method::GET);
}

#[tokio::test]
async fn deployment_and_skill_lists_are_normalized() {
    let (api, _backend) = common::spawn().await;

    let deployments = api.list_deployments().await.unwrap();
    assert_eq!(deployments[0].compute_device, "1");
    assert_eq!(deployments[0].status.status_description, "running");

    let skills = api.list_ai_skills().await.unwrap();
    assert_eq!(skills.len(), 2);
    assert_eq!(skills[0].fps, 15);
    assert!(skills[0].flow_payload().unwrap().nodes.is_empty());
}

// ---------------------------------------------------------------------------
// Test: query parameters
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bulk_delete_repeats_id_parameter() {
    let (api, backend) = common::spawn().await;

    api.delete_cameras(&[3, 5]).await.unwrap();

    let request = backend.recorded().pop().unwrap();
    assert_eq!(request.method, Method::DELETE);
    assert_eq!(request.query.as_deref(), Some("id=3&id=5"));
}

#[tokio::test]
async fn iothub_discovery() {
    let (api, backend) = common::spawn().await;

    assert_eq!(api.list_iothubs().await.unwrap(), ["hub-a", "hub-b"]);
    assert_eq!(api.list_iothub_devices("hub a").await.unwrap(), ["dev-a"]);
    let request = backend.recorded().pop().unwrap();
    assert_eq!(request.query.as_deref(), Some("iothub=hub+a"));
}

// ---------------------------------------------------------------------------
// Test: failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn non_success_status_carries_body() {
    let (api, _backend) = common::spawn().await;

    let err = api.validate_config("YmFk").await.unwrap_err();
    assert_matches!(err, ApiError::Api { status: 400, ref body } if body == "cluster unreachable");
}

#[tokio::test]
async fn unexpected_body_is_decode_error() {
    let (api, _backend) = common::spawn().await;
    let broken = voe_client::VoeApi::new(format!("{}/broken", api.api_url()));

    assert_matches!(broken.list_cameras().await, Err(ApiError::Decode(_)));
}

#[tokio::test]
async fn unknown_endpoint_is_api_error() {
    let (api, _backend) = common::spawn().await;

    assert_matches!(
        api.refresh_compute_device(1).await,
        Err(ApiError::Api { status: 404, .. })
    );
}

#[tokio::test]
async fn unreachable_backend_is_request_error() {
    let api = voe_client::VoeApi::new("http://127.0.0.1:9".into());

    assert_matches!(api.list_cameras().await, Err(ApiError::Request(_)));
}
