//! REST client for the vision-on-edge backend.
//!
//! Wraps the `/api/*` endpoints used by the console (entity CRUD,
//! status refresh, IoT hub discovery and kubeconfig verification) using
//! [`reqwest`]. Every record is normalized before it is returned.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use voe_core::entities::{
    AiSkill, AiSkillFromServer, Camera, CameraFromServer, ComputeDevice, ComputeDeviceFromServer,
    Deployment, DeploymentFromServer,
};
use voe_core::types::EntityId;
use voe_core::wizard::ai_skill::{CreateAiSkillPayload, UpdateAiSkillPayload};
use voe_core::wizard::camera::{CreateCameraPayload, UpdateCameraPayload};
use voe_core::wizard::compute_device::{CreateComputeDevicePayload, UpdateComputeDevicePayload};
use voe_core::wizard::deployment::{CreateDeploymentPayload, UpdateDeploymentPayload};

use crate::config::ClientConfig;

/// HTTP client for one backend instance.
#[derive(Debug, Clone)]
pub struct VoeApi {
    client: reqwest::Client,
    api_url: String,
}

/// Errors from the REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Backend API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A 2xx response whose body is not the expected JSON.
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct IothubList {
    #[serde(default)]
    iothub: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct IothubDeviceList {
    #[serde(default)]
    devices: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ValidateConfigRequest<'a> {
    config_data: &'a str,
}

impl VoeApi {
    /// Create a new API client.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://localhost:8000`.
    pub fn new(api_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
        }
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String) -> Self {
        Self { client, api_url }
    }

    /// Build a client with the configured request timeout.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self::with_client(client, config.api_url.clone()))
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    // ---- cameras ----

    pub async fn list_cameras(&self) -> Result<Vec<Camera>, ApiError> {
        let response = self.get("/api/cameras").send().await?;
        let cameras: Vec<CameraFromServer> = Self::parse_response(response).await?;
        Ok(cameras.into_iter().map(CameraFromServer::normalize).collect())
    }

    /// Fetch one camera with its connection status refreshed.
    pub async fn refresh_camera(&self, id: EntityId) -> Result<Camera, ApiError> {
        let response = self
            .get(&format!("/api/cameras/{id}/update_status"))
            .send()
            .await?;
        let camera: CameraFromServer = Self::parse_response(response).await?;
        Ok(camera.normalize())
    }

    pub async fn create_camera(&self, payload: &CreateCameraPayload) -> Result<Camera, ApiError> {
        let response = self.post("/api/cameras/").json(payload).send().await?;
        let camera: CameraFromServer = Self::parse_response(response).await?;
        Ok(camera.normalize())
    }

    pub async fn update_camera(
        &self,
        id: EntityId,
        payload: &UpdateCameraPayload,
    ) -> Result<Camera, ApiError> {
        let response = self
            .patch(&format!("/api/cameras/{id}"))
            .json(payload)
            .send()
            .await?;
        let camera: CameraFromServer = Self::parse_response(response).await?;
        Ok(camera.normalize())
    }

    pub async fn delete_cameras(&self, ids: &[EntityId]) -> Result<(), ApiError> {
        self.bulk_delete("/api/cameras/bulk-delete", ids).await
    }

    // ---- compute devices ----

    pub async fn list_compute_devices(&self) -> Result<Vec<ComputeDevice>, ApiError> {
        let response = self.get("/api/compute_devices").send().await?;
        let devices: Vec<ComputeDeviceFromServer> = Self::parse_response(response).await?;
        Ok(devices
            .into_iter()
            .map(ComputeDeviceFromServer::normalize)
            .collect())
    }

    /// Fetch one compute device with its connection status refreshed.
    pub async fn refresh_compute_device(&self, id: EntityId) -> Result<ComputeDevice, ApiError> {
        let response = self
            .get(&format!("/api/compute_devices/{id}/update_status"))
            .send()
            .await?;
        let device: ComputeDeviceFromServer = Self::parse_response(response).await?;
        Ok(device.normalize())
    }

    pub async fn create_compute_device(
        &self,
        payload: &CreateComputeDevicePayload,
    ) -> Result<ComputeDevice, ApiError> {
        let response = self
            .post("/api/compute_devices")
            .json(payload)
            .send()
            .await?;
        let device: ComputeDeviceFromServer = Self::parse_response(response).await?;
        Ok(device.normalize())
    }

    pub async fn update_compute_device(
        &self,
        id: EntityId,
        payload: &UpdateComputeDevicePayload,
    ) -> Result<ComputeDevice, ApiError> {
        let response = self
            .patch(&format!("/api/compute_devices/{id}"))
            .json(payload)
            .send()
            .await?;
        let device: ComputeDeviceFromServer = Self::parse_response(response).await?;
        Ok(device.normalize())
    }

    pub async fn delete_compute_devices(&self, ids: &[EntityId]) -> Result<(), ApiError> {
        self.bulk_delete("/api/compute_devices/bulk-delete", ids).await
    }

    /// IoT hubs visible to the backend's Azure credentials.
    pub async fn list_iothubs(&self) -> Result<Vec<String>, ApiError> {
        let response = self
            .get("/api/compute_devices/list-iothub")
            .send()
            .await?;
        let list: IothubList = Self::parse_response(response).await?;
        Ok(list.iothub)
    }

    /// Edge devices registered in `iothub`.
    pub async fn list_iothub_devices(&self, iothub: &str) -> Result<Vec<String>, ApiError> {
        let response = self
            .get("/api/compute_devices/list-devices")
            .query(&[("iothub", iothub)])
            .send()
            .await?;
        let list: IothubDeviceList = Self::parse_response(response).await?;
        Ok(list.devices)
    }

    /// Ask the backend whether a base64 kubeconfig can reach its cluster.
    pub async fn validate_config(&self, config_data: &str) -> Result<(), ApiError> {
        let response = self
            .post("/api/compute_devices/validate_config")
            .json(&ValidateConfigRequest { config_data })
            .send()
            .await?;
        Self::check_status(response).await
    }

    // ---- deployments ----

    pub async fn list_deployments(&self) -> Result<Vec<Deployment>, ApiError> {
        let response = self.get("/api/deployments/").send().await?;
        let deployments: Vec<DeploymentFromServer> = Self::parse_response(response).await?;
        Ok(deployments
            .into_iter()
            .map(DeploymentFromServer::normalize)
            .collect())
    }

    pub async fn create_deployment(
        &self,
        payload: &CreateDeploymentPayload,
    ) -> Result<Deployment, ApiError> {
        let response = self.post("/api/deployments/").json(payload).send().await?;
        let deployment: DeploymentFromServer = Self::parse_response(response).await?;
        Ok(deployment.normalize())
    }

    pub async fn update_deployment(
        &self,
        id: EntityId,
        payload: &UpdateDeploymentPayload,
    ) -> Result<Deployment, ApiError> {
        let response = self
            .patch(&format!("/api/deployments/{id}/"))
            .json(payload)
            .send()
            .await?;
        let deployment: DeploymentFromServer = Self::parse_response(response).await?;
        Ok(deployment.normalize())
    }

    pub async fn delete_deployment(&self, id: EntityId) -> Result<(), ApiError> {
        let response = self.delete(&format!("/api/deployments/{id}/")).send().await?;
        Self::check_status(response).await
    }

    // ---- AI skills (cascades) ----

    pub async fn list_ai_skills(&self) -> Result<Vec<AiSkill>, ApiError> {
        let response = self.get("/api/cascades").send().await?;
        let skills: Vec<AiSkillFromServer> = Self::parse_response(response).await?;
        Ok(skills.into_iter().map(AiSkillFromServer::normalize).collect())
    }

    pub async fn create_ai_skill(
        &self,
        payload: &CreateAiSkillPayload,
    ) -> Result<AiSkill, ApiError> {
        let response = self.post("/api/cascades/").json(payload).send().await?;
        let skill: AiSkillFromServer = Self::parse_response(response).await?;
        Ok(skill.normalize())
    }

    pub async fn update_ai_skill(
        &self,
        id: EntityId,
        payload: &UpdateAiSkillPayload,
    ) -> Result<AiSkill, ApiError> {
        let response = self
            .patch(&format!("/api/cascades/{id}"))
            .json(payload)
            .send()
            .await?;
        let skill: AiSkillFromServer = Self::parse_response(response).await?;
        Ok(skill.normalize())
    }

    pub async fn delete_ai_skill(&self, id: EntityId) -> Result<(), ApiError> {
        let response = self.delete(&format!("/api/cascades/{id}/")).send().await?;
        Self::check_status(response).await
    }

    // ---- private helpers ----

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        tracing::info!(method = %method, path, "Backend request");
        self.client.request(method, format!("{}{path}", self.api_url))
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(reqwest::Method::GET, path)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(reqwest::Method::POST, path)
    }

    fn patch(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(reqwest::Method::PATCH, path)
    }

    fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(reqwest::Method::DELETE, path)
    }

    /// `DELETE path?id=1&id=2`.
    async fn bulk_delete(&self, path: &str, ids: &[EntityId]) -> Result<(), ApiError> {
        let query: Vec<(&str, EntityId)> = ids.iter().map(|id| ("id", *id)).collect();
        let response = self.delete(path).query(&query).send().await?;
        Self::check_status(response).await
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`ApiError::Api`] containing
    /// the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let url = response.url().path().to_string();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::warn!(status = status.as_u16(), path = %url, body = %body, "Backend request failed");
            return Err(ApiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), ApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}
