//! Kubeconfig upload for Kubernetes compute devices.
//!
//! A file is accepted into the device form only after the backend has
//! verified it. Any failure here blocks the upload and nothing else.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use voe_core::wizard::{ComputeDeviceForm, WizardController};

use crate::api::{ApiError, VoeApi};

const ALLOWED_EXTENSIONS: &[&str] = &["yaml", "yml"];

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Kubeconfig must be a .yaml or .yml file, got {0}")]
    Extension(String),

    #[error("Kubeconfig file is empty")]
    Empty,

    #[error("Kubeconfig is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Kubeconfig was rejected by the backend: {0}")]
    Rejected(#[source] ApiError),

    #[error("Kubeconfig could not be applied: {0}")]
    Form(#[from] voe_core::error::CoreError),
}

/// A kubeconfig read from disk, base64 encoded for the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubeConfigUpload {
    file_name: String,
    config_data: String,
}

/// A kubeconfig the backend accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedKubeConfig {
    pub file_name: String,
    pub config_data: String,
}

impl KubeConfigUpload {
    pub fn from_file(file_name: &str, bytes: Vec<u8>) -> Result<Self, UploadError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(UploadError::Extension(file_name.to_string()));
        }
        let text = String::from_utf8(bytes)?;
        if text.trim().is_empty() {
            return Err(UploadError::Empty);
        }
        Ok(Self {
            file_name: file_name.to_string(),
            config_data: STANDARD.encode(text.as_bytes()),
        })
    }

    pub fn config_data(&self) -> &str {
        &self.config_data
    }

    pub async fn verify(self, api: &VoeApi) -> Result<VerifiedKubeConfig, UploadError> {
        api.validate_config(&self.config_data)
            .await
            .map_err(UploadError::Rejected)?;
        tracing::info!(file = %self.file_name, "Kubeconfig verified");
        Ok(VerifiedKubeConfig {
            file_name: self.file_name,
            config_data: self.config_data,
        })
    }
}

impl VerifiedKubeConfig {
    /// Put the verified config into the device wizard.
    pub fn apply(
        self,
        wizard: &mut WizardController<ComputeDeviceForm>,
    ) -> Result<(), UploadError> {
        wizard.attach_kubeconfig(self.config_data)?;
        Ok(())
    }
}
