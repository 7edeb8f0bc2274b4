//! Compute device wizard: basics, tag, preview.
//!
//! A device is either an IoT Edge device (identified by hub and device
//! id) or a Kubernetes cluster (the current one, or another one described
//! by an uploaded kubeconfig).

use serde::{Deserialize, Serialize};

use crate::entities::ComputeDevice;
use crate::error::CoreError;
use crate::tags::TagList;
use crate::types::EntityKind;
use crate::validation::{
    check_name, check_option, check_required, ERROR_ACCELERATION_UNSUPPORTED, ERROR_FILE_BLANK,
    UNSET_OPTION,
};
use crate::wizard::{
    field_value, unknown_field, Checks, FieldError, ValidationContext, WizardController, WizardForm,
    WizardStep, COMPUTE_DEVICE_STEPS,
};

// ---------------------------------------------------------------------------
// Architecture and acceleration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Architecture {
    #[default]
    X64,
    #[serde(rename = "ARM64")]
    Arm64,
}

impl Architecture {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X64 => "X64",
            Self::Arm64 => "ARM64",
        }
    }

    pub fn from_str_db(s: &str) -> Option<Self> {
        match s {
            "X64" => Some(Self::X64),
            "ARM64" => Some(Self::Arm64),
            _ => None,
        }
    }
}

pub const ACCELERATION_NVIDIA_DGPU: &str = "Nvidia dGPU";
pub const ACCELERATION_CPU: &str = "CPU";
pub const ACCELERATION_NVIDIA_JETSON: &str = "Nvidia Jetson (Jetpack 5)";
pub const ACCELERATION_INTEL_IGPU: &str = "Intel iGPU";

const X64_ACCELERATIONS: &[&str] = &[
    UNSET_OPTION,
    ACCELERATION_NVIDIA_DGPU,
    ACCELERATION_CPU,
    ACCELERATION_INTEL_IGPU,
];
const ARM64_ACCELERATIONS: &[&str] = &[UNSET_OPTION, ACCELERATION_NVIDIA_JETSON];
const K8S_ACCELERATIONS: &[&str] = &[UNSET_OPTION, ACCELERATION_NVIDIA_DGPU, ACCELERATION_CPU];

/// Dropdown options for the acceleration field, unset option first.
pub fn acceleration_options(architecture: Architecture, is_k8s: bool) -> &'static [&'static str] {
    if is_k8s {
        return K8S_ACCELERATIONS;
    }
    match architecture {
        Architecture::X64 => X64_ACCELERATIONS,
        Architecture::Arm64 => ARM64_ACCELERATIONS,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterType {
    #[default]
    Current,
    Other,
}

impl ClusterType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Other => "other",
        }
    }

    pub fn from_str_db(s: &str) -> Option<Self> {
        match s {
            "current" => Some(Self::Current),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ComputeDeviceForm {
    pub name: String,
    pub iothub: String,
    pub iotedge_device: String,
    pub architecture: Architecture,
    /// [`UNSET_OPTION`] until chosen.
    pub acceleration: String,
    pub cluster_type: ClusterType,
    pub is_k8s: bool,
    /// Base64 kubeconfig, only for [`ClusterType::Other`].
    pub config_data: String,
    pub tags: TagList,
}

impl Default for ComputeDeviceForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            iothub: String::new(),
            iotedge_device: String::new(),
            architecture: Architecture::default(),
            acceleration: UNSET_OPTION.to_string(),
            cluster_type: ClusterType::default(),
            is_k8s: false,
            config_data: String::new(),
            tags: TagList::new(),
        }
    }
}

impl ComputeDeviceForm {
    pub fn kubernetes() -> Self {
        Self {
            is_k8s: true,
            ..Self::default()
        }
    }

    pub fn from_entity(device: &ComputeDevice) -> Self {
        Self {
            name: device.name.clone(),
            iothub: device.iothub.clone(),
            iotedge_device: device.iotedge_device.clone(),
            architecture: device.architecture,
            acceleration: device.acceleration.clone(),
            cluster_type: device.cluster_type,
            is_k8s: device.is_k8s,
            config_data: String::new(),
            tags: TagList::hydrate(&device.tag_list),
        }
    }

    pub fn acceleration_options(&self) -> &'static [&'static str] {
        acceleration_options(self.architecture, self.is_k8s)
    }

    /// Drop an acceleration choice the current architecture cannot offer.
    fn reset_unsupported_acceleration(&mut self) {
        if !self.acceleration_options().contains(&self.acceleration.as_str()) {
            self.acceleration = UNSET_OPTION.to_string();
        }
    }

    fn acceleration_error(&self) -> Option<&'static str> {
        check_option(&self.acceleration).or_else(|| {
            (!self.acceleration_options().contains(&self.acceleration.as_str()))
                .then_some(ERROR_ACCELERATION_UNSUPPORTED)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateComputeDevicePayload {
    pub name: String,
    pub iothub: String,
    pub iotedge_device: String,
    pub architecture: String,
    pub acceleration: String,
    pub tag_list: String,
    pub cluster_type: String,
    pub is_k8s: bool,
    pub config_data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateComputeDevicePayload {
    pub architecture: String,
    pub acceleration: String,
    pub tag_list: String,
    pub cluster_type: String,
    pub is_k8s: bool,
}

impl WizardForm for ComputeDeviceForm {
    type CreatePayload = CreateComputeDevicePayload;
    type UpdatePayload = UpdateComputeDevicePayload;

    const KIND: EntityKind = EntityKind::ComputeDevice;
    const STEPS: &'static [WizardStep] = COMPUTE_DEVICE_STEPS;
    const LOCKED_ON_EDIT: &'static [&'static str] =
        &["name", "iothub", "iotedge_device", "is_k8s", "config_data"];

    fn set_field(&mut self, key: &str, value: serde_json::Value) -> Result<(), CoreError> {
        match key {
            "name" => self.name = field_value(key, value)?,
            "iothub" => {
                self.iothub = field_value(key, value)?;
                self.iotedge_device.clear();
            }
            "iotedge_device" => self.iotedge_device = field_value(key, value)?,
            "architecture" => {
                self.architecture = field_value(key, value)?;
                self.reset_unsupported_acceleration();
            }
            "acceleration" => self.acceleration = field_value(key, value)?,
            "cluster_type" => {
                self.cluster_type = field_value(key, value)?;
                if self.cluster_type == ClusterType::Current {
                    self.config_data.clear();
                }
            }
            "is_k8s" => {
                self.is_k8s = field_value(key, value)?;
                self.reset_unsupported_acceleration();
            }
            "config_data" => {
                return Err(CoreError::Validation(
                    "config_data is set from a verified kubeconfig upload".into(),
                ))
            }
            _ => return Err(unknown_field(Self::KIND, key)),
        }
        Ok(())
    }

    fn checks(&self, step: WizardStep, ctx: &ValidationContext) -> Vec<FieldError> {
        let mut checks = Checks::default();
        if step == WizardStep::Basics {
            checks.check("name", check_name(&self.name, &ctx.existing_names));
            if self.is_k8s {
                if self.cluster_type == ClusterType::Other {
                    checks.check(
                        "config_data",
                        self.config_data.is_empty().then_some(ERROR_FILE_BLANK),
                    );
                }
            } else {
                checks
                    .check("iothub", check_required(&self.iothub))
                    .check("iotedge_device", check_required(&self.iotedge_device));
            }
            checks.check("acceleration", self.acceleration_error());
        }
        checks.into_vec()
    }

    fn step_fields(step: WizardStep) -> &'static [&'static str] {
        match step {
            WizardStep::Basics => &[
                "name",
                "iothub",
                "iotedge_device",
                "architecture",
                "acceleration",
                "cluster_type",
                "config_data",
            ],
            WizardStep::Tag => &["tag_list"],
            _ => &[],
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn tags(&self) -> &TagList {
        &self.tags
    }

    fn tags_mut(&mut self) -> &mut TagList {
        &mut self.tags
    }

    fn create_payload(&self) -> CreateComputeDevicePayload {
        CreateComputeDevicePayload {
            name: self.name.clone(),
            iothub: self.iothub.clone(),
            iotedge_device: self.iotedge_device.clone(),
            architecture: self.architecture.as_str().to_string(),
            acceleration: self.acceleration.clone(),
            tag_list: self.tags.to_payload(),
            cluster_type: self.cluster_type.as_str().to_string(),
            is_k8s: self.is_k8s,
            config_data: self.config_data.clone(),
        }
    }

    fn update_payload(&self) -> UpdateComputeDevicePayload {
        UpdateComputeDevicePayload {
            architecture: self.architecture.as_str().to_string(),
            acceleration: self.acceleration.clone(),
            tag_list: self.tags.to_payload(),
            cluster_type: self.cluster_type.as_str().to_string(),
            is_k8s: self.is_k8s,
        }
    }
}

impl WizardController<ComputeDeviceForm> {
    /// Attach a base64 kubeconfig the backend has already accepted. Only
    /// creation flows take one.
    pub fn attach_kubeconfig(&mut self, config_data: String) -> Result<(), CoreError> {
        if self.context.mode.is_edit() {
            return Err(CoreError::Validation(
                "config_data cannot be changed after creation".into(),
            ));
        }
        self.form.config_data = config_data;
        self.errors.clear("config_data");
        Ok(())
    }
}
