//! Deployment wizard: basics, configure, tag, preview.
//!
//! A deployment binds one compute device to a set of cameras, each
//! running one or more AI skills.

use serde::{Deserialize, Serialize};

use crate::entities::{Deployment, DeploymentConfigureCamera, DeploymentConfigureSkill};
use crate::error::CoreError;
use crate::tags::TagList;
use crate::types::{EntityKind, SymphonyId};
use crate::validation::{check_name, ERROR_BLANK_VALUE};
use crate::wizard::{
    field_value, unknown_field, Checks, FieldError, ValidationContext, WizardForm, WizardStep,
    DEPLOYMENT_STEPS,
};

/// A dropdown choice: backend key plus display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownOption {
    pub key: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillChoice {
    pub id: SymphonyId,
    pub name: String,
    #[serde(default)]
    pub configured: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraChoice {
    pub camera: SymphonyId,
    pub name: String,
    #[serde(default)]
    pub skills: Vec<SkillChoice>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeploymentForm {
    pub name: String,
    pub device: Option<DropdownOption>,
    pub cameras: Vec<CameraChoice>,
    pub tags: TagList,
}

impl DeploymentForm {
    /// Hydrate from a stored deployment. Camera and skill display names
    /// are resolved through `name_of`; unknown ids display as themselves.
    pub fn from_entity(
        deployment: &Deployment,
        device_name: Option<&str>,
        name_of: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let lookup = |id: &str| name_of(id).unwrap_or_else(|| id.to_string());
        Self {
            name: deployment.name.clone(),
            device: Some(DropdownOption {
                key: deployment.compute_device.clone(),
                text: device_name
                    .map(str::to_string)
                    .unwrap_or_else(|| deployment.compute_device.clone()),
            }),
            cameras: deployment
                .configure
                .iter()
                .map(|c| CameraChoice {
                    camera: c.camera.clone(),
                    name: lookup(&c.camera),
                    skills: c
                        .skills
                        .iter()
                        .map(|s| SkillChoice {
                            id: s.id.clone(),
                            name: lookup(&s.id),
                            configured: s.configured,
                        })
                        .collect(),
                })
                .collect(),
            tags: TagList::hydrate(&deployment.tag_list),
        }
    }

    fn configure(&self) -> Vec<DeploymentConfigureCamera> {
        self.cameras
            .iter()
            .map(|c| DeploymentConfigureCamera {
                camera: c.camera.clone(),
                skills: c
                    .skills
                    .iter()
                    .map(|s| DeploymentConfigureSkill {
                        id: s.id.clone(),
                        configured: s.configured,
                    })
                    .collect(),
            })
            .collect()
    }

    fn configure_payload(&self) -> String {
        serde_json::to_string(&self.configure()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateDeploymentPayload {
    pub name: String,
    pub compute_device: String,
    pub tag_list: String,
    /// JSON array of `{camera, skills: [{id, configured}]}`.
    pub configure: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateDeploymentPayload {
    pub tag_list: String,
    pub configure: String,
}

impl WizardForm for DeploymentForm {
    type CreatePayload = CreateDeploymentPayload;
    type UpdatePayload = UpdateDeploymentPayload;

    const KIND: EntityKind = EntityKind::Deployment;
    const STEPS: &'static [WizardStep] = DEPLOYMENT_STEPS;
    const LOCKED_ON_EDIT: &'static [&'static str] = &["name", "device"];

    fn set_field(&mut self, key: &str, value: serde_json::Value) -> Result<(), CoreError> {
        match key {
            "name" => self.name = field_value(key, value)?,
            "device" => self.device = field_value(key, value)?,
            "cameras" => self.cameras = field_value(key, value)?,
            _ => return Err(unknown_field(Self::KIND, key)),
        }
        Ok(())
    }

    fn checks(&self, step: WizardStep, ctx: &ValidationContext) -> Vec<FieldError> {
        let mut checks = Checks::default();
        match step {
            WizardStep::Basics => {
                checks
                    .check("name", check_name(&self.name, &ctx.existing_names))
                    .check("device", self.device.is_none().then_some(ERROR_BLANK_VALUE))
                    .check("cameras", self.cameras.is_empty().then_some(ERROR_BLANK_VALUE));
            }
            WizardStep::Configure => {
                let missing_skill = self.cameras.iter().any(|c| c.skills.is_empty());
                checks.check("skills", missing_skill.then_some(ERROR_BLANK_VALUE));
            }
            _ => {}
        }
        checks.into_vec()
    }

    fn step_fields(step: WizardStep) -> &'static [&'static str] {
        match step {
            WizardStep::Basics => &["name", "device", "cameras"],
            WizardStep::Configure => &["skills"],
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

    fn create_payload(&self) -> CreateDeploymentPayload {
        CreateDeploymentPayload {
            name: self.name.clone(),
            compute_device: self
                .device
                .as_ref()
                .map(|d| d.key.clone())
                .unwrap_or_default(),
            tag_list: self.tags.to_payload(),
            configure: self.configure_payload(),
        }
    }

    fn update_payload(&self) -> UpdateDeploymentPayload {
        UpdateDeploymentPayload {
            tag_list: self.tags.to_payload(),
            configure: self.configure_payload(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::wizard::{StepDirection, Submission, WizardController};

    fn basics_done() -> DeploymentForm {
        DeploymentForm {
            name: "line-1".into(),
            device: Some(DropdownOption {
                key: "device-1".into(),
                text: "edge-1".into(),
            }),
            cameras: vec![CameraChoice {
                camera: "camera-1".into(),
                name: "dock".into(),
                skills: vec![],
            }],
            ..Default::default()
        }
    }

    // -- steps --

    #[test]
    fn device_is_required() {
        let form = DeploymentForm {
            device: None,
            ..basics_done()
        };
        let mut wizard = WizardController::create(form, vec![]);
        assert!(wizard.validate_step(WizardStep::Basics));
        assert_eq!(wizard.errors().get("device"), Some(ERROR_BLANK_VALUE));
    }

    #[test]
    fn configure_requires_a_skill_per_camera() {
        let mut wizard = WizardController::create(basics_done(), vec![]);
        assert_eq!(wizard.advance(StepDirection::Forward), WizardStep::Configure);
        assert_eq!(wizard.advance(StepDirection::Forward), WizardStep::Configure);
        assert!(wizard.has_error(WizardStep::Configure));
        assert!(!wizard.has_error(WizardStep::Basics));

        wizard
            .change_field(
                "cameras",
                json!([{ "camera": "camera-1", "name": "dock", "skills": [{ "id": "skill-1", "name": "count" }] }]),
            )
            .unwrap();
        assert_eq!(wizard.advance(StepDirection::Forward), WizardStep::Tag);
        assert_eq!(wizard.route(), "/deployment/create/tag");
        assert_eq!(wizard.errors().get("skills"), None);
        assert!(!wizard.has_error(WizardStep::Configure));
    }

    #[test]
    fn unknown_step_is_not_checked() {
        let form = DeploymentForm {
            name: String::new(),
            ..basics_done()
        };
        let mut wizard = WizardController::create(form, vec![]);
        assert!(!wizard.validate_step(WizardStep::Cascade));
        assert!(wizard.errors().is_empty());
    }

    // -- submit --

    #[test]
    fn configure_payload_is_a_json_string() {
        let mut form = basics_done();
        form.cameras[0].skills.push(SkillChoice {
            id: "skill-1".into(),
            name: "count".into(),
            configured: true,
        });
        let mut wizard = WizardController::create(form, vec![]);

        let Some(Submission::Create(payload)) = wizard.submit() else {
            panic!("expected create submission");
        };
        assert_eq!(payload.compute_device, "device-1");
        assert_eq!(
            payload.configure,
            r#"[{"camera":"camera-1","skills":[{"id":"skill-1","configured":true}]}]"#
        );
        assert_eq!(payload.tag_list, "");
    }
}
