//! Camera wizard: basics, tag, preview.

use serde::{Deserialize, Serialize};

use crate::entities::Camera;
use crate::error::CoreError;
use crate::tags::TagList;
use crate::types::{EntityId, EntityKind, SymphonyId};
use crate::validation::{check_download_url, check_name, check_rtsp, ERROR_BLANK_VALUE};
use crate::wizard::{
    field_value, unknown_field, Checks, FieldError, ValidationContext, WizardForm, WizardStep,
    CAMERA_STEPS,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    #[default]
    Camera,
    Video,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Camera => "Camera",
            Self::Video => "Video",
        }
    }

    pub fn from_str_db(s: &str) -> Option<Self> {
        match s {
            "Camera" => Some(Self::Camera),
            "Video" => Some(Self::Video),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraForm {
    pub name: String,
    pub media_type: MediaType,
    /// Stream URL when `media_type` is [`MediaType::Camera`].
    pub rtsp: String,
    /// Download URL when `media_type` is [`MediaType::Video`].
    pub media_source: String,
    pub location: Option<EntityId>,
    /// Symphony ids of the compute devices allowed to use this camera.
    pub allowed_devices: Vec<SymphonyId>,
    pub username: String,
    pub password: String,
    pub tags: TagList,
}

impl CameraForm {
    pub fn from_entity(camera: &Camera) -> Self {
        Self {
            name: camera.name.clone(),
            media_type: camera.media_type,
            rtsp: camera.rtsp.clone(),
            media_source: camera.media_source.clone(),
            location: camera.location,
            allowed_devices: camera.allowed_devices.clone(),
            username: camera.username.clone(),
            password: camera.password.clone(),
            tags: TagList::hydrate(&camera.tag_list),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateCameraPayload {
    pub name: String,
    pub media_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtsp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_source: Option<String>,
    pub location: String,
    pub tag_list: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// JSON array of device symphony ids.
    pub allowed_devices: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateCameraPayload {
    pub location: String,
    pub tag_list: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn location_string(location: Option<EntityId>) -> String {
    location.map(|id| id.to_string()).unwrap_or_default()
}

impl WizardForm for CameraForm {
    type CreatePayload = CreateCameraPayload;
    type UpdatePayload = UpdateCameraPayload;

    const KIND: EntityKind = EntityKind::Camera;
    const STEPS: &'static [WizardStep] = CAMERA_STEPS;
    const LOCKED_ON_EDIT: &'static [&'static str] =
        &["name", "media_type", "rtsp", "media_source", "allowed_devices"];

    fn set_field(&mut self, key: &str, value: serde_json::Value) -> Result<(), CoreError> {
        match key {
            "name" => self.name = field_value(key, value)?,
            "media_type" => self.media_type = field_value(key, value)?,
            "rtsp" => self.rtsp = field_value(key, value)?,
            "media_source" => self.media_source = field_value(key, value)?,
            "location" => self.location = field_value(key, value)?,
            "allowed_devices" => self.allowed_devices = field_value(key, value)?,
            "username" => self.username = field_value(key, value)?,
            "password" => self.password = field_value(key, value)?,
            _ => return Err(unknown_field(Self::KIND, key)),
        }
        Ok(())
    }

    fn checks(&self, step: WizardStep, ctx: &ValidationContext) -> Vec<FieldError> {
        let mut checks = Checks::default();
        if step == WizardStep::Basics {
            checks.check("name", check_name(&self.name, &ctx.existing_names));
            match self.media_type {
                MediaType::Camera => checks.check("rtsp", check_rtsp(&self.rtsp)),
                MediaType::Video => {
                    checks.check("media_source", check_download_url(&self.media_source))
                }
            };
            checks
                .check(
                    "allowed_devices",
                    self.allowed_devices.is_empty().then_some(ERROR_BLANK_VALUE),
                )
                .check("location", self.location.is_none().then_some(ERROR_BLANK_VALUE));
        }
        checks.into_vec()
    }

    fn step_fields(step: WizardStep) -> &'static [&'static str] {
        match step {
            WizardStep::Basics => &[
                "name",
                "media_type",
                "rtsp",
                "media_source",
                "location",
                "allowed_devices",
                "username",
                "password",
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

    fn create_payload(&self) -> CreateCameraPayload {
        let (rtsp, media_source) = match self.media_type {
            MediaType::Camera => (Some(self.rtsp.clone()), None),
            MediaType::Video => (None, Some(self.media_source.clone())),
        };
        CreateCameraPayload {
            name: self.name.clone(),
            media_type: self.media_type.as_str().to_string(),
            rtsp,
            media_source,
            location: location_string(self.location),
            tag_list: self.tags.to_payload(),
            username: non_empty(&self.username),
            password: non_empty(&self.password),
            allowed_devices: serde_json::to_string(&self.allowed_devices).unwrap_or_default(),
        }
    }

    fn update_payload(&self) -> UpdateCameraPayload {
        UpdateCameraPayload {
            location: location_string(self.location),
            tag_list: self.tags.to_payload(),
            username: non_empty(&self.username),
            password: non_empty(&self.password),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::validation::{ERROR_INVALID_RTSP, ERROR_INVALID_VIDEO_URL, ERROR_NAME_BLANK};
    use crate::wizard::{StepDirection, Submission, WizardController};

    fn filled() -> CameraForm {
        CameraForm {
            name: "dock".into(),
            rtsp: "rtsp://cam.local/stream".into(),
            location: Some(1),
            allowed_devices: vec!["device-1".into()],
            ..Default::default()
        }
    }

    // -- basics --

    #[test]
    fn empty_required_field_is_invalid_and_does_not_advance() {
        let mut wizard = WizardController::create(CameraForm::default(), vec![]);
        assert!(wizard.validate_step(WizardStep::Basics));
        assert_eq!(wizard.errors().get("name"), Some(ERROR_NAME_BLANK));
        assert_eq!(wizard.current_step(), WizardStep::Basics);

        assert_eq!(wizard.advance(StepDirection::Forward), WizardStep::Basics);
        assert!(wizard.has_error(WizardStep::Basics));
    }

    #[test]
    fn http_link_fails_rtsp_check() {
        let form = CameraForm {
            rtsp: "http://example.com".into(),
            ..filled()
        };
        let mut wizard = WizardController::create(form, vec![]);
        assert!(wizard.validate_step(WizardStep::Basics));
        assert_eq!(wizard.errors().get("rtsp"), Some(ERROR_INVALID_RTSP));

        wizard
            .change_field("rtsp", json!("rtsp://cam.local/stream"))
            .unwrap();
        assert_eq!(wizard.errors().get("rtsp"), None);
        assert!(!wizard.validate_step(WizardStep::Basics));
    }

    #[test]
    fn video_media_checks_download_link() {
        let form = CameraForm {
            media_type: MediaType::Video,
            media_source: "ftp://host/clip.mp4".into(),
            ..filled()
        };
        let mut wizard = WizardController::create(form, vec![]);
        assert!(wizard.validate_step(WizardStep::Basics));
        assert_eq!(wizard.errors().get("media_source"), Some(ERROR_INVALID_VIDEO_URL));
    }

    #[test]
    fn rtsp_badge_clears_after_switching_to_video() {
        let form = CameraForm {
            rtsp: String::new(),
            ..filled()
        };
        let mut wizard = WizardController::create(form, vec![]);
        assert_eq!(wizard.advance(StepDirection::Forward), WizardStep::Basics);
        assert!(wizard.errors().get("rtsp").is_some());

        wizard.change_field("media_type", json!("Video")).unwrap();
        wizard
            .change_field("media_source", json!("https://host/clip.mp4"))
            .unwrap();
        assert_eq!(wizard.advance(StepDirection::Forward), WizardStep::Tag);
        assert_eq!(wizard.errors().get("rtsp"), None);
        assert!(!wizard.has_error(WizardStep::Basics));
    }

    #[test]
    fn first_failing_check_wins() {
        let form = CameraForm {
            name: "dock".into(),
            ..Default::default()
        };
        let mut wizard = WizardController::create(form, vec!["dock".into()]);
        assert!(wizard.validate_step(WizardStep::Basics));
        assert_eq!(wizard.errors().iter().count(), 1);
        assert!(wizard.errors().get("name").is_some());
    }

    #[test]
    fn mistyped_field_is_rejected() {
        let mut wizard = WizardController::create(CameraForm::default(), vec![]);
        assert_matches!(
            wizard.change_field("location", json!("north")),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            wizard.change_field("zoom", json!(2)),
            Err(CoreError::Validation(_))
        );
    }

    // -- navigation --

    #[test]
    fn advance_clamps_at_both_ends() {
        let mut wizard = WizardController::create(filled(), vec![]);
        assert_eq!(wizard.advance(StepDirection::Backward), WizardStep::Basics);
        assert_eq!(wizard.advance(StepDirection::Forward), WizardStep::Tag);
        assert_eq!(wizard.advance(StepDirection::Forward), WizardStep::Preview);
        assert_eq!(wizard.advance(StepDirection::Forward), WizardStep::Preview);
        assert_eq!(wizard.route(), "/cameras/create/preview");
    }

    #[test]
    fn tab_jump_requires_earlier_steps() {
        let mut wizard = WizardController::create(CameraForm::default(), vec![]);
        assert_eq!(wizard.go_to(WizardStep::Preview).unwrap(), WizardStep::Basics);
        assert!(wizard.go_to(WizardStep::Cascade).is_err());
    }

    #[test]
    fn tag_errors_block_tag_step() {
        let mut wizard = WizardController::create(filled(), vec![]);
        wizard.advance(StepDirection::Forward);
        wizard
            .edit_tag(0, crate::tags::TagField::Name, "site".into())
            .unwrap();
        assert_eq!(wizard.advance(StepDirection::Forward), WizardStep::Tag);
        assert!(wizard.has_error(WizardStep::Tag));

        wizard
            .edit_tag(0, crate::tags::TagField::Value, "north".into())
            .unwrap();
        assert_eq!(wizard.advance(StepDirection::Forward), WizardStep::Preview);
    }

    // -- submit --

    #[test]
    fn create_payload_serializes_tags_and_devices() {
        let mut form = filled();
        form.tags.set_name(0, "site").unwrap();
        form.tags.set_value(0, "north").unwrap();
        let mut wizard = WizardController::create(form, vec![]);

        let Some(Submission::Create(payload)) = wizard.submit() else {
            panic!("expected create submission");
        };
        assert_eq!(payload.rtsp.as_deref(), Some("rtsp://cam.local/stream"));
        assert_eq!(payload.media_source, None);
        assert_eq!(payload.location, "1");
        assert_eq!(payload.allowed_devices, r#"["device-1"]"#);
        assert_eq!(payload.tag_list, r#"[{"name":"site","value":"north"}]"#);
        assert_eq!(payload.username, None);
    }

    #[test]
    fn edit_mode_locks_stream_and_skips_its_checks() {
        let form = CameraForm {
            name: "dock".into(),
            rtsp: "legacy".into(),
            ..filled()
        };
        let mut wizard = WizardController::edit(5, form, vec!["dock".into()]);
        assert_matches!(
            wizard.change_field("rtsp", json!("rtsp://x")),
            Err(CoreError::Validation(_))
        );
        assert_eq!(wizard.route(), "/cameras/edit/5/basics");

        let submission = wizard.submit();
        assert_matches!(submission, Some(Submission::Update { id: 5, .. }));
    }
}
