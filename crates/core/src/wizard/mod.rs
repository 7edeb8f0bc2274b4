//! Multi-step wizard forms for creating and editing entities.
//!
//! [`WizardController`] owns the step machine shared by every entity:
//! field updates, cumulative per-step validation, clamped navigation,
//! tab badges and submission. The entity-specific rules live behind the
//! [`WizardForm`] trait, one implementation per entity module.

pub mod ai_skill;
pub mod camera;
pub mod compute_device;
pub mod deployment;

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::routes;
use crate::tags::{TagField, TagList};
use crate::types::{EntityId, EntityKind, FormMode};

pub use ai_skill::AiSkillForm;
pub use camera::CameraForm;
pub use compute_device::ComputeDeviceForm;
pub use deployment::DeploymentForm;

/// Error key used for the tag step.
pub const TAG_FIELD: &str = "tag_list";

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Basics,
    Configure,
    Cascade,
    Tag,
    Preview,
}

impl WizardStep {
    /// URL slug for this step.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basics => "basics",
            Self::Configure => "configure",
            Self::Cascade => "cascade",
            Self::Tag => "tag",
            Self::Preview => "preview",
        }
    }

    pub fn from_slug(s: &str) -> Option<Self> {
        match s {
            "basics" => Some(Self::Basics),
            "configure" => Some(Self::Configure),
            "cascade" => Some(Self::Cascade),
            "tag" => Some(Self::Tag),
            "preview" => Some(Self::Preview),
            _ => None,
        }
    }

    /// Tab header text.
    pub fn label(self) -> &'static str {
        match self {
            Self::Basics => "Basics",
            Self::Configure => "Configure",
            Self::Cascade => "Cascade",
            Self::Tag => "Tag",
            Self::Preview => "Preview",
        }
    }
}

pub const CAMERA_STEPS: &[WizardStep] = &[WizardStep::Basics, WizardStep::Tag, WizardStep::Preview];
pub const COMPUTE_DEVICE_STEPS: &[WizardStep] =
    &[WizardStep::Basics, WizardStep::Tag, WizardStep::Preview];
pub const DEPLOYMENT_STEPS: &[WizardStep] = &[
    WizardStep::Basics,
    WizardStep::Configure,
    WizardStep::Tag,
    WizardStep::Preview,
];
pub const AI_SKILL_STEPS: &[WizardStep] = &[
    WizardStep::Basics,
    WizardStep::Cascade,
    WizardStep::Tag,
    WizardStep::Preview,
];

/// Fixed step order of an entity's wizard.
pub fn steps_for(kind: EntityKind) -> &'static [WizardStep] {
    match kind {
        EntityKind::Camera => CAMERA_STEPS,
        EntityKind::ComputeDevice => COMPUTE_DEVICE_STEPS,
        EntityKind::Deployment => DEPLOYMENT_STEPS,
        EntityKind::AiSkill => AI_SKILL_STEPS,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepDirection {
    Forward,
    Backward,
}

// ---------------------------------------------------------------------------
// Errors and context
// ---------------------------------------------------------------------------

/// A failed field check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Per-field error messages. Absent keys are valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn set(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn clear(&mut self, field: &str) {
        self.0.remove(field);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// Inputs to validation that come from outside the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationContext {
    /// Names already taken by other entities of the same kind.
    pub existing_names: Vec<String>,
    pub mode: FormMode,
}

// ---------------------------------------------------------------------------
// Form trait
// ---------------------------------------------------------------------------

/// Entity-specific half of a wizard.
pub trait WizardForm {
    type CreatePayload: Serialize;
    type UpdatePayload: Serialize;

    const KIND: EntityKind;
    const STEPS: &'static [WizardStep];
    /// Fields fixed once the entity exists. Edits to them are refused and
    /// their checks are skipped in edit mode.
    const LOCKED_ON_EDIT: &'static [&'static str];

    /// Apply one field update. Unknown keys and mistyped values are
    /// rejected without touching the form.
    fn set_field(&mut self, key: &str, value: serde_json::Value) -> Result<(), CoreError>;

    /// Ordered failing checks owned by `step`. The tag step is handled by
    /// the controller.
    fn checks(&self, step: WizardStep, ctx: &ValidationContext) -> Vec<FieldError>;

    /// Fields whose errors light up `step`'s tab badge.
    fn step_fields(step: WizardStep) -> &'static [&'static str];

    fn name(&self) -> &str;
    fn tags(&self) -> &TagList;
    fn tags_mut(&mut self) -> &mut TagList;

    fn create_payload(&self) -> Self::CreatePayload;
    fn update_payload(&self) -> Self::UpdatePayload;
}

/// Deserialize a field value, reporting which field was mistyped.
pub(crate) fn field_value<T: DeserializeOwned>(
    key: &str,
    value: serde_json::Value,
) -> Result<T, CoreError> {
    serde_json::from_value(value)
        .map_err(|e| CoreError::Validation(format!("Invalid value for {key}: {e}")))
}

pub(crate) fn unknown_field(kind: EntityKind, key: &str) -> CoreError {
    CoreError::Validation(format!("Unknown {} field: {key}", kind.as_str()))
}

/// Collects the failing checks of a step in order.
#[derive(Debug, Default)]
pub(crate) struct Checks(Vec<FieldError>);

impl Checks {
    pub(crate) fn check(&mut self, field: &'static str, failure: Option<&str>) -> &mut Self {
        if let Some(message) = failure {
            self.0.push(FieldError::new(field, message));
        }
        self
    }

    pub(crate) fn into_vec(self) -> Vec<FieldError> {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// What a successful submit hands to the network layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Submission<C, U> {
    Create(C),
    Update { id: EntityId, body: U },
}

pub type FormSubmission<F> =
    Submission<<F as WizardForm>::CreatePayload, <F as WizardForm>::UpdatePayload>;

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct WizardController<F: WizardForm> {
    form: F,
    errors: FieldErrors,
    current: WizardStep,
    context: ValidationContext,
}

impl<F: WizardForm> WizardController<F> {
    /// Start a creation flow on the first step.
    pub fn create(form: F, existing_names: Vec<String>) -> Self {
        Self {
            form,
            errors: FieldErrors::default(),
            current: F::STEPS[0],
            context: ValidationContext {
                existing_names,
                mode: FormMode::Create,
            },
        }
    }

    /// Start an edit flow for entity `id` with a hydrated form. The
    /// entity's own name is removed from `existing_names`.
    pub fn edit(id: EntityId, form: F, existing_names: Vec<String>) -> Self {
        let own = form.name().to_string();
        Self {
            form,
            errors: FieldErrors::default(),
            current: F::STEPS[0],
            context: ValidationContext {
                existing_names: existing_names.into_iter().filter(|n| *n != own).collect(),
                mode: FormMode::Edit { id },
            },
        }
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn into_form(self) -> F {
        self.form
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn current_step(&self) -> WizardStep {
        self.current
    }

    pub fn mode(&self) -> FormMode {
        self.context.mode
    }

    pub fn steps(&self) -> &'static [WizardStep] {
        F::STEPS
    }

    /// Update one field and clear its previous error.
    pub fn change_field(&mut self, key: &str, value: serde_json::Value) -> Result<(), CoreError> {
        if self.context.mode.is_edit() && Self::is_locked(key) {
            return Err(CoreError::Validation(format!(
                "{key} cannot be changed after creation"
            )));
        }
        self.form.set_field(key, value)?;
        self.errors.clear(key);
        Ok(())
    }

    pub fn edit_tag(&mut self, index: usize, field: TagField, text: String) -> Result<(), CoreError> {
        self.form.tags_mut().edit(index, field, text)?;
        self.errors.clear(TAG_FIELD);
        Ok(())
    }

    pub fn remove_tag(&mut self, index: usize) -> bool {
        let removed = self.form.tags_mut().remove(index);
        if removed {
            self.errors.clear(TAG_FIELD);
        }
        removed
    }

    /// Validate `step` and every step before it.
    ///
    /// Returns `true` when the step is **invalid**. The first failing
    /// check records its message; `current_step` never changes here.
    /// Each re-checked step drops its old errors first, so a badge clears
    /// once its cause is fixed. A step this form does not have is valid.
    pub fn validate_step(&mut self, step: WizardStep) -> bool {
        let Some(upto) = self.position(step) else {
            return false;
        };
        for s in &F::STEPS[..=upto] {
            for field in F::step_fields(*s) {
                self.errors.clear(field);
            }
            if let Some(failure) = self.first_failure(*s) {
                self.errors.set(failure.field, failure.message);
                return true;
            }
        }
        false
    }

    /// Move one step. Forward moves are gated on the current step being
    /// valid; both directions clamp at the ends.
    pub fn advance(&mut self, direction: StepDirection) -> WizardStep {
        let Some(pos) = self.position(self.current) else {
            return self.current;
        };
        match direction {
            StepDirection::Backward => {
                if pos > 0 {
                    self.current = F::STEPS[pos - 1];
                }
            }
            StepDirection::Forward => {
                if pos + 1 < F::STEPS.len() && !self.validate_step(self.current) {
                    self.current = F::STEPS[pos + 1];
                }
            }
        }
        self.current
    }

    /// Jump to `target` (tab header click). Jumping past the current step
    /// requires every step before `target` to be valid.
    pub fn go_to(&mut self, target: WizardStep) -> Result<WizardStep, CoreError> {
        let target_pos = self.position(target).ok_or_else(|| {
            CoreError::Validation(format!(
                "{} has no {} step",
                F::KIND.as_str(),
                target.as_str()
            ))
        })?;
        let current_pos = self.position(self.current).unwrap_or(0);
        if target_pos > current_pos && self.validate_step(F::STEPS[target_pos - 1]) {
            return Ok(self.current);
        }
        self.current = target;
        Ok(self.current)
    }

    /// Whether `step`'s tab header shows an error badge.
    pub fn has_error(&self, step: WizardStep) -> bool {
        let field_error = F::step_fields(step)
            .iter()
            .any(|f| self.errors.get(f).is_some());
        field_error || (step == WizardStep::Tag && self.form.tags().has_error())
    }

    /// Validate the terminal step and build the payload. `None` means a
    /// check failed and its message is now in [`Self::errors`].
    pub fn submit(&mut self) -> Option<FormSubmission<F>> {
        let last = *F::STEPS.last()?;
        if self.validate_step(last) {
            return None;
        }
        Some(match self.context.mode {
            FormMode::Create => Submission::Create(self.form.create_payload()),
            FormMode::Edit { id } => Submission::Update {
                id,
                body: self.form.update_payload(),
            },
        })
    }

    /// Console URL for the current step.
    pub fn route(&self) -> String {
        routes::wizard_path(F::KIND, self.context.mode, self.current)
    }

    /// Follow a step slug taken from the URL.
    pub fn sync_route(&mut self, slug: &str) -> Result<WizardStep, CoreError> {
        let step = WizardStep::from_slug(slug).ok_or_else(|| CoreError::NotFound {
            entity: "wizard step",
            id: slug.to_string(),
        })?;
        self.go_to(step)
    }

    fn is_locked(field: &str) -> bool {
        F::LOCKED_ON_EDIT.iter().any(|f| *f == field)
    }

    fn position(&self, step: WizardStep) -> Option<usize> {
        F::STEPS.iter().position(|s| *s == step)
    }

    fn first_failure(&self, step: WizardStep) -> Option<FieldError> {
        let mut failures = self.form.checks(step, &self.context);
        if step == WizardStep::Tag && self.form.tags().has_error() {
            if let Some(message) = self.form.tags().first_error() {
                failures.push(FieldError::new(TAG_FIELD, message));
            }
        }
        let editing = self.context.mode.is_edit();
        failures
            .into_iter()
            .find(|f| !(editing && Self::is_locked(f.field)))
    }
}
