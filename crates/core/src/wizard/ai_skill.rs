//! AI skill wizard: basics, cascade, tag, preview.
//!
//! The cascade step hosts the skill graph editor. Its check runs the
//! graph's structural validation and then the editor banner, so a skill
//! cannot be saved while a node is unconfigured or the flow cannot be
//! serialized.

use serde::Serialize;

use crate::entities::AiSkill;
use crate::error::CoreError;
use crate::skill_graph::{SkillGraph, SkillModel};
use crate::tags::TagList;
use crate::types::EntityKind;
use crate::validation::{check_name, check_option, ERROR_GREATER_THAN_ZERO, UNSET_OPTION};
use crate::wizard::{
    field_value, unknown_field, Checks, FieldError, ValidationContext, WizardController,
    WizardForm, WizardStep, AI_SKILL_STEPS,
};

pub const DEFAULT_FPS: i64 = 15;

/// Error key of the cascade step.
pub const CASCADE_FIELD: &str = "cascade";

#[derive(Debug, Clone, PartialEq)]
pub struct AiSkillForm {
    pub name: String,
    pub acceleration: String,
    pub fps: i64,
    pub graph: SkillGraph,
    /// Canvas snapshot as a data URL, passed through untouched.
    pub screenshot: String,
    pub tags: TagList,
}

impl AiSkillForm {
    pub fn new(source_model: SkillModel) -> Self {
        Self {
            name: String::new(),
            acceleration: UNSET_OPTION.to_string(),
            fps: DEFAULT_FPS,
            graph: SkillGraph::new(source_model),
            screenshot: String::new(),
            tags: TagList::new(),
        }
    }

    pub fn from_entity(skill: &AiSkill, models: &[SkillModel]) -> Result<Self, CoreError> {
        Ok(Self {
            name: skill.name.clone(),
            acceleration: skill.acceleration.clone(),
            fps: skill.fps,
            graph: skill.graph(models)?,
            screenshot: skill.screenshot.clone(),
            tags: TagList::hydrate(&skill.tag_list),
        })
    }

    fn cascade_error(&self, ctx: &ValidationContext) -> Option<String> {
        if let Some(e) = self.graph.validate(&self.name, &ctx.existing_names) {
            return Some(e.to_string());
        }
        let banner = self.graph.status_message();
        if !banner.is_empty() {
            return Some(banner);
        }
        self.graph.to_flow().err().map(|e| e.to_string())
    }

    fn flow_text(&self) -> String {
        match self.graph.to_flow() {
            Ok(flow) => serde_json::to_string(&flow).unwrap_or_default(),
            Err(e) => {
                tracing::debug!(error = %e, "Skill flow could not be serialized");
                String::new()
            }
        }
    }

    fn raw_text(&self) -> String {
        self.graph.to_raw().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateAiSkillPayload {
    pub name: String,
    /// JSON text of the flow payload.
    pub flow: String,
    pub raw_data: String,
    pub screenshot: String,
    pub tag_list: String,
    pub fps: String,
    pub acceleration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateAiSkillPayload {
    pub flow: String,
    pub raw_data: String,
    pub screenshot: String,
    pub tag_list: String,
}

impl WizardForm for AiSkillForm {
    type CreatePayload = CreateAiSkillPayload;
    type UpdatePayload = UpdateAiSkillPayload;

    const KIND: EntityKind = EntityKind::AiSkill;
    const STEPS: &'static [WizardStep] = AI_SKILL_STEPS;
    const LOCKED_ON_EDIT: &'static [&'static str] = &["name", "acceleration", "fps"];

    fn set_field(&mut self, key: &str, value: serde_json::Value) -> Result<(), CoreError> {
        match key {
            "name" => self.name = field_value(key, value)?,
            "acceleration" => self.acceleration = field_value(key, value)?,
            "fps" => self.fps = field_value(key, value)?,
            "screenshot" => self.screenshot = field_value(key, value)?,
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
                    .check("acceleration", check_option(&self.acceleration))
                    .check("fps", (self.fps <= 0).then_some(ERROR_GREATER_THAN_ZERO));
            }
            WizardStep::Cascade => {
                checks.check(CASCADE_FIELD, self.cascade_error(ctx).as_deref());
            }
            _ => {}
        }
        checks.into_vec()
    }

    fn step_fields(step: WizardStep) -> &'static [&'static str] {
        match step {
            WizardStep::Basics => &["name", "acceleration", "fps"],
            WizardStep::Cascade => &[CASCADE_FIELD],
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

    fn create_payload(&self) -> CreateAiSkillPayload {
        CreateAiSkillPayload {
            name: self.name.clone(),
            flow: self.flow_text(),
            raw_data: self.raw_text(),
            screenshot: self.screenshot.clone(),
            tag_list: self.tags.to_payload(),
            fps: self.fps.to_string(),
            acceleration: self.acceleration.clone(),
        }
    }

    fn update_payload(&self) -> UpdateAiSkillPayload {
        UpdateAiSkillPayload {
            flow: self.flow_text(),
            raw_data: self.raw_text(),
            screenshot: self.screenshot.clone(),
            tag_list: self.tags.to_payload(),
        }
    }
}

impl WizardController<AiSkillForm> {
    /// The graph being edited. Any edit invalidates the cascade message.
    pub fn graph_mut(&mut self) -> &mut SkillGraph {
        self.errors.clear(CASCADE_FIELD);
        &mut self.form.graph
    }
}
