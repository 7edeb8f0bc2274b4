//! Non-interactive wizard runs.
//!
//! An answers file names field values and tags the way the console
//! pages would enter them:
//!
//! ```json
//! {
//!   "fields": { "name": "edge-1", "iothub": "hub-a", "iotedge_device": "dev-a", "acceleration": "CPU" },
//!   "tags": [{ "name": "site", "value": "north" }]
//! }
//! ```
//!
//! AI skill answers also carry `"graph"`, an editor layout blob.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use serde_json::{Map, Value};

use voe_client::submit::{
    submit_ai_skill, submit_camera, submit_compute_device, submit_deployment, SubmitOutcome,
};
use voe_client::sync::sync_all;
use voe_client::{EntityStore, RequestScope, VoeApi};
use voe_core::skill_graph::SkillGraph;
use voe_core::tags::{Tag, TagField, TagList};
use voe_core::types::EntityKind;
use voe_core::validation::UNSET_OPTION;
use voe_core::wizard::ai_skill::DEFAULT_FPS;
use voe_core::wizard::{
    AiSkillForm, CameraForm, ComputeDeviceForm, DeploymentForm, StepDirection, WizardController,
    WizardForm,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Answers {
    fields: Map<String, Value>,
    tags: Vec<Tag>,
    graph: Option<Value>,
}

impl Answers {
    /// Fields in entry order: keys outside the step layout first, then
    /// each step's fields as the page lists them. Entering `iothub`
    /// clears the device and `architecture` resets the acceleration, so
    /// order matters.
    fn ordered_fields<F: WizardForm>(&self) -> Vec<(&str, &Value)> {
        let laid_out: Vec<&str> = F::STEPS
            .iter()
            .flat_map(|step| F::step_fields(*step).iter().copied())
            .collect();
        let mut ordered: Vec<(&str, &Value)> = self
            .fields
            .iter()
            .filter(|(key, _)| !laid_out.contains(&key.as_str()))
            .map(|(key, value)| (key.as_str(), value))
            .collect();
        for key in laid_out {
            if let Some(value) = self.fields.get(key) {
                ordered.push((key, value));
            }
        }
        ordered
    }

    fn graph(&self) -> anyhow::Result<SkillGraph> {
        let graph = self
            .graph
            .as_ref()
            .context("AI skill answers need a \"graph\" layout blob")?;
        Ok(SkillGraph::from_raw(&graph.to_string())?)
    }
}

fn prepare<F: WizardForm>(
    form: F,
    answers: &Answers,
    existing_names: Vec<String>,
) -> anyhow::Result<WizardController<F>> {
    let mut wizard = WizardController::create(form, existing_names);
    for (key, value) in answers.ordered_fields::<F>() {
        wizard.change_field(key, value.clone())?;
    }
    for (index, tag) in answers.tags.iter().enumerate() {
        wizard.edit_tag(index, TagField::Name, tag.name.clone())?;
        wizard.edit_tag(index, TagField::Value, tag.value.clone())?;
    }
    Ok(wizard)
}

/// Step forward to the last page. Returns false when a step blocks.
fn walk<F: WizardForm>(wizard: &mut WizardController<F>) -> bool {
    let last = wizard.steps().len() - 1;
    while wizard.current_step() != wizard.steps()[last] {
        let before = wizard.current_step();
        if wizard.advance(StepDirection::Forward) == before {
            return false;
        }
        tracing::debug!(step = wizard.current_step().as_str(), "Step passed");
    }
    true
}

fn report_errors<F: WizardForm>(wizard: &WizardController<F>) -> anyhow::Error {
    for (field, message) in wizard.errors().iter() {
        eprintln!("{}: {field}: {message}", wizard.current_step().label());
    }
    anyhow::anyhow!("Wizard stopped at {}", wizard.route())
}

/// Print the payload that would be sent.
fn dry_run<F: WizardForm>(mut wizard: WizardController<F>) -> anyhow::Result<()> {
    if !walk(&mut wizard) {
        return Err(report_errors(&wizard));
    }
    let Some(submission) = wizard.submit() else {
        return Err(report_errors(&wizard));
    };
    println!("{}", serde_json::to_string_pretty(&submission)?);
    Ok(())
}

fn finish<F: WizardForm>(wizard: &WizardController<F>, outcome: SubmitOutcome) -> anyhow::Result<()> {
    match outcome {
        SubmitOutcome::Saved(navigation) => {
            println!("saved {} {}, next: {}", F::KIND.label(), navigation.id, navigation.route);
            Ok(())
        }
        SubmitOutcome::Invalid => Err(report_errors(wizard)),
        SubmitOutcome::Stale => anyhow::bail!("Submission was cancelled"),
    }
}

fn ai_skill_form(graph: SkillGraph) -> AiSkillForm {
    AiSkillForm {
        name: String::new(),
        acceleration: UNSET_OPTION.to_string(),
        fps: DEFAULT_FPS,
        graph,
        screenshot: String::new(),
        tags: TagList::new(),
    }
}

pub async fn run(api: &VoeApi, kind: EntityKind, path: &Path, submit: bool) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let answers: Answers = serde_json::from_str(&text)
        .with_context(|| format!("Malformed answers file {}", path.display()))?;

    let mut store = EntityStore::new();
    let scope = RequestScope::new("wizard");
    if submit && sync_all(api, &mut store, &scope).await?.is_stale() {
        anyhow::bail!("Sync was cancelled");
    }
    let names = store.existing_names(kind);

    match kind {
        EntityKind::Camera => {
            let mut wizard = prepare(CameraForm::default(), &answers, names)?;
            if !submit {
                return dry_run(wizard);
            }
            let outcome = submit_camera(api, &mut store, &scope, &mut wizard).await?;
            finish(&wizard, outcome)
        }
        EntityKind::ComputeDevice => {
            let mut wizard = prepare(ComputeDeviceForm::default(), &answers, names)?;
            if !submit {
                return dry_run(wizard);
            }
            let outcome = submit_compute_device(api, &mut store, &scope, &mut wizard).await?;
            finish(&wizard, outcome)
        }
        EntityKind::Deployment => {
            let mut wizard = prepare(DeploymentForm::default(), &answers, names)?;
            if !submit {
                return dry_run(wizard);
            }
            let outcome = submit_deployment(api, &mut store, &scope, &mut wizard).await?;
            finish(&wizard, outcome)
        }
        EntityKind::AiSkill => {
            let mut wizard = prepare(ai_skill_form(answers.graph()?), &answers, names)?;
            if !submit {
                return dry_run(wizard);
            }
            let outcome = submit_ai_skill(api, &mut store, &scope, &mut wizard).await?;
            finish(&wizard, outcome)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use voe_core::wizard::compute_device::Architecture;
    use voe_core::wizard::WizardStep;

    fn answers(value: Value) -> Answers {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn fields_follow_page_order() {
        let answers = answers(json!({
            "fields": {
                "acceleration": "Nvidia Jetson (Jetpack 5)",
                "architecture": "ARM64",
                "iotedge_device": "dev-a",
                "iothub": "hub-a",
                "name": "edge-1"
            }
        }));
        let wizard = prepare(ComputeDeviceForm::default(), &answers, vec![]).unwrap();
        let form = wizard.form();
        assert_eq!(form.iotedge_device, "dev-a");
        assert_eq!(form.architecture, Architecture::Arm64);
        assert_eq!(form.acceleration, "Nvidia Jetson (Jetpack 5)");
    }

    #[test]
    fn complete_answers_reach_preview() {
        let answers = answers(json!({
            "fields": {"name": "edge-1", "iothub": "hub-a", "iotedge_device": "dev-a", "acceleration": "CPU"},
            "tags": [{"name": "site", "value": "north"}]
        }));
        let mut wizard = prepare(ComputeDeviceForm::default(), &answers, vec![]).unwrap();
        assert!(walk(&mut wizard));
        assert_eq!(wizard.current_step(), *wizard.steps().last().unwrap());

        let submission = serde_json::to_value(wizard.submit().unwrap()).unwrap();
        assert_eq!(submission["action"], "create");
        assert_eq!(submission["tag_list"], "[{\"name\":\"site\",\"value\":\"north\"}]");
    }

    #[test]
    fn missing_field_blocks_walk() {
        let answers = answers(json!({"fields": {"name": "dock"}}));
        let mut wizard = prepare(CameraForm::default(), &answers, vec![]).unwrap();
        assert!(!walk(&mut wizard));
        assert_eq!(wizard.current_step(), WizardStep::Basics);
        assert!(wizard.errors().get("rtsp").is_some());
    }

    #[test]
    fn unknown_field_is_an_error() {
        let answers = answers(json!({"fields": {"colour": "red"}}));
        assert!(prepare(CameraForm::default(), &answers, vec![]).is_err());
    }

    #[test]
    fn ai_skill_answers_need_graph() {
        assert!(Answers::default().graph().is_err());
    }
}
