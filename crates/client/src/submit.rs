//! Wizard submission: validate, call the backend, apply the result.

use voe_core::entities::{AiSkill, Camera, ComputeDevice, Deployment, Entity};
use voe_core::routes;
use voe_core::types::{EntityId, FormMode};
use voe_core::wizard::{
    AiSkillForm, CameraForm, ComputeDeviceForm, DeploymentForm, Submission, WizardController,
    WizardForm,
};

use crate::api::{ApiError, VoeApi};
use crate::scope::{Currency, RequestScope};
use crate::store::{EntitySlice, EntityStore};

/// Where the console goes after a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// The entity's list page.
    pub route: String,
    /// Set after a creation so the list can show its confirmation.
    pub just_created: bool,
    pub id: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Saved(Navigation),
    /// A step check failed; the message is in the wizard's errors and
    /// nothing was sent.
    Invalid,
    /// The view was closed before the backend answered; the store was
    /// left untouched.
    Stale,
}

/// Backend calls and store slice for one kind of form.
trait Persist: WizardForm + Sized {
    type Record: Entity;

    async fn create(api: &VoeApi, body: &Self::CreatePayload) -> Result<Self::Record, ApiError>;

    async fn update(
        api: &VoeApi,
        id: EntityId,
        body: &Self::UpdatePayload,
    ) -> Result<Self::Record, ApiError>;

    fn slice(store: &mut EntityStore) -> &mut EntitySlice<Self::Record>;
}

impl Persist for CameraForm {
    type Record = Camera;

    async fn create(api: &VoeApi, body: &Self::CreatePayload) -> Result<Camera, ApiError> {
        api.create_camera(body).await
    }

    async fn update(api: &VoeApi, id: EntityId, body: &Self::UpdatePayload) -> Result<Camera, ApiError> {
        api.update_camera(id, body).await
    }

    fn slice(store: &mut EntityStore) -> &mut EntitySlice<Camera> {
        &mut store.cameras
    }
}

impl Persist for ComputeDeviceForm {
    type Record = ComputeDevice;

    async fn create(api: &VoeApi, body: &Self::CreatePayload) -> Result<ComputeDevice, ApiError> {
        api.create_compute_device(body).await
    }

    async fn update(
        api: &VoeApi,
        id: EntityId,
        body: &Self::UpdatePayload,
    ) -> Result<ComputeDevice, ApiError> {
        api.update_compute_device(id, body).await
    }

    fn slice(store: &mut EntityStore) -> &mut EntitySlice<ComputeDevice> {
        &mut store.compute_devices
    }
}

impl Persist for DeploymentForm {
    type Record = Deployment;

    async fn create(api: &VoeApi, body: &Self::CreatePayload) -> Result<Deployment, ApiError> {
        api.create_deployment(body).await
    }

    async fn update(
        api: &VoeApi,
        id: EntityId,
        body: &Self::UpdatePayload,
    ) -> Result<Deployment, ApiError> {
        api.update_deployment(id, body).await
    }

    fn slice(store: &mut EntityStore) -> &mut EntitySlice<Deployment> {
        &mut store.deployments
    }
}

impl Persist for AiSkillForm {
    type Record = AiSkill;

    async fn create(api: &VoeApi, body: &Self::CreatePayload) -> Result<AiSkill, ApiError> {
        api.create_ai_skill(body).await
    }

    async fn update(api: &VoeApi, id: EntityId, body: &Self::UpdatePayload) -> Result<AiSkill, ApiError> {
        api.update_ai_skill(id, body).await
    }

    fn slice(store: &mut EntityStore) -> &mut EntitySlice<AiSkill> {
        &mut store.ai_skills
    }
}

async fn submit<F: Persist>(
    api: &VoeApi,
    store: &mut EntityStore,
    scope: &RequestScope,
    wizard: &mut WizardController<F>,
) -> Result<SubmitOutcome, ApiError> {
    let Some(submission) = wizard.submit() else {
        tracing::debug!(kind = F::KIND.as_str(), step = wizard.current_step().as_str(), "Submit blocked by validation");
        return Ok(SubmitOutcome::Invalid);
    };

    let (saved, just_created) = match submission {
        Submission::Create(body) => match scope.run(F::create(api, &body)).await {
            Currency::Current(result) => (result?, true),
            Currency::Stale => return Ok(SubmitOutcome::Stale),
        },
        Submission::Update { id, body } => match scope.run(F::update(api, id, &body)).await {
            Currency::Current(result) => (result?, false),
            Currency::Stale => return Ok(SubmitOutcome::Stale),
        },
    };

    let id = saved.id();
    tracing::info!(kind = F::KIND.as_str(), id, created = just_created, "Entity saved");
    let slice = F::slice(store);
    match wizard.mode() {
        FormMode::Create => slice.add_one(saved),
        FormMode::Edit { .. } => slice.upsert_one(saved),
    }
    Ok(SubmitOutcome::Saved(Navigation {
        route: routes::list_route(F::KIND),
        just_created,
        id,
    }))
}

pub async fn submit_camera(
    api: &VoeApi,
    store: &mut EntityStore,
    scope: &RequestScope,
    wizard: &mut WizardController<CameraForm>,
) -> Result<SubmitOutcome, ApiError> {
    submit(api, store, scope, wizard).await
}

pub async fn submit_compute_device(
    api: &VoeApi,
    store: &mut EntityStore,
    scope: &RequestScope,
    wizard: &mut WizardController<ComputeDeviceForm>,
) -> Result<SubmitOutcome, ApiError> {
    submit(api, store, scope, wizard).await
}

pub async fn submit_deployment(
    api: &VoeApi,
    store: &mut EntityStore,
    scope: &RequestScope,
    wizard: &mut WizardController<DeploymentForm>,
) -> Result<SubmitOutcome, ApiError> {
    submit(api, store, scope, wizard).await
}

pub async fn submit_ai_skill(
    api: &VoeApi,
    store: &mut EntityStore,
    scope: &RequestScope,
    wizard: &mut WizardController<AiSkillForm>,
) -> Result<SubmitOutcome, ApiError> {
    submit(api, store, scope, wizard).await
}
