//! Store refresh and deletion, each applied only while its scope is live.

use voe_core::error::CoreError;
use voe_core::types::EntityId;

use crate::api::VoeApi;
use crate::error::ClientError;
use crate::scope::{Currency, RequestScope};
use crate::store::EntityStore;

/// Entity counts after a full sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub cameras: usize,
    pub compute_devices: usize,
    pub deployments: usize,
    pub ai_skills: usize,
}

/// Fetch all four lists and replace the store's contents. Nothing is
/// applied unless every list arrived.
pub async fn sync_all(
    api: &VoeApi,
    store: &mut EntityStore,
    scope: &RequestScope,
) -> Result<Currency<SyncSummary>, ClientError> {
    let fetched = scope
        .run(async {
            tokio::try_join!(
                api.list_cameras(),
                api.list_compute_devices(),
                api.list_deployments(),
                api.list_ai_skills(),
            )
        })
        .await;
    let (cameras, devices, deployments, skills) = match fetched {
        Currency::Current(lists) => lists?,
        Currency::Stale => return Ok(Currency::Stale),
    };

    let summary = SyncSummary {
        cameras: cameras.len(),
        compute_devices: devices.len(),
        deployments: deployments.len(),
        ai_skills: skills.len(),
    };
    store.cameras.set_all(cameras);
    store.compute_devices.set_all(devices);
    store.deployments.set_all(deployments);
    store.ai_skills.set_all(skills);
    tracing::info!(
        cameras = summary.cameras,
        compute_devices = summary.compute_devices,
        deployments = summary.deployments,
        ai_skills = summary.ai_skills,
        "Store synced",
    );
    Ok(Currency::Current(summary))
}

pub async fn refresh_camera(
    api: &VoeApi,
    store: &mut EntityStore,
    scope: &RequestScope,
    id: EntityId,
) -> Result<Currency<()>, ClientError> {
    match scope.run(api.refresh_camera(id)).await {
        Currency::Current(camera) => {
            store.cameras.upsert_one(camera?);
            Ok(Currency::Current(()))
        }
        Currency::Stale => Ok(Currency::Stale),
    }
}

pub async fn refresh_compute_device(
    api: &VoeApi,
    store: &mut EntityStore,
    scope: &RequestScope,
    id: EntityId,
) -> Result<Currency<()>, ClientError> {
    match scope.run(api.refresh_compute_device(id)).await {
        Currency::Current(device) => {
            store.compute_devices.upsert_one(device?);
            Ok(Currency::Current(()))
        }
        Currency::Stale => Ok(Currency::Stale),
    }
}

pub async fn delete_cameras(
    api: &VoeApi,
    store: &mut EntityStore,
    ids: &[EntityId],
) -> Result<(), ClientError> {
    api.delete_cameras(ids).await?;
    store.cameras.remove_many(ids);
    Ok(())
}

pub async fn delete_compute_devices(
    api: &VoeApi,
    store: &mut EntityStore,
    ids: &[EntityId],
) -> Result<(), ClientError> {
    api.delete_compute_devices(ids).await?;
    store.compute_devices.remove_many(ids);
    Ok(())
}

pub async fn delete_deployment(
    api: &VoeApi,
    store: &mut EntityStore,
    id: EntityId,
) -> Result<(), ClientError> {
    api.delete_deployment(id).await?;
    store.deployments.remove_one(id);
    Ok(())
}

/// Delete a skill no deployment references.
pub async fn delete_ai_skill(
    api: &VoeApi,
    store: &mut EntityStore,
    id: EntityId,
) -> Result<(), ClientError> {
    let skill = store.ai_skills.get(id).ok_or_else(|| CoreError::NotFound {
        entity: "ai skill",
        id: id.to_string(),
    })?;
    if store.skill_in_use(&skill.symphony_id) {
        return Err(CoreError::Conflict(format!(
            "AI skill {} is used by a deployment",
            skill.name
        ))
        .into());
    }
    api.delete_ai_skill(id).await?;
    store.ai_skills.remove_one(id);
    Ok(())
}
