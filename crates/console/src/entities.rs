use anyhow::Context;

use voe_client::session::{landing_route, AccountSession};
use voe_client::sync::sync_all;
use voe_client::{ClientConfig, EntityStore, RequestScope, VoeApi};
use voe_core::entities::{Deployment, Entity};
use voe_core::filter;
use voe_core::types::EntityKind;

async fn load_store(api: &VoeApi) -> anyhow::Result<EntityStore> {
    let mut store = EntityStore::new();
    let scope = RequestScope::new("console");
    let outcome = sync_all(api, &mut store, &scope)
        .await
        .with_context(|| format!("Failed to sync from {}", api.api_url()))?;
    if outcome.is_stale() {
        anyhow::bail!("Sync was cancelled");
    }
    Ok(store)
}

pub async fn sync(api: &VoeApi, config: &ClientConfig) -> anyhow::Result<()> {
    let store = load_store(api).await?;
    let session = AccountSession::load(&config.account_file)?;

    println!("compute devices  {}", store.compute_devices.len());
    println!("cameras          {}", store.cameras.len());
    println!("ai skills        {}", store.ai_skills.len());
    println!("deployments      {}", store.deployments.len());
    match session.account_id() {
        Some(account) => println!("signed in as {account}, landing on {}", landing_route(&store)),
        None => println!("not signed in"),
    }
    Ok(())
}

fn print_matches<T: Entity>(hits: Vec<&T>) {
    if hits.is_empty() {
        println!("no matches");
    }
    for item in hits {
        println!("{:>5}  {}", item.id(), item.name());
    }
}

pub async fn search(api: &VoeApi, kind: EntityKind, query: &str) -> anyhow::Result<()> {
    let store = load_store(api).await?;
    match kind {
        EntityKind::Camera => print_matches(filter::search(&store.cameras.to_vec(), query)),
        EntityKind::ComputeDevice => {
            print_matches(filter::search(&store.compute_devices.to_vec(), query))
        }
        EntityKind::AiSkill => print_matches(filter::search(&store.ai_skills.to_vec(), query)),
        EntityKind::Deployment => {
            let deployments = store.deployments.to_vec();
            let hits = filter::search_by(&deployments, query, |d: &Deployment| {
                vec![
                    d.name.clone(),
                    store.device_name(&d.compute_device).unwrap_or_default().to_string(),
                ]
            });
            print_matches(hits);
        }
    }
    Ok(())
}

pub fn login(config: &ClientConfig, account_id: &str) -> anyhow::Result<()> {
    let mut session = AccountSession::load(&config.account_file)?;
    session
        .sign_in(account_id.trim())
        .with_context(|| format!("Failed to write {}", config.account_file.display()))?;
    println!("signed in as {}", account_id.trim());
    Ok(())
}

pub fn logout(config: &ClientConfig) -> anyhow::Result<()> {
    let mut session = AccountSession::load(&config.account_file)?;
    session.sign_out()?;
    println!("signed out");
    Ok(())
}
