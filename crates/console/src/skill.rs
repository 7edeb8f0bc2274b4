use std::path::Path;

use anyhow::Context;

use voe_core::skill_graph::{FlowPayload, SkillGraph, SkillModel};

use crate::cli::SkillAction;

pub fn run(action: SkillAction) -> anyhow::Result<()> {
    match action {
        SkillAction::Validate {
            file,
            name,
            taken,
            models,
        } => {
            let graph = read_graph(&file, models.as_deref())?;
            if let Some(problem) = check(&graph, &name, &taken) {
                anyhow::bail!("{problem}");
            }
            println!("ok: {} nodes, {} edges", graph.nodes().len(), graph.edges().len());
            Ok(())
        }
        SkillAction::Layout {
            file,
            direction,
            models,
        } => {
            let mut graph = read_graph(&file, models.as_deref())?;
            graph.layout(direction.into());
            println!("{}", graph.to_raw()?);
            Ok(())
        }
        SkillAction::Flow { file, models } => {
            let graph = read_graph(&file, models.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&graph.to_flow()?)?);
            Ok(())
        }
    }
}

/// First problem blocking a save: structural errors, then the editor
/// banner.
fn check(graph: &SkillGraph, name: &str, taken: &[String]) -> Option<String> {
    if let Some(error) = graph.validate(name, taken) {
        return Some(format!("{}: {error}", error.as_str()));
    }
    Some(graph.status_message()).filter(|banner| !banner.is_empty())
}

fn read_graph(file: &Path, models: Option<&Path>) -> anyhow::Result<SkillGraph> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let models = match models {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Malformed model catalog {}", path.display()))?
        }
        None => Vec::new(),
    };
    parse_graph(&text, &models)
}

/// Accept either an editor layout blob or a backend flow payload.
fn parse_graph(text: &str, models: &[SkillModel]) -> anyhow::Result<SkillGraph> {
    let raw_error = match SkillGraph::from_raw(text) {
        Ok(graph) => return Ok(graph),
        Err(e) => e,
    };
    let flow: FlowPayload = serde_json::from_str(text)
        .map_err(|_| raw_error)
        .context("File is neither a layout blob nor a flow payload")?;
    tracing::debug!(nodes = flow.nodes.len(), "Rebuilding graph from flow payload");
    Ok(SkillGraph::from_flow(&flow, models)?)
}
