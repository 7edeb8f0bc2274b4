use serde::{Deserialize, Serialize};

use crate::entities::{nullable_string, Entity};
use crate::error::CoreError;
use crate::skill_graph::{FlowPayload, SkillGraph, SkillModel};
use crate::tags::Tag;
use crate::types::{EntityId, EntityKind, SymphonyId};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AiSkillFromServer {
    pub id: EntityId,
    #[serde(deserialize_with = "nullable_string")]
    pub name: String,
    #[serde(deserialize_with = "nullable_string")]
    pub flow: String,
    #[serde(deserialize_with = "nullable_string")]
    pub raw_data: String,
    #[serde(deserialize_with = "nullable_string")]
    pub screenshot: String,
    #[serde(deserialize_with = "nullable_string")]
    pub tag_list: String,
    #[serde(deserialize_with = "nullable_string")]
    pub symphony_id: SymphonyId,
    pub fps: serde_json::Value,
    #[serde(deserialize_with = "nullable_string")]
    pub acceleration: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AiSkill {
    pub id: EntityId,
    pub name: String,
    /// Flow payload as stored, JSON text.
    pub flow: String,
    /// Editor layout blob; empty for skills saved without one.
    pub raw_data: String,
    pub screenshot: String,
    pub tag_list: Vec<Tag>,
    pub symphony_id: SymphonyId,
    pub fps: i64,
    pub acceleration: String,
}

/// Leading integer of a stored frame rate (`"15.5"` is 15). Zero when
/// there is none.
fn parse_fps(value: &serde_json::Value) -> i64 {
    let text = match value {
        serde_json::Value::Number(n) => return n.as_f64().map_or(0, |f| f.trunc() as i64),
        serde_json::Value::String(s) => s.trim(),
        _ => return 0,
    };
    let end = text
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+'))))
        .map_or(text.len(), |(i, _)| i);
    text[..end].parse().unwrap_or(0)
}

impl AiSkillFromServer {
    pub fn normalize(self) -> AiSkill {
        AiSkill {
            id: self.id,
            name: self.name,
            flow: self.flow,
            raw_data: self.raw_data,
            screenshot: self.screenshot,
            tag_list: Tag::parse_list(&self.tag_list),
            symphony_id: self.symphony_id,
            fps: parse_fps(&self.fps),
            acceleration: self.acceleration,
        }
    }
}

impl AiSkill {
    pub fn flow_payload(&self) -> Result<FlowPayload, CoreError> {
        serde_json::from_str(&self.flow)
            .map_err(|e| CoreError::Validation(format!("Malformed flow for skill {}: {e}", self.name)))
    }

    /// The editable graph: restored from the layout blob when present,
    /// otherwise rebuilt from the flow and laid out.
    pub fn graph(&self, models: &[SkillModel]) -> Result<SkillGraph, CoreError> {
        if self.raw_data.is_empty() {
            SkillGraph::from_flow(&self.flow_payload()?, models)
        } else {
            SkillGraph::from_raw(&self.raw_data)
        }
    }
}

impl Entity for AiSkill {
    const KIND: EntityKind = EntityKind::AiSkill;

    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn symphony_id(&self) -> &str {
        &self.symphony_id
    }

    fn tags(&self) -> &[Tag] {
        &self.tag_list
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::skill_graph::test_support::chain;

    #[test]
    fn fps_parses_leading_integer() {
        assert_eq!(parse_fps(&json!("15")), 15);
        assert_eq!(parse_fps(&json!("15.5")), 15);
        assert_eq!(parse_fps(&json!("fast")), 0);
        assert_eq!(parse_fps(&json!(7.9)), 7);
        assert_eq!(parse_fps(&serde_json::Value::Null), 0);
    }

    #[test]
    fn graph_prefers_layout_blob() {
        let original = chain();
        let skill = AiSkill {
            name: "counter".into(),
            flow: "not json".into(),
            raw_data: original.to_raw().unwrap(),
            ..Default::default()
        };
        let graph = skill.graph(&[]).unwrap();
        assert_eq!(graph.nodes().len(), 3);

        let flowless = AiSkill {
            raw_data: String::new(),
            ..skill
        };
        assert_matches!(flowless.graph(&[]), Err(CoreError::Validation(_)));
    }

    #[test]
    fn null_columns_decode_as_empty() {
        let wire: AiSkillFromServer = serde_json::from_value(json!({
            "id": 2,
            "name": null,
            "symphony_id": null,
            "acceleration": null,
            "fps": "10"
        }))
        .unwrap();
        let skill = wire.normalize();
        assert_eq!(skill.name, "");
        assert_eq!(skill.symphony_id, "");
        assert_eq!(skill.acceleration, "");
        assert_eq!(skill.fps, 10);
    }
}
