//! Search box and dropdown filters of the list pages.
//!
//! The query is a case-insensitive regular expression; text that does not
//! compile as one is matched literally. An entity matches when any of
//! its searchable fields matches, or failing that, any tag name or value.

use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};

use crate::entities::{AiSkill, Camera, ComputeDevice, Deployment, Entity};
use crate::types::EntityId;

pub trait Searchable: Entity {
    type Field: Copy + Ord + 'static;

    const SEARCH_FIELDS: &'static [Self::Field];

    fn field_text(&self, field: Self::Field) -> String;

    fn search_values(&self) -> Vec<String> {
        Self::SEARCH_FIELDS
            .iter()
            .map(|f| self.field_text(*f))
            .collect()
    }
}

fn query_regex(query: &str) -> Option<Regex> {
    let build = |pattern: &str| RegexBuilder::new(pattern).case_insensitive(true).build().ok();
    build(query).or_else(|| build(&regex::escape(query)))
}

/// Entities matching `query` over the values `fields` extracts, then tags.
pub fn search_by<'a, T, F>(list: &'a [T], query: &str, fields: F) -> Vec<&'a T>
where
    T: Entity,
    F: Fn(&T) -> Vec<String>,
{
    let Some(re) = query_regex(query) else {
        return Vec::new();
    };
    list.iter()
        .filter(|item| {
            fields(item).iter().any(|v| re.is_match(v))
                || item
                    .tags()
                    .iter()
                    .any(|t| re.is_match(&t.name) || re.is_match(&t.value))
        })
        .collect()
}

pub fn search<'a, T: Searchable>(list: &'a [T], query: &str) -> Vec<&'a T> {
    search_by(list, query, T::search_values)
}

/// Ids grouped by the text of `field`, for the filter dropdowns.
pub fn drop_options<T: Searchable>(list: &[T], field: T::Field) -> BTreeMap<String, Vec<EntityId>> {
    let mut options: BTreeMap<String, Vec<EntityId>> = BTreeMap::new();
    for item in list {
        options.entry(item.field_text(field)).or_default().push(item.id());
    }
    options
}

/// Apply the dropdown selections: keep the entities in the smallest
/// non-empty selected id set. With nothing selected the list is returned
/// whole.
pub fn min_content<'a, T, K>(list: &'a [T], selected: &BTreeMap<K, Vec<EntityId>>) -> Vec<&'a T>
where
    T: Entity,
{
    let smallest = selected
        .values()
        .filter(|ids| !ids.is_empty())
        .min_by_key(|ids| ids.len());
    match smallest {
        None => list.iter().collect(),
        Some(ids) => list.iter().filter(|item| ids.contains(&item.id())).collect(),
    }
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CameraField {
    Name,
    Rtsp,
}

impl Searchable for Camera {
    type Field = CameraField;
    const SEARCH_FIELDS: &'static [CameraField] = &[CameraField::Name, CameraField::Rtsp];

    fn field_text(&self, field: CameraField) -> String {
        match field {
            CameraField::Name => self.name.clone(),
            CameraField::Rtsp => self.rtsp.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ComputeDeviceField {
    Name,
    Iothub,
    IotedgeDevice,
    Acceleration,
    Architecture,
}

impl Searchable for ComputeDevice {
    type Field = ComputeDeviceField;
    const SEARCH_FIELDS: &'static [ComputeDeviceField] = &[
        ComputeDeviceField::Name,
        ComputeDeviceField::Iothub,
        ComputeDeviceField::IotedgeDevice,
        ComputeDeviceField::Acceleration,
        ComputeDeviceField::Architecture,
    ];

    fn field_text(&self, field: ComputeDeviceField) -> String {
        match field {
            ComputeDeviceField::Name => self.name.clone(),
            ComputeDeviceField::Iothub => self.iothub.clone(),
            ComputeDeviceField::IotedgeDevice => self.iotedge_device.clone(),
            ComputeDeviceField::Acceleration => self.acceleration.clone(),
            ComputeDeviceField::Architecture => self.architecture.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AiSkillField {
    Name,
    Acceleration,
    Fps,
}

impl Searchable for AiSkill {
    type Field = AiSkillField;
    const SEARCH_FIELDS: &'static [AiSkillField] =
        &[AiSkillField::Name, AiSkillField::Acceleration, AiSkillField::Fps];

    fn field_text(&self, field: AiSkillField) -> String {
        match field {
            AiSkillField::Name => self.name.clone(),
            AiSkillField::Acceleration => self.acceleration.clone(),
            AiSkillField::Fps => self.fps.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DeploymentField {
    Name,
    /// Device reference. List pages that know device names search them
    /// through [`search_by`] instead.
    ComputeDevice,
}

impl Searchable for Deployment {
    type Field = DeploymentField;
    const SEARCH_FIELDS: &'static [DeploymentField] =
        &[DeploymentField::Name, DeploymentField::ComputeDevice];

    fn field_text(&self, field: DeploymentField) -> String {
        match field {
            DeploymentField::Name => self.name.clone(),
            DeploymentField::ComputeDevice => self.compute_device.clone(),
        }
    }
}
