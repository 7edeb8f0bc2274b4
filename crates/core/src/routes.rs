//! Console URL paths.
//!
//! Wizard pages live under `/{entity}/create/{step}` and
//! `/{entity}/edit/{id}/{step}`; every entity also has a list page at
//! `/{entity}`.

use crate::error::CoreError;
use crate::types::{EntityKind, FormMode};
use crate::wizard::{steps_for, WizardStep};

pub const HOME: &str = "/home";
pub const GET_STARTED: &str = "/home/getStarted";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    GetStarted,
    List(EntityKind),
    Wizard {
        kind: EntityKind,
        mode: FormMode,
        step: WizardStep,
    },
}

impl Route {
    pub fn path(&self) -> String {
        match *self {
            Self::Home => HOME.to_string(),
            Self::GetStarted => GET_STARTED.to_string(),
            Self::List(kind) => list_route(kind),
            Self::Wizard { kind, mode, step } => wizard_path(kind, mode, step),
        }
    }

    pub fn parse(path: &str) -> Result<Self, CoreError> {
        let not_found = || CoreError::NotFound {
            entity: "route",
            id: path.to_string(),
        };
        let segments: Vec<&str> = path.trim_end_matches('/').split('/').skip(1).collect();

        match segments.as_slice() {
            ["home"] => Ok(Self::Home),
            ["home", "getStarted"] => Ok(Self::GetStarted),
            [entity] => EntityKind::from_route_segment(entity)
                .map(Self::List)
                .ok_or_else(not_found),
            [entity, "create", step] => {
                let kind = EntityKind::from_route_segment(entity).ok_or_else(not_found)?;
                let step = wizard_step(kind, step).ok_or_else(not_found)?;
                Ok(Self::Wizard {
                    kind,
                    mode: FormMode::Create,
                    step,
                })
            }
            [entity, "edit", id, step] => {
                let kind = EntityKind::from_route_segment(entity).ok_or_else(not_found)?;
                let id = id.parse().map_err(|_| not_found())?;
                let step = wizard_step(kind, step).ok_or_else(not_found)?;
                Ok(Self::Wizard {
                    kind,
                    mode: FormMode::Edit { id },
                    step,
                })
            }
            _ => Err(not_found()),
        }
    }
}

/// A step slug, accepted only if the entity's wizard has that step.
fn wizard_step(kind: EntityKind, slug: &str) -> Option<WizardStep> {
    WizardStep::from_slug(slug).filter(|step| steps_for(kind).contains(step))
}

pub fn list_route(kind: EntityKind) -> String {
    format!("/{}", kind.route_segment())
}

pub fn wizard_path(kind: EntityKind, mode: FormMode, step: WizardStep) -> String {
    match mode {
        FormMode::Create => format!("/{}/create/{}", kind.route_segment(), step.as_str()),
        FormMode::Edit { id } => {
            format!("/{}/edit/{id}/{}", kind.route_segment(), step.as_str())
        }
    }
}
