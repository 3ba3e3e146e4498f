//! Construction project and its persisted line items.
//!
//! # Invariants
//! - A project is private to its owner; there are no shared projects.
//! - Item `material_id` is a plain reference and may dangle after the
//!   material is deleted.
//! - Item `quantity` is finite and non-negative once persisted.

use crate::model::impact::LineItem;
use crate::model::material::MaterialId;
use crate::model::principal::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable project identifier.
pub type ProjectId = Uuid;

/// Stable project item identifier.
pub type ProjectItemId = Uuid;

/// Project header record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    #[serde(rename = "user_id")]
    pub owner_id: UserId,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "tipo", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "area", default, skip_serializing_if = "Option::is_none")]
    pub area_m2: Option<f64>,
    #[serde(
        rename = "localizacao",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub location: Option<String>,
    #[serde(rename = "metas", default, skip_serializing_if = "Option::is_none")]
    pub goals: Option<String>,
}

/// Create input for a project.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProjectDraft {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "tipo", default)]
    pub kind: Option<String>,
    #[serde(rename = "area", default)]
    pub area_m2: Option<f64>,
    #[serde(rename = "localizacao", default)]
    pub location: Option<String>,
    #[serde(rename = "metas", default)]
    pub goals: Option<String>,
}

impl ProjectDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// One material quantity recorded against a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectItem {
    pub id: ProjectItemId,
    pub project_id: ProjectId,
    pub material_id: MaterialId,
    #[serde(rename = "quantidade")]
    pub quantity: f64,
    #[serde(rename = "unidade", default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl ProjectItem {
    /// Projects this stored item into a calculation line item.
    pub fn to_line_item(&self) -> LineItem {
        LineItem::new(self.material_id.clone(), self.quantity)
    }
}
