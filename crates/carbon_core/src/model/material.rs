//! Material catalog domain model.
//!
//! # Responsibility
//! - Define the canonical catalog record and its create/patch inputs.
//! - Validate emission and cost coefficients before persistence.
//!
//! # Invariants
//! - `id` is caller-chosen, unique across the whole catalog and immutable.
//! - `carbon_factor` is finite and non-negative.
//! - `unit_cost`, when set, is finite and non-negative.
//! - `owner_id = None` marks a shared material; `Some(user)` is private.

use crate::model::principal::UserId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Caller-chosen material identifier.
pub type MaterialId = String;

/// Catalog record with its emission coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: MaterialId,
    #[serde(rename = "nome")]
    pub name: String,
    /// Free-text unit label (`kg`, `m²`, ...). No conversion is applied.
    #[serde(rename = "unidade")]
    pub unit: String,
    #[serde(rename = "categoria", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(
        rename = "subcategoria",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub subcategory: Option<String>,
    /// Impact in kgCO2eq per one `unit`.
    #[serde(rename = "pegada_carbono")]
    pub carbon_factor: f64,
    #[serde(
        rename = "custo_unitario",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub unit_cost: Option<f64>,
    /// `None` for shared catalog entries.
    #[serde(rename = "user_id", default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<UserId>,
}

impl Material {
    /// Builds a private material from a validated draft.
    ///
    /// Ownership is always taken from the caller-supplied `owner_id`, never
    /// from the draft.
    pub fn from_draft(draft: MaterialDraft, owner_id: Option<UserId>) -> Self {
        Self {
            id: draft.id,
            name: draft.name,
            unit: draft.unit,
            category: draft.category,
            subcategory: draft.subcategory,
            carbon_factor: draft.carbon_factor,
            unit_cost: draft.unit_cost,
            owner_id,
        }
    }

    /// Returns whether this material belongs to the shared catalog.
    pub fn is_shared(&self) -> bool {
        self.owner_id.is_none()
    }

    /// Applies every field present in `patch`; omitted fields are kept.
    ///
    /// `id` and `owner_id` are not patchable.
    pub fn apply_patch(&mut self, patch: &MaterialPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(unit) = &patch.unit {
            self.unit = unit.clone();
        }
        if let Some(category) = &patch.category {
            self.category = Some(category.clone());
        }
        if let Some(subcategory) = &patch.subcategory {
            self.subcategory = Some(subcategory.clone());
        }
        if let Some(carbon_factor) = patch.carbon_factor {
            self.carbon_factor = carbon_factor;
        }
        if let Some(unit_cost) = patch.unit_cost {
            self.unit_cost = Some(unit_cost);
        }
    }

    /// Validates record-level invariants.
    ///
    /// # Errors
    /// - `EmptyField` when `id`, `name` or `unit` is blank.
    /// - `NegativeValue`/`NonFiniteValue` for bad coefficients.
    pub fn validate(&self) -> Result<(), MaterialValidationError> {
        require_text("id", &self.id)?;
        require_text("nome", &self.name)?;
        require_text("unidade", &self.unit)?;
        require_coefficient("pegada_carbono", self.carbon_factor)?;
        if let Some(unit_cost) = self.unit_cost {
            require_coefficient("custo_unitario", unit_cost)?;
        }
        Ok(())
    }
}

/// Create input for a catalog material.
///
/// Deserializes from the external request shape. Ownership fields sent by
/// clients (`user_id`, `is_admin`) are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MaterialDraft {
    pub id: MaterialId,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "unidade")]
    pub unit: String,
    #[serde(rename = "pegada_carbono")]
    pub carbon_factor: f64,
    #[serde(rename = "categoria", default)]
    pub category: Option<String>,
    #[serde(rename = "subcategoria", default)]
    pub subcategory: Option<String>,
    #[serde(rename = "custo_unitario", default)]
    pub unit_cost: Option<f64>,
}

impl MaterialDraft {
    /// Creates a draft with the required fields only.
    pub fn new(
        id: impl Into<MaterialId>,
        name: impl Into<String>,
        unit: impl Into<String>,
        carbon_factor: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit: unit.into(),
            carbon_factor,
            category: None,
            subcategory: None,
            unit_cost: None,
        }
    }
}

/// Partial update input. `None` means "keep the stored value".
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MaterialPatch {
    #[serde(rename = "nome", default)]
    pub name: Option<String>,
    #[serde(rename = "unidade", default)]
    pub unit: Option<String>,
    #[serde(rename = "categoria", default)]
    pub category: Option<String>,
    #[serde(rename = "subcategoria", default)]
    pub subcategory: Option<String>,
    #[serde(rename = "pegada_carbono", default)]
    pub carbon_factor: Option<f64>,
    #[serde(rename = "custo_unitario", default)]
    pub unit_cost: Option<f64>,
}

impl MaterialPatch {
    /// Returns whether the patch carries no field at all.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Field-level validation failure for material input.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialValidationError {
    /// Required text field is empty or whitespace only.
    EmptyField(&'static str),
    /// Coefficient is below zero.
    NegativeValue { field: &'static str, value: f64 },
    /// Coefficient is NaN or infinite.
    NonFiniteValue(&'static str),
}

impl Display for MaterialValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "field `{field}` must not be empty"),
            Self::NegativeValue { field, value } => {
                write!(f, "field `{field}` must be non-negative, got {value}")
            }
            Self::NonFiniteValue(field) => write!(f, "field `{field}` must be a finite number"),
        }
    }
}

impl Error for MaterialValidationError {}

fn require_text(field: &'static str, value: &str) -> Result<(), MaterialValidationError> {
    if value.trim().is_empty() {
        return Err(MaterialValidationError::EmptyField(field));
    }
    Ok(())
}

fn require_coefficient(field: &'static str, value: f64) -> Result<(), MaterialValidationError> {
    if !value.is_finite() {
        return Err(MaterialValidationError::NonFiniteValue(field));
    }
    if value < 0.0 {
        return Err(MaterialValidationError::NegativeValue { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Material, MaterialDraft, MaterialPatch, MaterialValidationError};

    fn concrete() -> Material {
        let mut draft = MaterialDraft::new("concreto-25", "Concreto C25", "m³", 310.0);
        draft.category = Some("estrutura".to_string());
        Material::from_draft(draft, Some(7))
    }

    #[test]
    fn patch_overwrites_present_fields_only() {
        let mut material = concrete();
        let patch = MaterialPatch {
            carbon_factor: Some(295.5),
            unit_cost: Some(480.0),
            ..MaterialPatch::default()
        };

        material.apply_patch(&patch);

        assert_eq!(material.carbon_factor, 295.5);
        assert_eq!(material.unit_cost, Some(480.0));
        assert_eq!(material.name, "Concreto C25");
        assert_eq!(material.category.as_deref(), Some("estrutura"));
        assert_eq!(material.owner_id, Some(7));
    }

    #[test]
    fn validate_rejects_negative_and_non_finite_coefficients() {
        let mut material = concrete();
        material.carbon_factor = -1.0;
        assert!(matches!(
            material.validate(),
            Err(MaterialValidationError::NegativeValue {
                field: "pegada_carbono",
                ..
            })
        ));

        material.carbon_factor = 1.0;
        material.unit_cost = Some(f64::NAN);
        assert_eq!(
            material.validate(),
            Err(MaterialValidationError::NonFiniteValue("custo_unitario"))
        );
    }

    #[test]
    fn validate_rejects_blank_required_text() {
        let mut material = concrete();
        material.unit = "  ".to_string();
        assert_eq!(
            material.validate(),
            Err(MaterialValidationError::EmptyField("unidade"))
        );
    }

    #[test]
    fn draft_ignores_client_supplied_ownership() {
        let draft: MaterialDraft = serde_json::from_str(
            r#"{"id":"aco","nome":"Aço CA-50","unidade":"kg","pegada_carbono":1.9,
                "user_id":99,"is_admin":true}"#,
        )
        .unwrap();
        let material = Material::from_draft(draft, Some(3));
        assert_eq!(material.owner_id, Some(3));
    }

    #[test]
    fn shared_material_serializes_without_owner() {
        let mut material = concrete();
        material.owner_id = None;
        let json = serde_json::to_value(&material).unwrap();
        assert_eq!(json["nome"], "Concreto C25");
        assert_eq!(json["pegada_carbono"], 310.0);
        assert!(json.get("user_id").is_none());
        assert!(json.get("custo_unitario").is_none());
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(MaterialPatch::default().is_empty());
        let patch = MaterialPatch {
            name: Some("x".to_string()),
            ..MaterialPatch::default()
        };
        assert!(!patch.is_empty());
    }
}
