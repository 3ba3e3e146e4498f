//! Impact calculation input/output records.
//!
//! # Responsibility
//! - Define line items submitted for a calculation.
//! - Define the per-item breakdown and total produced by aggregation.
//!
//! # Invariants
//! - Decoding a line item never fails because of its quantity; malformed
//!   quantities decode to `0.0`.
//! - `ImpactResult` is computed fresh per call and never persisted by core.

use crate::model::material::MaterialId;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One `(material reference, quantity)` pair of a calculation request.
///
/// `material_id` is a reference, not ownership: a dangling id is legal and
/// contributes zero impact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub material_id: MaterialId,
    #[serde(
        rename = "quantidade",
        default,
        deserialize_with = "deserialize_lenient_quantity"
    )]
    pub quantity: f64,
}

impl LineItem {
    pub fn new(material_id: impl Into<MaterialId>, quantity: f64) -> Self {
        Self {
            material_id: material_id.into(),
            quantity,
        }
    }
}

/// Per-item aggregation result, in line item input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactLine {
    #[serde(rename = "id")]
    pub material_id: MaterialId,
    /// Material name, or the raw `material_id` when the material is unknown.
    #[serde(rename = "nome")]
    pub name: String,
    /// Empty when the material is unknown.
    #[serde(rename = "unidade")]
    pub unit: String,
    #[serde(rename = "quantidade")]
    pub quantity: f64,
    #[serde(rename = "fator")]
    pub factor: f64,
    #[serde(rename = "impacto")]
    pub impact: f64,
    /// Whether the material reference matched a supplied material.
    #[serde(skip)]
    pub resolved: bool,
}

/// Aggregate impact for a list of line items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactResult {
    #[serde(rename = "pegada_carbono_kg")]
    pub total_impact_kg: f64,
    #[serde(rename = "itens")]
    pub breakdown: Vec<ImpactLine>,
}

impl ImpactResult {
    /// Result of aggregating zero line items.
    pub fn empty() -> Self {
        Self {
            total_impact_kg: 0.0,
            breakdown: Vec::new(),
        }
    }
}

/// Normalizes an arbitrary numeric input into a usable quantity.
///
/// Non-finite and negative inputs become `0.0`.
pub fn normalize_quantity(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Coerces a loosely typed JSON value into a quantity.
///
/// Numbers pass through, numeric strings are trimmed and parsed (empty is
/// zero), booleans map to `1`/`0`; every other shape yields `0.0`.
pub fn coerce_quantity(value: &Value) -> f64 {
    let raw = match value {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(0.0)
            }
        }
        Value::Bool(true) => 1.0,
        Value::Bool(false) | Value::Null | Value::Array(_) | Value::Object(_) => 0.0,
    };
    normalize_quantity(raw)
}

// Relies on serde_json `arbitrary_precision`: number literals reach `Value`
// as text, so `1e400` decodes instead of failing the whole document.
fn deserialize_lenient_quantity<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_quantity(&value))
}
