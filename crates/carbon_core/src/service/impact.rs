//! Impact aggregation over line items and an authorized material set.
//!
//! # Responsibility
//! - Join line items to material emission coefficients.
//! - Produce per-item breakdown, total, ranking and summary projections.
//!
//! # Invariants
//! - `aggregate` is total: it never fails and never panics on any input.
//! - Unknown material ids and malformed quantities contribute zero impact.
//! - Every emitted number is finite: a line whose product overflows
//!   contributes zero, and an overflowing total is reported as zero.
//! - `breakdown` preserves line item input order; the total is accumulated
//!   in that same order.
//! - Output does not depend on the order of `materials`.
//! - No visibility check happens here; callers pass an authorized set.

use crate::model::impact::{normalize_quantity, ImpactLine, ImpactResult, LineItem};
use crate::model::material::Material;
use std::collections::HashMap;

/// Default size of the top-N impact ranking.
pub const DEFAULT_TOP_N: usize = 6;

/// Aggregates `items` against `materials` into a total and breakdown.
pub fn aggregate(items: &[LineItem], materials: &[Material]) -> ImpactResult {
    if items.is_empty() {
        return ImpactResult::empty();
    }

    // Catalog ids are unique; on a duplicated input id the first one wins.
    let mut by_id: HashMap<&str, &Material> = HashMap::with_capacity(materials.len());
    for material in materials {
        by_id.entry(material.id.as_str()).or_insert(material);
    }

    let mut total_impact_kg = 0.0;
    let breakdown: Vec<ImpactLine> = items
        .iter()
        .map(|item| {
            let line = impact_line(item, by_id.get(item.material_id.as_str()).copied());
            total_impact_kg += line.impact;
            line
        })
        .collect();

    ImpactResult {
        total_impact_kg: finite_or_zero(total_impact_kg),
        breakdown,
    }
}

fn impact_line(item: &LineItem, material: Option<&Material>) -> ImpactLine {
    let quantity = normalize_quantity(item.quantity);
    match material {
        Some(material) => {
            let factor = normalize_factor(material.carbon_factor);
            ImpactLine {
                material_id: item.material_id.clone(),
                name: material.name.clone(),
                unit: material.unit.clone(),
                quantity,
                factor,
                impact: finite_or_zero(quantity * factor),
                resolved: true,
            }
        }
        None => ImpactLine {
            material_id: item.material_id.clone(),
            name: item.material_id.clone(),
            unit: String::new(),
            quantity,
            factor: 0.0,
            impact: 0.0,
            resolved: false,
        },
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn normalize_factor(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Ranks breakdown lines by impact, highest first, keeping at most `n`.
///
/// Ties keep their breakdown order.
pub fn top_n(breakdown: &[ImpactLine], n: usize) -> Vec<ImpactLine> {
    let mut ranked = breakdown.to_vec();
    ranked.sort_by(|left, right| right.impact.total_cmp(&left.impact));
    ranked.truncate(n);
    ranked
}

/// Presentation-oriented summary of one aggregation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactSummary {
    pub item_count: usize,
    pub total_quantity: f64,
    pub total_impact_kg: f64,
    /// Items whose material was unknown or not visible.
    pub unresolved_count: usize,
}

impl ImpactSummary {
    pub fn from_result(result: &ImpactResult) -> Self {
        Self {
            item_count: result.breakdown.len(),
            total_quantity: finite_or_zero(result.breakdown.iter().map(|line| line.quantity).sum()),
            total_impact_kg: result.total_impact_kg,
            unresolved_count: result.breakdown.iter().filter(|line| !line.resolved).count(),
        }
    }

    /// Whether nothing was calculated at all.
    pub fn is_empty(&self) -> bool {
        self.item_count == 0
    }
}
