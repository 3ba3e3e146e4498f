//! Catalog access use-case service.
//!
//! # Responsibility
//! - Decide which materials a principal may see or modify.
//! - Enforce ownership on create/update/delete.
//! - Resolve the authorized material set for an impact calculation.
//!
//! # Invariants
//! - Every operation rejects a missing principal before touching storage.
//! - Non-admins see only `owner_id == user_id`; admins additionally see
//!   shared materials, never other users' private ones.
//! - Absent and invisible ids are indistinguishable (`NotFound`), and delete
//!   of either is a silent no-op.
//! - `create` always assigns `owner_id = principal.user_id`.

use crate::model::impact::{ImpactResult, LineItem};
use crate::model::material::{Material, MaterialDraft, MaterialPatch, MaterialValidationError};
use crate::model::principal::Principal;
use crate::repo::material_repo::{MaterialRepository, MaterialScan};
use crate::repo::RepoError;
use crate::service::impact::aggregate;
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Catalog operation failure.
#[derive(Debug)]
pub enum CatalogError {
    /// No authenticated principal was supplied.
    MissingPrincipal,
    /// Principal carries no user id but the operation needs an owner.
    MissingUser,
    /// Id is absent or not visible to the principal.
    NotFound(String),
    /// Create collided with an existing id (any owner).
    DuplicateId(String),
    /// Required field missing or coefficient out of range.
    InvalidField(MaterialValidationError),
    /// Storage failure.
    Repo(RepoError),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingPrincipal => write!(f, "no authenticated principal supplied"),
            Self::MissingUser => write!(f, "principal has no user id"),
            Self::NotFound(id) => write!(f, "material not found: {id}"),
            Self::DuplicateId(id) => write!(f, "material id already exists: {id}"),
            Self::InvalidField(err) => write!(f, "invalid material field: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidField(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MaterialValidationError> for CatalogError {
    fn from(value: MaterialValidationError) -> Self {
        Self::InvalidField(value)
    }
}

impl From<RepoError> for CatalogError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::InvalidField(err),
            RepoError::Duplicate(id) => Self::DuplicateId(id),
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Optional list filters, AND-combined with the visibility rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilters {
    /// Exact, case-sensitive match.
    pub category: Option<String>,
    /// Case-insensitive substring match on the material name.
    pub name_contains: Option<String>,
}

impl CatalogFilters {
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    pub fn name_contains(needle: impl Into<String>) -> Self {
        Self {
            name_contains: Some(needle.into()),
            ..Self::default()
        }
    }
}

/// Catalog Access Resolver over an injected material repository.
pub struct CatalogService<R: MaterialRepository> {
    repo: R,
}

impl<R: MaterialRepository> CatalogService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Underlying repository, for callers composing other services.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Lists every material visible to `principal` that matches `filters`.
    ///
    /// Order is unspecified. An empty result is not an error.
    pub fn list_visible(
        &self,
        principal: Option<&Principal>,
        filters: &CatalogFilters,
    ) -> CatalogResult<Vec<Material>> {
        let principal = require_principal(principal)?;
        let scan = MaterialScan {
            category: filters.category.clone(),
            name_contains: filters.name_contains.clone(),
            ..MaterialScan::new(principal.scope())
        };
        let materials = self.repo.scan_materials(&scan)?;
        debug!(
            "event=material_list module=catalog status=ok is_admin={} count={}",
            principal.is_admin,
            materials.len()
        );
        Ok(materials)
    }

    /// Gets one material visible to `principal`.
    pub fn get(&self, principal: Option<&Principal>, id: &str) -> CatalogResult<Material> {
        let principal = require_principal(principal)?;
        self.find_accessible(principal, id)?
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    /// Creates a private material owned by the principal.
    ///
    /// # Errors
    /// - `MissingPrincipal`, `MissingUser` for an unusable principal.
    /// - `InvalidField` for blank required text or negative coefficients.
    /// - `DuplicateId` when the id exists anywhere in the catalog.
    pub fn create(
        &self,
        principal: Option<&Principal>,
        draft: MaterialDraft,
    ) -> CatalogResult<Material> {
        let principal = require_principal(principal)?;
        let owner_id = principal.user_id.ok_or(CatalogError::MissingUser)?;

        let material = Material::from_draft(draft, Some(owner_id));
        material.validate()?;

        if let Err(err) = self.repo.insert_material(&material) {
            if matches!(err, RepoError::Duplicate(_)) {
                warn!(
                    "event=material_create module=catalog status=error error_code=duplicate_id material_id={}",
                    material.id
                );
            }
            return Err(err.into());
        }

        info!(
            "event=material_create module=catalog status=ok material_id={}",
            material.id
        );
        Ok(material)
    }

    /// Applies a partial update to a material the principal may modify.
    ///
    /// An empty patch returns the current record unchanged.
    pub fn update(
        &self,
        principal: Option<&Principal>,
        id: &str,
        patch: &MaterialPatch,
    ) -> CatalogResult<Material> {
        let principal = require_principal(principal)?;
        let mut material = self
            .find_accessible(principal, id)?
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;

        if patch.is_empty() {
            return Ok(material);
        }

        material.apply_patch(patch);
        material.validate()?;
        self.repo.update_material(&material)?;

        info!("event=material_update module=catalog status=ok material_id={id}");
        Ok(material)
    }

    /// Deletes a material the principal may modify.
    ///
    /// Absent or invisible ids succeed without effect.
    pub fn delete(&self, principal: Option<&Principal>, id: &str) -> CatalogResult<()> {
        let principal = require_principal(principal)?;
        if self.find_accessible(principal, id)?.is_none() {
            debug!("event=material_delete module=catalog status=noop");
            return Ok(());
        }

        self.repo.delete_material(id)?;
        info!("event=material_delete module=catalog status=ok material_id={id}");
        Ok(())
    }

    /// Returns the visible materials referenced by `items`.
    ///
    /// Ids the principal cannot see are simply absent from the result.
    pub fn resolve_for_items(
        &self,
        principal: Option<&Principal>,
        items: &[LineItem],
    ) -> CatalogResult<Vec<Material>> {
        let principal = require_principal(principal)?;
        let ids: BTreeSet<&str> = items
            .iter()
            .map(|item| item.material_id.as_str())
            .filter(|id| !id.is_empty())
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let scan = MaterialScan {
            ids: Some(ids.into_iter().map(str::to_string).collect()),
            ..MaterialScan::new(principal.scope())
        };
        Ok(self.repo.scan_materials(&scan)?)
    }

    /// Resolves visible materials for `items` and aggregates their impact.
    pub fn calculate(
        &self,
        principal: Option<&Principal>,
        items: &[LineItem],
    ) -> CatalogResult<ImpactResult> {
        let materials = self.resolve_for_items(principal, items)?;
        let result = aggregate(items, &materials);
        info!(
            "event=impact_calculate module=catalog status=ok items={} resolved={}",
            items.len(),
            materials.len()
        );
        Ok(result)
    }

    fn find_accessible(&self, principal: &Principal, id: &str) -> CatalogResult<Option<Material>> {
        Ok(self
            .repo
            .get_material(id)?
            .filter(|material| principal.can_access(material.owner_id)))
    }
}

fn require_principal(principal: Option<&Principal>) -> CatalogResult<&Principal> {
    principal.ok_or_else(|| {
        warn!("event=catalog_access module=catalog status=error error_code=missing_principal");
        CatalogError::MissingPrincipal
    })
}
