//! Project use-case service.
//!
//! # Responsibility
//! - Create projects and record material quantities against them.
//! - Calculate a project's impact through the catalog access rules.
//!
//! # Invariants
//! - Projects are visible only to their owner; anyone else gets
//!   `ProjectNotFound`.
//! - Item material references are not validated; unknown or deleted
//!   materials contribute zero impact at calculation time.

use crate::model::impact::ImpactResult;
use crate::model::principal::{Principal, UserId};
use crate::model::project::{Project, ProjectDraft, ProjectId, ProjectItem, ProjectItemId};
use crate::repo::material_repo::MaterialRepository;
use crate::repo::project_repo::ProjectRepository;
use crate::repo::RepoError;
use crate::service::catalog_service::{CatalogError, CatalogService};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Service error for project use-cases.
#[derive(Debug)]
pub enum ProjectServiceError {
    MissingPrincipal,
    MissingUser,
    /// Project is absent or owned by someone else.
    ProjectNotFound(ProjectId),
    /// Input field is blank or out of range.
    InvalidField(String),
    Catalog(CatalogError),
    Repo(RepoError),
}

impl Display for ProjectServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingPrincipal => write!(f, "no authenticated principal supplied"),
            Self::MissingUser => write!(f, "principal has no user id"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::InvalidField(message) => write!(f, "invalid project field: {message}"),
            Self::Catalog(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProjectServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Catalog(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ProjectServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<CatalogError> for ProjectServiceError {
    fn from(value: CatalogError) -> Self {
        match value {
            CatalogError::MissingPrincipal => Self::MissingPrincipal,
            CatalogError::MissingUser => Self::MissingUser,
            other => Self::Catalog(other),
        }
    }
}

pub type ProjectServiceResult<T> = Result<T, ProjectServiceError>;

/// Project facade over project storage and the material catalog.
pub struct ProjectService<P: ProjectRepository, M: MaterialRepository> {
    projects: P,
    catalog: CatalogService<M>,
}

impl<P: ProjectRepository, M: MaterialRepository> ProjectService<P, M> {
    pub fn new(projects: P, materials: M) -> Self {
        Self {
            projects,
            catalog: CatalogService::new(materials),
        }
    }

    /// Creates a project owned by the principal.
    pub fn create_project(
        &self,
        principal: Option<&Principal>,
        draft: ProjectDraft,
    ) -> ProjectServiceResult<Project> {
        let owner_id = require_user(principal)?;
        if draft.name.trim().is_empty() {
            return Err(ProjectServiceError::InvalidField(
                "`nome` must not be empty".to_string(),
            ));
        }
        if let Some(area) = draft.area_m2 {
            if !area.is_finite() || area < 0.0 {
                return Err(ProjectServiceError::InvalidField(format!(
                    "`area` must be finite and non-negative, got {area}"
                )));
            }
        }

        let project = Project {
            id: Uuid::new_v4(),
            owner_id,
            name: draft.name,
            kind: draft.kind,
            area_m2: draft.area_m2,
            location: draft.location,
            goals: draft.goals,
        };
        self.projects.insert_project(&project)?;
        info!(
            "event=project_create module=project status=ok project_id={}",
            project.id
        );
        Ok(project)
    }

    /// Gets a project and its items in insertion order.
    pub fn get_project(
        &self,
        principal: Option<&Principal>,
        project_id: ProjectId,
    ) -> ProjectServiceResult<(Project, Vec<ProjectItem>)> {
        let owner_id = require_user(principal)?;
        let project = self.owned_project(owner_id, project_id)?;
        let items = self.projects.list_items(project_id)?;
        Ok((project, items))
    }

    /// Records a material quantity against a project.
    ///
    /// The material reference is stored as-is, even if it is unknown.
    pub fn add_item(
        &self,
        principal: Option<&Principal>,
        project_id: ProjectId,
        material_id: &str,
        quantity: f64,
        unit: Option<String>,
    ) -> ProjectServiceResult<ProjectItem> {
        let owner_id = require_user(principal)?;
        self.owned_project(owner_id, project_id)?;

        if material_id.trim().is_empty() {
            return Err(ProjectServiceError::InvalidField(
                "`material_id` must not be empty".to_string(),
            ));
        }
        if !quantity.is_finite() || quantity < 0.0 {
            return Err(ProjectServiceError::InvalidField(format!(
                "`quantidade` must be finite and non-negative, got {quantity}"
            )));
        }

        let item = ProjectItem {
            id: Uuid::new_v4(),
            project_id,
            material_id: material_id.to_string(),
            quantity,
            unit,
        };
        self.projects.insert_item(&item)?;
        info!(
            "event=project_item_add module=project status=ok project_id={project_id} item_id={}",
            item.id
        );
        Ok(item)
    }

    /// Removes an item from a project. Unknown item ids are a no-op.
    pub fn remove_item(
        &self,
        principal: Option<&Principal>,
        project_id: ProjectId,
        item_id: ProjectItemId,
    ) -> ProjectServiceResult<()> {
        let owner_id = require_user(principal)?;
        self.owned_project(owner_id, project_id)?;
        self.projects.delete_item(project_id, item_id)?;
        Ok(())
    }

    /// Calculates the project's impact using materials visible to the
    /// principal.
    pub fn calculate_project(
        &self,
        principal: Option<&Principal>,
        project_id: ProjectId,
    ) -> ProjectServiceResult<ImpactResult> {
        let (_, items) = self.get_project(principal, project_id)?;
        let line_items: Vec<_> = items.iter().map(ProjectItem::to_line_item).collect();
        Ok(self.catalog.calculate(principal, &line_items)?)
    }

    fn owned_project(
        &self,
        owner_id: UserId,
        project_id: ProjectId,
    ) -> ProjectServiceResult<Project> {
        self.projects
            .get_project(project_id)?
            .filter(|project| project.owner_id == owner_id)
            .ok_or(ProjectServiceError::ProjectNotFound(project_id))
    }
}

fn require_user(principal: Option<&Principal>) -> ProjectServiceResult<UserId> {
    let principal = principal.ok_or(ProjectServiceError::MissingPrincipal)?;
    principal.user_id.ok_or(ProjectServiceError::MissingUser)
}
