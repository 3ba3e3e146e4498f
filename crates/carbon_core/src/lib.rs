//! Core domain logic for the construction carbon calculator.
//! This crate is the single source of truth for catalog access rules and
//! impact aggregation.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::impact::{ImpactLine, ImpactResult, LineItem};
pub use model::material::{
    Material, MaterialDraft, MaterialId, MaterialPatch, MaterialValidationError,
};
pub use model::principal::{OwnerScope, Principal, UserId};
pub use model::project::{Project, ProjectDraft, ProjectId, ProjectItem, ProjectItemId};
pub use repo::material_repo::{
    seed_shared_materials, InMemoryMaterialRepository, MaterialRepository, MaterialScan,
    SqliteMaterialRepository,
};
pub use repo::project_repo::{ProjectRepository, SqliteProjectRepository};
pub use repo::{RepoError, RepoResult};
pub use service::catalog_service::{CatalogError, CatalogFilters, CatalogResult, CatalogService};
pub use service::impact::{aggregate, top_n, ImpactSummary, DEFAULT_TOP_N};
pub use service::project_service::{ProjectService, ProjectServiceError, ProjectServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
