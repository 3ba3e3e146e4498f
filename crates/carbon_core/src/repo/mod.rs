//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the persistence collaborator contracts used by services.
//! - Isolate SQLite query details from access-control orchestration.
//!
//! # Invariants
//! - Repository writes enforce model validation before persistence.
//! - Repositories never apply principal visibility on record-level reads;
//!   scans receive the ownership scope explicitly.

pub mod material_repo;
pub mod project_repo;

use crate::db::DbError;
use crate::model::material::{MaterialId, MaterialValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for catalog and project persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(MaterialValidationError),
    Db(DbError),
    /// Record addressed by id does not exist.
    NotFound(String),
    /// Insert collided with an existing material id.
    Duplicate(MaterialId),
    /// Persisted or supplied data violates a storage invariant.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::Duplicate(id) => write!(f, "material id already exists: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::Duplicate(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<MaterialValidationError> for RepoError {
    fn from(value: MaterialValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
