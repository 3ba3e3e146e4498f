//! Project repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist project headers and their ordered material line items.
//!
//! # Invariants
//! - Items are returned in insertion order (`seq ASC`).
//! - Item `material_id` is never checked against `materials`.
//! - Ownership checks belong to the project service.

use crate::model::project::{Project, ProjectId, ProjectItem, ProjectItemId};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

/// Persistence collaborator for projects.
pub trait ProjectRepository {
    fn insert_project(&self, project: &Project) -> RepoResult<()>;
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    /// Appends one item after every existing item of its project.
    fn insert_item(&self, item: &ProjectItem) -> RepoResult<()>;
    fn list_items(&self, project_id: ProjectId) -> RepoResult<Vec<ProjectItem>>;
    /// Returns whether an item was removed.
    fn delete_item(&self, project_id: ProjectId, item_id: ProjectItemId) -> RepoResult<bool>;
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn insert_project(&self, project: &Project) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO projects (id, user_id, nome, tipo, area, localizacao, metas)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                project.id.to_string(),
                project.owner_id,
                project.name.as_str(),
                project.kind.as_deref(),
                project.area_m2,
                project.location.as_deref(),
                project.goals.as_deref(),
            ],
        )?;
        Ok(())
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, nome, tipo, area, localizacao, metas
             FROM projects
             WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_project_row(row)?));
        }
        Ok(None)
    }

    fn insert_item(&self, item: &ProjectItem) -> RepoResult<()> {
        if !item.quantity.is_finite() || item.quantity < 0.0 {
            return Err(RepoError::InvalidData(format!(
                "project item quantity must be finite and non-negative, got {}",
                item.quantity
            )));
        }

        self.conn.execute(
            "INSERT INTO project_items (id, project_id, material_id, quantidade, unidade, seq)
             VALUES (
                ?1, ?2, ?3, ?4, ?5,
                (SELECT COALESCE(MAX(seq), 0) + 1 FROM project_items WHERE project_id = ?2)
             );",
            params![
                item.id.to_string(),
                item.project_id.to_string(),
                item.material_id.as_str(),
                item.quantity,
                item.unit.as_deref(),
            ],
        )?;
        Ok(())
    }

    fn list_items(&self, project_id: ProjectId) -> RepoResult<Vec<ProjectItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, material_id, quantidade, unidade
             FROM project_items
             WHERE project_id = ?1
             ORDER BY seq ASC;",
        )?;
        let mut rows = stmt.query([project_id.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }
        Ok(items)
    }

    fn delete_item(&self, project_id: ProjectId, item_id: ProjectItemId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM project_items WHERE project_id = ?1 AND id = ?2;",
            params![project_id.to_string(), item_id.to_string()],
        )?;
        Ok(changed > 0)
    }
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    Ok(Project {
        id: parse_uuid(row, "id", "projects.id")?,
        owner_id: row.get("user_id")?,
        name: row.get("nome")?,
        kind: row.get("tipo")?,
        area_m2: row.get("area")?,
        location: row.get("localizacao")?,
        goals: row.get("metas")?,
    })
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<ProjectItem> {
    Ok(ProjectItem {
        id: parse_uuid(row, "id", "project_items.id")?,
        project_id: parse_uuid(row, "project_id", "project_items.project_id")?,
        material_id: row.get("material_id")?,
        quantity: row.get("quantidade")?,
        unit: row.get("unidade")?,
    })
}

fn parse_uuid(row: &Row<'_>, column: &str, label: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in {label}")))
}
