//! Material repository contracts with SQLite and in-memory implementations.
//!
//! # Responsibility
//! - Provide record-level read/write/delete by id over `materials`.
//! - Provide filtered scans expressed as an ownership scope plus optional
//!   category, name and id filters.
//!
//! # Invariants
//! - Write paths call `Material::validate()` before mutating storage.
//! - `id` is unique across the whole catalog, independent of owner.
//! - Record-level reads (`get_material`) perform no visibility check; that
//!   decision belongs to the catalog service.
//! - Scan order is unspecified.

use crate::model::material::{Material, MaterialId};
use crate::model::principal::OwnerScope;
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, Row};
use std::cell::RefCell;
use std::collections::BTreeMap;

const MATERIAL_SELECT_SQL: &str = "SELECT
    id,
    nome,
    unidade,
    categoria,
    subcategoria,
    pegada_carbono,
    custo_unitario,
    user_id
FROM materials";

/// Maximum ids bound into one `id IN (...)` lookup.
const ID_LOOKUP_CHUNK: usize = 500;

/// Filtered scan over the catalog. All present filters are AND-combined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialScan {
    pub scope: OwnerScope,
    /// Exact, case-sensitive category match.
    pub category: Option<String>,
    /// Case-insensitive substring match on `name`.
    pub name_contains: Option<String>,
    /// Restrict to these ids. `Some(vec![])` matches nothing.
    pub ids: Option<Vec<MaterialId>>,
}

impl MaterialScan {
    pub fn new(scope: OwnerScope) -> Self {
        Self {
            scope,
            category: None,
            name_contains: None,
            ids: None,
        }
    }

    /// Full predicate, shared by every repository implementation.
    pub fn matches(&self, material: &Material) -> bool {
        self.scope.contains(material.owner_id)
            && self
                .category
                .as_ref()
                .map_or(true, |category| material.category.as_ref() == Some(category))
            && self.matches_name(&material.name)
            && self
                .ids
                .as_ref()
                .map_or(true, |ids| ids.iter().any(|id| id == &material.id))
    }

    fn matches_name(&self, name: &str) -> bool {
        match &self.name_contains {
            Some(needle) => name.to_lowercase().contains(&needle.to_lowercase()),
            None => true,
        }
    }
}

/// Persistence collaborator for catalog materials.
pub trait MaterialRepository {
    /// Inserts a new material. Fails with `Duplicate` when the id exists.
    fn insert_material(&self, material: &Material) -> RepoResult<()>;
    /// Replaces a stored material. Fails with `NotFound` when absent.
    fn update_material(&self, material: &Material) -> RepoResult<()>;
    /// Loads one material by id regardless of owner.
    fn get_material(&self, id: &str) -> RepoResult<Option<Material>>;
    /// Hard-deletes one material. Returns whether a row was removed.
    fn delete_material(&self, id: &str) -> RepoResult<bool>;
    /// Returns every material matching `scan`.
    fn scan_materials(&self, scan: &MaterialScan) -> RepoResult<Vec<Material>>;
}

impl<R: MaterialRepository + ?Sized> MaterialRepository for &R {
    fn insert_material(&self, material: &Material) -> RepoResult<()> {
        (**self).insert_material(material)
    }

    fn update_material(&self, material: &Material) -> RepoResult<()> {
        (**self).update_material(material)
    }

    fn get_material(&self, id: &str) -> RepoResult<Option<Material>> {
        (**self).get_material(id)
    }

    fn delete_material(&self, id: &str) -> RepoResult<bool> {
        (**self).delete_material(id)
    }

    fn scan_materials(&self, scan: &MaterialScan) -> RepoResult<Vec<Material>> {
        (**self).scan_materials(scan)
    }
}

/// SQLite-backed material repository.
pub struct SqliteMaterialRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMaterialRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `InvalidData` when the `materials` table is missing.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'materials'
             );",
            [],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(RepoError::InvalidData(
                "materials table is missing; run migrations first".to_string(),
            ));
        }
        Ok(Self { conn })
    }
}

impl MaterialRepository for SqliteMaterialRepository<'_> {
    fn insert_material(&self, material: &Material) -> RepoResult<()> {
        material.validate()?;

        let result = self.conn.execute(
            "INSERT INTO materials (
                id,
                nome,
                unidade,
                categoria,
                subcategoria,
                pegada_carbono,
                custo_unitario,
                user_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                material.id.as_str(),
                material.name.as_str(),
                material.unit.as_str(),
                material.category.as_deref(),
                material.subcategory.as_deref(),
                material.carbon_factor,
                material.unit_cost,
                material.owner_id,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_primary_key_violation(&err) => {
                Err(RepoError::Duplicate(material.id.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn update_material(&self, material: &Material) -> RepoResult<()> {
        material.validate()?;

        let changed = self.conn.execute(
            "UPDATE materials
             SET
                nome = ?1,
                unidade = ?2,
                categoria = ?3,
                subcategoria = ?4,
                pegada_carbono = ?5,
                custo_unitario = ?6,
                user_id = ?7,
                atualizado_em = (strftime('%s', 'now') * 1000)
             WHERE id = ?8;",
            params![
                material.name.as_str(),
                material.unit.as_str(),
                material.category.as_deref(),
                material.subcategory.as_deref(),
                material.carbon_factor,
                material.unit_cost,
                material.owner_id,
                material.id.as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(material.id.clone()));
        }

        Ok(())
    }

    fn get_material(&self, id: &str) -> RepoResult<Option<Material>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MATERIAL_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_material_row(row)?));
        }

        Ok(None)
    }

    fn delete_material(&self, id: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM materials WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn scan_materials(&self, scan: &MaterialScan) -> RepoResult<Vec<Material>> {
        if scan.scope.is_empty() || scan.ids.as_ref().is_some_and(Vec::is_empty) {
            return Ok(Vec::new());
        }

        let mut sql = format!("{MATERIAL_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        match (scan.scope.include_shared, scan.scope.owner) {
            (true, Some(owner)) => {
                sql.push_str(" AND (user_id IS NULL OR user_id = ?)");
                bind_values.push(Value::Integer(owner));
            }
            (true, None) => sql.push_str(" AND user_id IS NULL"),
            (false, Some(owner)) => {
                sql.push_str(" AND user_id = ?");
                bind_values.push(Value::Integer(owner));
            }
            (false, None) => return Ok(Vec::new()),
        }

        if let Some(category) = &scan.category {
            sql.push_str(" AND categoria = ?");
            bind_values.push(Value::Text(category.clone()));
        }

        let Some(ids) = &scan.ids else {
            return self.query_scan(&sql, bind_values, scan);
        };

        // Distinct ids so no row is returned by two chunks.
        let mut ids = ids.clone();
        ids.sort_unstable();
        ids.dedup();

        // One statement per chunk keeps the bind count under SQLite's limit.
        let mut materials = Vec::new();
        for chunk in ids.chunks(ID_LOOKUP_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let chunk_sql = format!("{sql} AND id IN ({placeholders})");
            let mut chunk_values = bind_values.clone();
            chunk_values.extend(chunk.iter().cloned().map(Value::Text));
            materials.extend(self.query_scan(&chunk_sql, chunk_values, scan)?);
        }

        Ok(materials)
    }
}

impl SqliteMaterialRepository<'_> {
    fn query_scan(
        &self,
        sql: &str,
        bind_values: Vec<Value>,
        scan: &MaterialScan,
    ) -> RepoResult<Vec<Material>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut materials = Vec::new();

        // SQLite `LOWER` is ASCII-only; name matching happens here so both
        // repositories agree on non-ASCII names.
        while let Some(row) = rows.next()? {
            let material = parse_material_row(row)?;
            if scan.matches_name(&material.name) {
                materials.push(material);
            }
        }

        Ok(materials)
    }
}

/// Map-backed repository for tests and ephemeral catalogs.
#[derive(Debug, Default)]
pub struct InMemoryMaterialRepository {
    materials: RefCell<BTreeMap<MaterialId, Material>>,
}

impl InMemoryMaterialRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds materials directly, bypassing ownership rules.
    ///
    /// This is the administrative bulk-load path used to populate the shared
    /// catalog (`owner_id = None`).
    pub fn with_materials(materials: impl IntoIterator<Item = Material>) -> Self {
        let repo = Self::new();
        repo.materials.borrow_mut().extend(
            materials
                .into_iter()
                .map(|material| (material.id.clone(), material)),
        );
        repo
    }

    pub fn len(&self) -> usize {
        self.materials.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.borrow().is_empty()
    }
}

impl MaterialRepository for InMemoryMaterialRepository {
    fn insert_material(&self, material: &Material) -> RepoResult<()> {
        material.validate()?;
        let mut materials = self.materials.borrow_mut();
        if materials.contains_key(&material.id) {
            return Err(RepoError::Duplicate(material.id.clone()));
        }
        materials.insert(material.id.clone(), material.clone());
        Ok(())
    }

    fn update_material(&self, material: &Material) -> RepoResult<()> {
        material.validate()?;
        let mut materials = self.materials.borrow_mut();
        match materials.get_mut(&material.id) {
            Some(stored) => {
                *stored = material.clone();
                Ok(())
            }
            None => Err(RepoError::NotFound(material.id.clone())),
        }
    }

    fn get_material(&self, id: &str) -> RepoResult<Option<Material>> {
        Ok(self.materials.borrow().get(id).cloned())
    }

    fn delete_material(&self, id: &str) -> RepoResult<bool> {
        Ok(self.materials.borrow_mut().remove(id).is_some())
    }

    fn scan_materials(&self, scan: &MaterialScan) -> RepoResult<Vec<Material>> {
        Ok(self
            .materials
            .borrow()
            .values()
            .filter(|material| scan.matches(material))
            .cloned()
            .collect())
    }
}

/// Seeds the shared catalog (`owner_id = None`) directly in SQLite.
///
/// Administrative bulk-load path; regular creates always assign an owner.
pub fn seed_shared_materials(conn: &Connection, materials: &[Material]) -> RepoResult<usize> {
    let repo = SqliteMaterialRepository::try_new(conn)?;
    let mut inserted = 0;
    for material in materials {
        let shared = Material {
            owner_id: None,
            ..material.clone()
        };
        match repo.insert_material(&shared) {
            Ok(()) => inserted += 1,
            Err(RepoError::Duplicate(_)) => {}
            Err(err) => return Err(err),
        }
    }
    Ok(inserted)
}

fn parse_material_row(row: &Row<'_>) -> RepoResult<Material> {
    let material = Material {
        id: row.get("id")?,
        name: row.get("nome")?,
        unit: row.get("unidade")?,
        category: row.get("categoria")?,
        subcategory: row.get("subcategoria")?,
        carbon_factor: row.get("pegada_carbono")?,
        unit_cost: row.get("custo_unitario")?,
        owner_id: row.get("user_id")?,
    };
    material.validate().map_err(|err| {
        RepoError::InvalidData(format!("material `{}` failed validation: {err}", material.id))
    })?;
    Ok(material)
}

fn is_primary_key_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.code == ErrorCode::ConstraintViolation
                && (failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE)
        }
        _ => false,
    }
}
