use carbon_core::db::open_db_in_memory;
use carbon_core::{
    seed_shared_materials, CatalogError, CatalogFilters, CatalogService,
    InMemoryMaterialRepository, Material, MaterialDraft, MaterialPatch, MaterialRepository,
    MaterialValidationError, Principal, SqliteMaterialRepository,
};
use std::collections::BTreeSet;

const USER_1: i64 = 1;
const USER_2: i64 = 2;
const ADMIN: i64 = 100;

fn material(id: &str, name: &str, category: Option<&str>, owner: Option<i64>) -> Material {
    let mut draft = MaterialDraft::new(id, name, "kg", 1.5);
    draft.category = category.map(str::to_string);
    Material::from_draft(draft, owner)
}

fn catalog_rows() -> Vec<Material> {
    vec![
        material("shared-cement", "Cimento Portland", Some("aglomerante"), None),
        material("shared-steel", "AÇO CA-50", Some("estrutura"), None),
        material("u1-brick", "Tijolo cerâmico", Some("alvenaria"), Some(USER_1)),
        material("u1-steel", "Aço reciclado", Some("estrutura"), Some(USER_1)),
        material("u2-wood", "Madeira de eucalipto", Some("estrutura"), Some(USER_2)),
        material("admin-glass", "Vidro temperado", None, Some(ADMIN)),
    ]
}

fn in_memory_catalog() -> InMemoryMaterialRepository {
    InMemoryMaterialRepository::with_materials(catalog_rows())
}

fn seed_sqlite(conn: &rusqlite::Connection) {
    let (shared, private): (Vec<_>, Vec<_>) =
        catalog_rows().into_iter().partition(Material::is_shared);
    assert_eq!(seed_shared_materials(conn, &shared).unwrap(), shared.len());
    let repo = SqliteMaterialRepository::try_new(conn).unwrap();
    for row in &private {
        repo.insert_material(row).unwrap();
    }
}

fn ids(materials: &[Material]) -> BTreeSet<String> {
    materials.iter().map(|m| m.id.clone()).collect()
}

fn expected_visible(principal: &Principal) -> BTreeSet<String> {
    catalog_rows()
        .into_iter()
        .filter(|m| match m.owner_id {
            None => principal.is_admin,
            Some(owner) => principal.user_id == Some(owner),
        })
        .map(|m| m.id)
        .collect()
}

fn principals() -> Vec<Principal> {
    vec![
        Principal::user(USER_1),
        Principal::user(USER_2),
        Principal::user(ADMIN),
        Principal::user(555),
        Principal::admin(ADMIN),
        Principal::admin(USER_1),
        Principal::admin(777),
    ]
}

fn assert_visibility_rule<R: MaterialRepository>(service: &CatalogService<R>) {
    for principal in principals() {
        let listed = service
            .list_visible(Some(&principal), &CatalogFilters::default())
            .unwrap();
        assert_eq!(
            ids(&listed),
            expected_visible(&principal),
            "visibility mismatch for {principal:?}"
        );
        for row in &listed {
            if let Some(owner) = row.owner_id {
                assert_eq!(Some(owner), principal.user_id);
            }
        }
    }
}

#[test]
fn visibility_rule_holds_for_in_memory_repository() {
    let service = CatalogService::new(in_memory_catalog());
    assert_visibility_rule(&service);
}

#[test]
fn visibility_rule_holds_for_sqlite_repository() {
    let conn = open_db_in_memory().unwrap();
    seed_sqlite(&conn);
    let service = CatalogService::new(SqliteMaterialRepository::try_new(&conn).unwrap());
    assert_visibility_rule(&service);
}

#[test]
fn filters_are_and_combined_with_visibility() {
    let conn = open_db_in_memory().unwrap();
    seed_sqlite(&conn);
    let sqlite = CatalogService::new(SqliteMaterialRepository::try_new(&conn).unwrap());
    let memory = CatalogService::new(in_memory_catalog());
    let admin = Principal::admin(ADMIN);
    let user = Principal::user(USER_1);

    let by_category = CatalogFilters::category("estrutura");
    let by_name = CatalogFilters::name_contains("aço");
    let wrong_case_category = CatalogFilters::category("Estrutura");
    let both = CatalogFilters {
        category: Some("estrutura".to_string()),
        name_contains: Some("RECICL".to_string()),
    };

    for (principal, filters, expected) in [
        (&user, &by_category, vec!["u1-steel"]),
        (&admin, &by_category, vec!["shared-steel"]),
        (&user, &by_name, vec!["u1-steel"]),
        (&admin, &by_name, vec!["shared-steel"]),
        (&user, &wrong_case_category, vec![]),
        (&user, &both, vec!["u1-steel"]),
        (&admin, &both, vec![]),
    ] {
        let expected: BTreeSet<String> = expected.into_iter().map(str::to_string).collect();
        assert_eq!(
            ids(&sqlite.list_visible(Some(principal), filters).unwrap()),
            expected
        );
        assert_eq!(
            ids(&memory.list_visible(Some(principal), filters).unwrap()),
            expected
        );
    }
}

#[test]
fn missing_principal_is_rejected_everywhere() {
    let service = CatalogService::new(in_memory_catalog());

    assert!(matches!(
        service.list_visible(None, &CatalogFilters::default()),
        Err(CatalogError::MissingPrincipal)
    ));
    assert!(matches!(
        service.get(None, "shared-cement"),
        Err(CatalogError::MissingPrincipal)
    ));
    assert!(matches!(
        service.create(None, MaterialDraft::new("n", "n", "kg", 1.0)),
        Err(CatalogError::MissingPrincipal)
    ));
    assert!(matches!(
        service.update(None, "u1-brick", &MaterialPatch::default()),
        Err(CatalogError::MissingPrincipal)
    ));
    assert!(matches!(
        service.delete(None, "u1-brick"),
        Err(CatalogError::MissingPrincipal)
    ));
    assert_eq!(service.repo().len(), catalog_rows().len());
}

#[test]
fn get_does_not_reveal_existence_of_invisible_materials() {
    let service = CatalogService::new(in_memory_catalog());
    let user_2 = Principal::user(USER_2);

    let invisible = service.get(Some(&user_2), "u1-brick").unwrap_err();
    let absent = service.get(Some(&user_2), "does-not-exist").unwrap_err();
    assert!(matches!(invisible, CatalogError::NotFound(ref id) if id == "u1-brick"));
    assert!(matches!(absent, CatalogError::NotFound(ref id) if id == "does-not-exist"));

    let shared_for_user = service.get(Some(&user_2), "shared-cement").unwrap_err();
    assert!(matches!(shared_for_user, CatalogError::NotFound(_)));

    let found = service.get(Some(&Principal::user(USER_1)), "u1-brick").unwrap();
    assert_eq!(found.name, "Tijolo cerâmico");
}

#[test]
fn create_assigns_owner_from_principal() {
    let conn = open_db_in_memory().unwrap();
    let service = CatalogService::new(SqliteMaterialRepository::try_new(&conn).unwrap());

    let mut draft = MaterialDraft::new("bloco", "Bloco de concreto", "un", 2.2);
    draft.unit_cost = Some(3.5);
    draft.subcategory = Some("vedação".to_string());
    let created = service.create(Some(&Principal::admin(ADMIN)), draft).unwrap();
    assert_eq!(created.owner_id, Some(ADMIN));
    assert!(!created.is_shared());

    let stored = service.repo().get_material("bloco").unwrap().unwrap();
    assert_eq!(stored, created);
}

#[test]
fn create_rejects_duplicate_ids_across_owners() {
    let service = CatalogService::new(in_memory_catalog());
    let user_2 = Principal::user(USER_2);

    let err = service
        .create(Some(&user_2), MaterialDraft::new("u1-brick", "Meu tijolo", "un", 0.3))
        .unwrap_err();
    assert!(matches!(err, CatalogError::DuplicateId(ref id) if id == "u1-brick"));

    let err = service
        .create(Some(&user_2), MaterialDraft::new("shared-cement", "x", "kg", 0.3))
        .unwrap_err();
    assert!(matches!(err, CatalogError::DuplicateId(_)));

    service
        .create(Some(&user_2), MaterialDraft::new("u2-new", "Telha", "un", 0.9))
        .unwrap();
    let err = service
        .create(
            Some(&Principal::user(USER_1)),
            MaterialDraft::new("u2-new", "Telha", "un", 0.9),
        )
        .unwrap_err();
    assert!(matches!(err, CatalogError::DuplicateId(_)));
}

#[test]
fn create_duplicate_is_detected_by_sqlite() {
    let conn = open_db_in_memory().unwrap();
    let service = CatalogService::new(SqliteMaterialRepository::try_new(&conn).unwrap());

    service
        .create(Some(&Principal::user(USER_1)), MaterialDraft::new("x", "X", "kg", 1.0))
        .unwrap();
    let err = service
        .create(Some(&Principal::user(USER_2)), MaterialDraft::new("x", "Y", "kg", 2.0))
        .unwrap_err();
    assert!(matches!(err, CatalogError::DuplicateId(ref id) if id == "x"));
}

#[test]
fn create_validates_principal_and_fields() {
    let service = CatalogService::new(InMemoryMaterialRepository::new());
    let anonymous = Principal {
        user_id: None,
        is_admin: true,
    };

    assert!(matches!(
        service.create(Some(&anonymous), MaterialDraft::new("a", "A", "kg", 1.0)),
        Err(CatalogError::MissingUser)
    ));

    let user = Principal::user(USER_1);
    assert!(matches!(
        service.create(Some(&user), MaterialDraft::new("a", "A", "kg", -0.1)),
        Err(CatalogError::InvalidField(MaterialValidationError::NegativeValue { .. }))
    ));
    assert!(matches!(
        service.create(Some(&user), MaterialDraft::new("a", "   ", "kg", 1.0)),
        Err(CatalogError::InvalidField(MaterialValidationError::EmptyField("nome")))
    ));

    let mut draft = MaterialDraft::new("a", "A", "kg", 1.0);
    draft.unit_cost = Some(-5.0);
    assert!(matches!(
        service.create(Some(&user), draft),
        Err(CatalogError::InvalidField(_))
    ));
    assert!(service.repo().is_empty());
}

#[test]
fn update_applies_partial_patch_for_owner() {
    let conn = open_db_in_memory().unwrap();
    seed_sqlite(&conn);
    let service = CatalogService::new(SqliteMaterialRepository::try_new(&conn).unwrap());
    let user = Principal::user(USER_1);

    let patch = MaterialPatch {
        carbon_factor: Some(0.8),
        category: Some("vedação".to_string()),
        ..MaterialPatch::default()
    };
    let updated = service.update(Some(&user), "u1-brick", &patch).unwrap();
    assert_eq!(updated.carbon_factor, 0.8);
    assert_eq!(updated.category.as_deref(), Some("vedação"));
    assert_eq!(updated.name, "Tijolo cerâmico");
    assert_eq!(updated.owner_id, Some(USER_1));

    let reloaded = service.get(Some(&user), "u1-brick").unwrap();
    assert_eq!(reloaded, updated);
}

#[test]
fn update_outside_authorized_set_is_not_found() {
    let service = CatalogService::new(in_memory_catalog());
    let patch = MaterialPatch {
        name: Some("hijacked".to_string()),
        ..MaterialPatch::default()
    };

    for (principal, id) in [
        (Principal::user(USER_2), "u1-brick"),
        (Principal::user(USER_1), "shared-cement"),
        (Principal::admin(ADMIN), "u2-wood"),
        (Principal::user(USER_1), "missing"),
    ] {
        let err = service.update(Some(&principal), id, &patch).unwrap_err();
        assert!(
            matches!(err, CatalogError::NotFound(ref found) if found == id),
            "{principal:?} updating {id} returned {err}"
        );
    }

    let untouched = service.repo().get_material("u1-brick").unwrap().unwrap();
    assert_eq!(untouched.name, "Tijolo cerâmico");
}

#[test]
fn admin_can_update_shared_material() {
    let service = CatalogService::new(in_memory_catalog());
    let patch = MaterialPatch {
        unit_cost: Some(42.0),
        ..MaterialPatch::default()
    };
    let updated = service
        .update(Some(&Principal::admin(ADMIN)), "shared-cement", &patch)
        .unwrap();
    assert_eq!(updated.unit_cost, Some(42.0));
    assert!(updated.is_shared());
}

#[test]
fn update_rejects_negative_coefficients_without_persisting() {
    let service = CatalogService::new(in_memory_catalog());
    let user = Principal::user(USER_1);
    let patch = MaterialPatch {
        carbon_factor: Some(-2.0),
        ..MaterialPatch::default()
    };

    assert!(matches!(
        service.update(Some(&user), "u1-brick", &patch),
        Err(CatalogError::InvalidField(_))
    ));
    let stored = service.get(Some(&user), "u1-brick").unwrap();
    assert_eq!(stored.carbon_factor, 1.5);
}

#[test]
fn empty_patch_returns_current_record() {
    let service = CatalogService::new(in_memory_catalog());
    let user = Principal::user(USER_1);
    let current = service
        .update(Some(&user), "u1-steel", &MaterialPatch::default())
        .unwrap();
    assert_eq!(current.name, "Aço reciclado");
}

#[test]
fn delete_is_idempotent_and_silent_for_unauthorized_callers() {
    let conn = open_db_in_memory().unwrap();
    seed_sqlite(&conn);
    let service = CatalogService::new(SqliteMaterialRepository::try_new(&conn).unwrap());

    service.delete(Some(&Principal::user(USER_2)), "u1-brick").unwrap();
    service.delete(Some(&Principal::user(USER_1)), "shared-cement").unwrap();
    service.delete(Some(&Principal::admin(ADMIN)), "u2-wood").unwrap();
    service.delete(Some(&Principal::user(USER_1)), "missing").unwrap();
    assert!(service.repo().get_material("u1-brick").unwrap().is_some());
    assert!(service.repo().get_material("shared-cement").unwrap().is_some());
    assert!(service.repo().get_material("u2-wood").unwrap().is_some());

    let owner = Principal::user(USER_1);
    service.delete(Some(&owner), "u1-brick").unwrap();
    service.delete(Some(&owner), "u1-brick").unwrap();
    assert!(service.repo().get_material("u1-brick").unwrap().is_none());

    service.delete(Some(&Principal::admin(ADMIN)), "shared-cement").unwrap();
    assert!(service.repo().get_material("shared-cement").unwrap().is_none());
}

// Visibility follows the listing predicate: an admin sees shared materials
// plus their own, never another user's private ones.
#[test]
fn private_material_stays_with_its_owner() {
    let service = CatalogService::new(InMemoryMaterialRepository::new());
    let user_1 = Principal::user(USER_1);
    let user_2 = Principal::user(USER_2);
    let admin = Principal::admin(ADMIN);

    service
        .create(Some(&user_1), MaterialDraft::new("X", "Manta asfáltica", "m²", 4.1))
        .unwrap();

    let everything = CatalogFilters::default();
    assert!(ids(&service.list_visible(Some(&user_1), &everything).unwrap()).contains("X"));
    assert!(!ids(&service.list_visible(Some(&user_2), &everything).unwrap()).contains("X"));
    // Admins see the shared catalog plus their own rows only.
    assert!(!ids(&service.list_visible(Some(&admin), &everything).unwrap()).contains("X"));
}
