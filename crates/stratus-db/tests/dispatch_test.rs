//! Integration tests for the generic entity dispatcher using
//! in-memory SurrealDB.

use serde_json::json;
use stratus_core::error::StratusError;
use stratus_core::repository::Pagination;
use stratus_db::dispatch::EntityDispatcher;
use stratus_db::registry::default_registry;
use stratus_db::seed::TenantSeeder;
use stratus_db::{MigrationSet, run_migrations};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

/// Helper: in-memory tenant DB, migrated and seeded.
async fn setup_db() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("tenant_one").await.unwrap();
    run_migrations(&db, MigrationSet::Tenant).await.unwrap();
    TenantSeeder::default().seed(&db).await.unwrap();
    db
}

async fn setup() -> EntityDispatcher<surrealdb::engine::local::Db> {
    EntityDispatcher::new(setup_db().await, default_registry())
}

fn id_of(row: &serde_json::Value) -> Uuid {
    Uuid::parse_str(row["id"].as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn create_and_get_person() {
    let dispatcher = setup().await;

    let created = dispatcher
        .create("people", &json!({ "name": "Alice", "position": 3 }))
        .await
        .unwrap();
    assert_eq!(created["name"], json!("Alice"));
    assert_eq!(created["state"], json!("Active"));
    assert!(created["id"].is_string());

    let fetched = dispatcher.get("people", id_of(&created)).await.unwrap();
    assert_eq!(fetched["name"], json!("Alice"));
}

#[tokio::test]
async fn unknown_module_is_not_found() {
    let dispatcher = setup().await;

    let err = dispatcher
        .list("invoices", Pagination::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StratusError::NotFound { entity, .. } if entity == "module"));
}

#[tokio::test]
async fn unknown_record_is_not_found() {
    let dispatcher = setup().await;

    let err = dispatcher.get("people", Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, StratusError::NotFound { .. }));
}

#[tokio::test]
async fn invalid_payload_reports_field_errors() {
    let dispatcher = setup().await;

    let err = dispatcher
        .create("people", &json!({ "position": "first" }))
        .await
        .unwrap_err();
    let StratusError::Validation { errors } = err else {
        panic!("expected validation error");
    };
    assert!(errors.contains_key("name"));
    assert!(errors.contains_key("position"));
}

#[tokio::test]
async fn unexpected_fields_are_discarded() {
    let dispatcher = setup().await;

    let created = dispatcher
        .create(
            "people",
            &json!({ "name": "Alice", "is_admin": true, "role": "root" }),
        )
        .await
        .unwrap();
    assert!(created.get("is_admin").is_none());
    assert!(created.get("role").is_none());
}

#[tokio::test]
async fn update_merges_changes() {
    let dispatcher = setup().await;

    let created = dispatcher
        .create("people", &json!({ "name": "Alice" }))
        .await
        .unwrap();
    let updated = dispatcher
        .update("people", id_of(&created), &json!({ "name": "Alicia" }))
        .await
        .unwrap();
    assert_eq!(updated["name"], json!("Alicia"));
    assert_eq!(updated["state"], json!("Active"));
}

#[tokio::test]
async fn delete_hides_from_list_but_not_get() {
    let dispatcher = setup().await;

    let created = dispatcher
        .create("people", &json!({ "name": "Alice" }))
        .await
        .unwrap();
    let id = id_of(&created);

    dispatcher.delete("people", id).await.unwrap();

    let page = dispatcher
        .list("people", Pagination::default())
        .await
        .unwrap();
    // The seeded admin person remains; Alice must not.
    assert!(page.items.iter().all(|row| row["name"] != json!("Alice")));

    // Detail views still reach deleted records.
    let fetched = dispatcher.get("people", id).await.unwrap();
    assert_eq!(fetched["state"], json!("Deleted"));
}

#[tokio::test]
async fn deleted_record_cannot_be_edited_or_redeleted() {
    let dispatcher = setup().await;

    let created = dispatcher
        .create("people", &json!({ "name": "Alice" }))
        .await
        .unwrap();
    let id = id_of(&created);
    dispatcher.delete("people", id).await.unwrap();

    let err = dispatcher
        .update("people", id, &json!({ "name": "Zombie" }))
        .await
        .unwrap_err();
    assert!(matches!(err, StratusError::NotFound { .. }));

    let err = dispatcher.delete("people", id).await.unwrap_err();
    assert!(matches!(err, StratusError::NotFound { .. }));
}

#[tokio::test]
async fn restore_lands_on_inactive() {
    let dispatcher = setup().await;

    let created = dispatcher
        .create("people", &json!({ "name": "Alice" }))
        .await
        .unwrap();
    let id = id_of(&created);
    dispatcher.delete("people", id).await.unwrap();

    let restored = dispatcher.restore("people", id).await.unwrap();
    assert_eq!(restored["state"], json!("Inactive"));

    // Restoring again is a no-op.
    let again = dispatcher.restore("people", id).await.unwrap();
    assert_eq!(again["state"], json!("Inactive"));
}

#[tokio::test]
async fn list_orders_by_position() {
    let dispatcher = setup().await;

    dispatcher
        .create("people", &json!({ "name": "Second", "position": 20 }))
        .await
        .unwrap();
    dispatcher
        .create("people", &json!({ "name": "First", "position": 0 }))
        .await
        .unwrap();

    let page = dispatcher
        .list("people", Pagination::default())
        .await
        .unwrap();
    let names: Vec<_> = page
        .items
        .iter()
        .map(|row| row["name"].as_str().unwrap().to_string())
        .collect();
    let first = names.iter().position(|n| n == "First").unwrap();
    let second = names.iter().position(|n| n == "Second").unwrap();
    assert!(first < second);
}

#[tokio::test]
async fn pagination_limits_results() {
    let dispatcher = setup().await;

    for i in 0..5 {
        dispatcher
            .create("people", &json!({ "name": format!("P{i}"), "position": i }))
            .await
            .unwrap();
    }

    let page = dispatcher
        .list("people", Pagination { offset: 0, limit: 3 })
        .await
        .unwrap();
    assert_eq!(page.items.len(), 3);
    // Total counts all non-deleted rows (5 created + seeded admin).
    assert_eq!(page.total, 6);
}

#[tokio::test]
async fn user_creation_hashes_password_and_hides_the_hash() {
    let db = setup_db().await;
    let dispatcher = EntityDispatcher::new(db.clone(), default_registry());

    let person = dispatcher
        .create("people", &json!({ "name": "Bob" }))
        .await
        .unwrap();

    let user = dispatcher
        .create(
            "users",
            &json!({
                "person_id": person["id"],
                "email": "bob@example.com",
                "password": "password123"
            }),
        )
        .await
        .unwrap();

    // Neither the plaintext nor the hash leaves the dispatcher.
    assert!(user.get("password").is_none());
    assert!(user.get("password_hash").is_none());

    // The stored row carries the Argon2id hash, not the plaintext.
    let mut result = db
        .query("SELECT password_hash FROM user WHERE email = $email")
        .bind(("email", "bob@example.com".to_string()))
        .await
        .unwrap();
    let rows: Vec<serde_json::Value> = result.take(0).unwrap();
    let hash = rows[0]["password_hash"].as_str().unwrap();
    assert!(hash.starts_with("$argon2"));
    assert_ne!(hash, "password123");
}

#[tokio::test]
async fn user_rows_never_expose_the_hash() {
    let dispatcher = setup().await;

    // The seeded admin account is already present.
    let page = dispatcher
        .list("users", Pagination::default())
        .await
        .unwrap();
    assert!(!page.items.is_empty());
    for row in &page.items {
        assert!(
            row.get("password_hash").is_none(),
            "listing exposes password_hash: {row}"
        );
    }

    let admin = &page.items[0];
    let fetched = dispatcher.get("users", id_of(admin)).await.unwrap();
    assert!(fetched.get("password_hash").is_none());
    assert_eq!(fetched["email"], admin["email"]);
}

#[tokio::test]
async fn duplicate_email_is_a_field_error() {
    let dispatcher = setup().await;

    let person = dispatcher
        .create("people", &json!({ "name": "Bob" }))
        .await
        .unwrap();

    // The seeded admin already owns this address.
    let err = dispatcher
        .create(
            "users",
            &json!({
                "person_id": person["id"],
                "email": "admin@admin.com",
                "password": "password123"
            }),
        )
        .await
        .unwrap_err();
    let StratusError::Validation { errors } = err else {
        panic!("expected validation error, got: {err:?}");
    };
    assert!(errors.contains_key("email"));
}

#[tokio::test]
async fn update_cannot_take_another_users_email() {
    let dispatcher = setup().await;

    let person = dispatcher
        .create("people", &json!({ "name": "Bob" }))
        .await
        .unwrap();
    let user = dispatcher
        .create(
            "users",
            &json!({
                "person_id": person["id"],
                "email": "bob@example.com",
                "password": "password123"
            }),
        )
        .await
        .unwrap();
    let id = id_of(&user);

    let err = dispatcher
        .update("users", id, &json!({ "email": "admin@admin.com" }))
        .await
        .unwrap_err();
    assert!(matches!(err, StratusError::Validation { .. }));

    // Re-submitting the user's own email is not a conflict.
    let updated = dispatcher
        .update("users", id, &json!({ "email": "bob@example.com" }))
        .await
        .unwrap();
    assert_eq!(updated["email"], json!("bob@example.com"));
}

#[tokio::test]
async fn deleted_user_releases_its_email() {
    let dispatcher = setup().await;

    let person = dispatcher
        .create("people", &json!({ "name": "Bob" }))
        .await
        .unwrap();
    let user = dispatcher
        .create(
            "users",
            &json!({
                "person_id": person["id"],
                "email": "bob@example.com",
                "password": "password123"
            }),
        )
        .await
        .unwrap();
    dispatcher.delete("users", id_of(&user)).await.unwrap();

    dispatcher
        .create(
            "users",
            &json!({
                "person_id": person["id"],
                "email": "bob@example.com",
                "password": "password456"
            }),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn duplicate_module_slug_is_a_field_error() {
    let dispatcher = setup().await;

    // "people" is one of the seeded module slugs.
    let err = dispatcher
        .create(
            "modules",
            &json!({
                "slug": "people",
                "owner_level": "tenant",
                "name": "People Again",
                "kind": "module",
                "modal_size": "m"
            }),
        )
        .await
        .unwrap_err();
    let StratusError::Validation { errors } = err else {
        panic!("expected validation error, got: {err:?}");
    };
    assert!(errors.contains_key("slug"));
}

#[tokio::test]
async fn modules_are_editable_through_dispatch() {
    let dispatcher = setup().await;

    let created = dispatcher
        .create(
            "modules",
            &json!({
                "slug": "invoices",
                "owner_level": "tenant",
                "name": "Invoices",
                "kind": "module",
                "modal_size": "g"
            }),
        )
        .await
        .unwrap();
    assert_eq!(created["slug"], json!("invoices"));

    let page = dispatcher
        .list("modules", Pagination::default())
        .await
        .unwrap();
    assert!(page.items.iter().any(|row| row["slug"] == json!("invoices")));
}
