//! Per-entity validators.
//!
//! Each function matches [`crate::registry::ValidatorFn`] and is wired
//! into the entity registry at startup. The tenant validator is also
//! called directly by the admin tenant endpoints, which do not go
//! through the generic dispatcher.

use serde_json::Value;

use crate::lifecycle::RecordState;
use crate::models::module::{ModalSize, ModuleKind, OwnerLevel};
use crate::models::module_field::{AUTO_TRANSFORMS, FieldType};
use crate::validate::{ApprovedFields, Check, FieldErrors, ValidationMode};

const STATES: &[&str] = &[
    RecordState::Active.as_str(),
    RecordState::Inactive.as_str(),
];

pub fn validate_person(
    payload: &Value,
    mode: ValidationMode,
) -> Result<ApprovedFields, FieldErrors> {
    Check::new(payload, mode)
        .string("name", true, 255)
        .integer("position", false)
        .one_of("state", false, STATES)
        .finish()
}

/// `password` is accepted in plaintext here and replaced with
/// `password_hash` by the prepare hook before the write.
pub fn validate_user_account(
    payload: &Value,
    mode: ValidationMode,
) -> Result<ApprovedFields, FieldErrors> {
    Check::new(payload, mode)
        .uuid("person_id", true)
        .email("email", true)
        .min_len_string("password", true, 8)
        .one_of("state", false, STATES)
        .finish()
}

pub fn validate_module(
    payload: &Value,
    mode: ValidationMode,
) -> Result<ApprovedFields, FieldErrors> {
    Check::new(payload, mode)
        .slug("slug", true, 100)
        .one_of("owner_level", true, OwnerLevel::ALL)
        .uuid("owner_id", false)
        .string("name", true, 255)
        .optional_string("icon", 100)
        .one_of("kind", true, ModuleKind::ALL)
        .identifier("entity_kind", false, 100)
        .optional_string("url_prefix", 100)
        .optional_string("controller", 255)
        .one_of("modal_size", true, ModalSize::ALL)
        .optional_string("description_index", 255)
        .optional_string("description_show", 255)
        .optional_string("description_store", 255)
        .optional_string("description_update", 255)
        .optional_string("description_delete", 255)
        .optional_string("description_restore", 255)
        .one_of("after_store", false, crate::models::module::POST_ACTIONS)
        .one_of("after_update", false, crate::models::module::POST_ACTIONS)
        .one_of("after_restore", false, crate::models::module::POST_ACTIONS)
        .integer("position", false)
        .one_of("state", false, STATES)
        .finish()
}

pub fn validate_module_field(
    payload: &Value,
    mode: ValidationMode,
) -> Result<ApprovedFields, FieldErrors> {
    Check::new(payload, mode)
        .uuid("module_id", true)
        .identifier("name", true, 100)
        .string("label", true, 255)
        .optional_string("icon", 100)
        .one_of("kind", true, FieldType::ALL)
        .integer("length", false)
        .integer("precision", false)
        .optional_string("default_value", 255)
        .boolean("nullable", false)
        .boolean("required", false)
        .optional_string("min", 50)
        .optional_string("max", 50)
        .boolean("is_unique", false)
        .boolean("indexed", false)
        .identifier("unique_table", false, 100)
        .identifier("unique_column", false, 100)
        .identifier("fk_table", false, 100)
        .identifier("fk_column", false, 100)
        .identifier("fk_label", false, 100)
        .identifier("auto_from", false, 100)
        .one_of("auto_transform", false, AUTO_TRANSFORMS)
        .boolean("main", false)
        .boolean("is_custom", false)
        .one_of("owner_level", false, OwnerLevel::ALL)
        .uuid("owner_id", false)
        .integer("position", false)
        .one_of("state", false, STATES)
        .finish()
}

/// Tenant payloads carry names that end up inside database-level
/// statements, so `db_name` and `db_user` are held to the strict
/// identifier charset regardless of what the storage layer would
/// tolerate.
pub fn validate_tenant(
    payload: &Value,
    mode: ValidationMode,
) -> Result<ApprovedFields, FieldErrors> {
    let check = Check::new(payload, mode)
        .string("name", true, 255)
        .slug("slug", true, 100)
        .date("expiration_date", true)
        .integer("position", false)
        .one_of("state", false, STATES);
    // Credentials are only writable at creation time.
    if mode == ValidationMode::Create {
        check
            .identifier("db_name", true, 63)
            .identifier("db_user", true, 63)
            .min_len_string("db_password", true, 8)
            .finish()
    } else {
        check.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn person_create_ok() {
        let payload = json!({ "name": "Alice", "position": 3 });
        let approved = validate_person(&payload, ValidationMode::Create).unwrap();
        assert_eq!(approved["name"], json!("Alice"));
        assert_eq!(approved["position"], json!(3));
    }

    #[test]
    fn person_rejects_deleted_state() {
        let payload = json!({ "name": "Alice", "state": "Deleted" });
        assert!(validate_person(&payload, ValidationMode::Create).is_err());
    }

    #[test]
    fn user_password_too_short() {
        let payload = json!({
            "person_id": "7f1f5db2-7c1e-4f2b-9e57-0a8f3f6d2c11",
            "email": "a@b.com",
            "password": "short"
        });
        let errors = validate_user_account(&payload, ValidationMode::Create).unwrap_err();
        assert!(errors.contains_key("password"));
    }

    #[test]
    fn user_update_may_omit_password() {
        let payload = json!({ "email": "new@b.com" });
        let approved = validate_user_account(&payload, ValidationMode::Update).unwrap();
        assert_eq!(approved.len(), 1);
    }

    #[test]
    fn module_create_requires_vocab_fields() {
        let payload = json!({
            "slug": "people",
            "owner_level": "platform",
            "name": "People",
            "kind": "module",
            "modal_size": "m",
            "entity_kind": "people"
        });
        let approved = validate_module(&payload, ValidationMode::Create).unwrap();
        assert_eq!(approved["entity_kind"], json!("people"));
    }

    #[test]
    fn module_rejects_unknown_post_action() {
        let payload = json!({
            "slug": "people",
            "owner_level": "platform",
            "name": "People",
            "kind": "module",
            "modal_size": "m",
            "after_store": "dashboard"
        });
        assert!(validate_module(&payload, ValidationMode::Create).is_err());
    }

    #[test]
    fn module_field_rejects_bad_transform() {
        let payload = json!({
            "module_id": "7f1f5db2-7c1e-4f2b-9e57-0a8f3f6d2c11",
            "name": "slug",
            "label": "Slug",
            "kind": "string",
            "auto_from": "name",
            "auto_transform": "reverse"
        });
        assert!(validate_module_field(&payload, ValidationMode::Create).is_err());
    }

    #[test]
    fn tenant_create_requires_credentials() {
        let payload = json!({
            "name": "Acme",
            "slug": "acme",
            "expiration_date": "2027-01-01"
        });
        let errors = validate_tenant(&payload, ValidationMode::Create).unwrap_err();
        assert!(errors.contains_key("db_name"));
        assert!(errors.contains_key("db_user"));
        assert!(errors.contains_key("db_password"));
    }

    #[test]
    fn tenant_update_ignores_credentials() {
        let payload = json!({
            "name": "Acme Renamed",
            "db_password": "newpassword"
        });
        let approved = validate_tenant(&payload, ValidationMode::Update).unwrap();
        assert!(approved.contains_key("name"));
        assert!(!approved.contains_key("db_password"));
    }

    #[test]
    fn tenant_rejects_injection_shaped_db_name() {
        let payload = json!({
            "name": "Acme",
            "slug": "acme",
            "db_name": "acme; REMOVE DATABASE master",
            "db_user": "acme_user",
            "db_password": "password123",
            "expiration_date": "2027-01-01"
        });
        let errors = validate_tenant(&payload, ValidationMode::Create).unwrap_err();
        assert!(errors.contains_key("db_name"));
    }
}
