//! Default entity registry wiring.
//!
//! Registry keys are the `entity_kind` values stored on module rows;
//! adding an entity means adding a registration here and inserting a
//! module row pointing at it.

use std::sync::Arc;

use stratus_core::error::StratusError;
use stratus_core::registry::{EntityDef, EntityRegistry};
use stratus_core::validate::ApprovedFields;
use stratus_core::validators;

/// Replace the plaintext `password` field with its Argon2id hash
/// before the row is written.
fn hash_user_password(fields: &mut ApprovedFields) -> Result<(), StratusError> {
    if let Some(password) = fields.remove("password") {
        let plaintext = password
            .as_str()
            .ok_or_else(|| StratusError::Internal("password field is not a string".into()))?;
        let hash = stratus_auth::password::hash_password(plaintext)?;
        fields.insert("password_hash".into(), hash.into());
    }
    Ok(())
}

/// Build the registry of all dispatchable entities.
pub fn default_registry() -> Arc<EntityRegistry> {
    let mut registry = EntityRegistry::new();

    registry.register(
        "people",
        EntityDef {
            table: "person",
            orderable: true,
            hidden: &[],
            unique_columns: &[],
            validator: validators::validate_person,
            prepare: None,
        },
    );
    registry.register(
        "users",
        EntityDef {
            table: "user",
            orderable: false,
            hidden: &["password_hash"],
            unique_columns: &["email"],
            validator: validators::validate_user_account,
            prepare: Some(hash_user_password),
        },
    );
    registry.register(
        "modules",
        EntityDef {
            table: "module",
            orderable: true,
            hidden: &[],
            unique_columns: &["slug"],
            validator: validators::validate_module,
            prepare: None,
        },
    );
    registry.register(
        "module-fields",
        EntityDef {
            table: "module_field",
            orderable: true,
            hidden: &[],
            unique_columns: &[],
            validator: validators::validate_module_field,
            prepare: None,
        },
    );

    Arc::new(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stratus_core::validate::ValidationMode;

    #[test]
    fn all_default_entities_registered() {
        let registry = default_registry();
        for kind in ["people", "users", "modules", "module-fields"] {
            assert!(registry.get(kind).is_some(), "{kind} missing");
        }
    }

    #[test]
    fn user_hash_is_hidden_and_email_unique() {
        let registry = default_registry();
        let def = registry.get("users").unwrap();
        assert!(def.hidden.contains(&"password_hash"));
        assert!(def.unique_columns.contains(&"email"));
    }

    #[test]
    fn user_prepare_hashes_password() {
        let registry = default_registry();
        let def = registry.get("users").unwrap();

        let payload = json!({
            "person_id": "7f1f5db2-7c1e-4f2b-9e57-0a8f3f6d2c11",
            "email": "a@b.com",
            "password": "password123"
        });
        let mut approved = (def.validator)(&payload, ValidationMode::Create).unwrap();
        (def.prepare.unwrap())(&mut approved).unwrap();

        assert!(!approved.contains_key("password"));
        let hash = approved["password_hash"].as_str().unwrap();
        assert!(hash.starts_with("$argon2"));
    }
}
