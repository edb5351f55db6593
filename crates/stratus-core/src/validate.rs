//! Request payload validation.
//!
//! Validators run before any write and emit the exact set of fields
//! allowed to reach storage. A field the validator does not know about
//! never makes it into [`ApprovedFields`], so unknown or unexpected
//! attributes in a request body are silently discarded rather than
//! persisted.

use std::collections::BTreeMap;

use serde_json::Value;

/// Field name → accepted value, ready to be written.
pub type ApprovedFields = BTreeMap<String, Value>;

/// Field name → list of human-readable problems with it.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Whether the payload creates a record or patches an existing one.
/// On update, required fields may be absent; when present they are
/// validated the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    Create,
    Update,
}

/// Incremental payload checker. Each rule method inspects one field of
/// the payload, accumulating either the approved value or an error for
/// that field. `finish` yields the approved set or all errors at once.
pub struct Check<'a> {
    payload: &'a Value,
    mode: ValidationMode,
    approved: ApprovedFields,
    errors: FieldErrors,
}

impl<'a> Check<'a> {
    pub fn new(payload: &'a Value, mode: ValidationMode) -> Self {
        let mut errors = FieldErrors::new();
        if !payload.is_object() {
            errors
                .entry("payload".to_string())
                .or_default()
                .push("must be a JSON object".to_string());
        }
        Self {
            payload,
            mode,
            approved: ApprovedFields::new(),
            errors,
        }
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    fn field(&self, name: &str) -> Option<&'a Value> {
        self.payload.get(name).filter(|v| !v.is_null())
    }

    fn fail(&mut self, name: &str, message: impl Into<String>) {
        self.errors
            .entry(name.to_string())
            .or_default()
            .push(message.into());
    }

    /// Handle an absent field: error on create when required, skip
    /// otherwise. Returns `None` when the caller should not validate
    /// further.
    fn presence(&mut self, name: &str, required: bool) -> Option<&'a Value> {
        match self.field(name) {
            Some(value) => Some(value),
            None => {
                if required && self.mode == ValidationMode::Create {
                    self.fail(name, "is required");
                }
                None
            }
        }
    }

    pub fn string(mut self, name: &str, required: bool, max_len: usize) -> Self {
        if let Some(value) = self.presence(name, required) {
            match value.as_str() {
                Some(s) if s.is_empty() => self.fail(name, "must not be empty"),
                Some(s) if s.chars().count() > max_len => {
                    self.fail(name, format!("must be at most {max_len} characters"))
                }
                Some(s) => {
                    self.approved.insert(name.to_string(), Value::from(s));
                }
                None => self.fail(name, "must be a string"),
            }
        }
        self
    }

    pub fn optional_string(self, name: &str, max_len: usize) -> Self {
        self.string(name, false, max_len)
    }

    pub fn email(mut self, name: &str, required: bool) -> Self {
        if let Some(value) = self.presence(name, required) {
            match value.as_str() {
                Some(s) if looks_like_email(s) => {
                    self.approved.insert(name.to_string(), Value::from(s));
                }
                Some(_) => self.fail(name, "must be a valid email address"),
                None => self.fail(name, "must be a string"),
            }
        }
        self
    }

    pub fn boolean(mut self, name: &str, required: bool) -> Self {
        if let Some(value) = self.presence(name, required) {
            match value.as_bool() {
                Some(b) => {
                    self.approved.insert(name.to_string(), Value::from(b));
                }
                None => self.fail(name, "must be a boolean"),
            }
        }
        self
    }

    pub fn integer(mut self, name: &str, required: bool) -> Self {
        if let Some(value) = self.presence(name, required) {
            match value.as_i64() {
                Some(n) => {
                    self.approved.insert(name.to_string(), Value::from(n));
                }
                None => self.fail(name, "must be an integer"),
            }
        }
        self
    }

    pub fn uuid(mut self, name: &str, required: bool) -> Self {
        if let Some(value) = self.presence(name, required) {
            match value.as_str().map(uuid::Uuid::parse_str) {
                Some(Ok(_)) => {
                    self.approved
                        .insert(name.to_string(), value.clone());
                }
                _ => self.fail(name, "must be a UUID"),
            }
        }
        self
    }

    /// String constrained to a fixed vocabulary.
    pub fn one_of(mut self, name: &str, required: bool, allowed: &[&str]) -> Self {
        if let Some(value) = self.presence(name, required) {
            match value.as_str() {
                Some(s) if allowed.contains(&s) => {
                    self.approved.insert(name.to_string(), Value::from(s));
                }
                Some(_) => self.fail(name, format!("must be one of: {}", allowed.join(", "))),
                None => self.fail(name, "must be a string"),
            }
        }
        self
    }

    /// ISO `YYYY-MM-DD` date string.
    pub fn date(mut self, name: &str, required: bool) -> Self {
        if let Some(value) = self.presence(name, required) {
            match value.as_str() {
                Some(s) if chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() => {
                    self.approved.insert(name.to_string(), Value::from(s));
                }
                Some(_) => self.fail(name, "must be a date in YYYY-MM-DD format"),
                None => self.fail(name, "must be a string"),
            }
        }
        self
    }

    /// Lowercase alphanumeric plus underscore, starting with a letter.
    /// Used for names that end up inside database-level statements.
    pub fn identifier(mut self, name: &str, required: bool, max_len: usize) -> Self {
        if let Some(value) = self.presence(name, required) {
            match value.as_str() {
                Some(s) if is_identifier(s) && s.chars().count() <= max_len => {
                    self.approved.insert(name.to_string(), Value::from(s));
                }
                Some(_) => self.fail(
                    name,
                    "must be lowercase letters, digits or underscores, starting with a letter",
                ),
                None => self.fail(name, "must be a string"),
            }
        }
        self
    }

    /// URL-safe slug: lowercase alphanumeric plus hyphen.
    pub fn slug(mut self, name: &str, required: bool, max_len: usize) -> Self {
        if let Some(value) = self.presence(name, required) {
            match value.as_str() {
                Some(s) if is_slug(s) && s.chars().count() <= max_len => {
                    self.approved.insert(name.to_string(), Value::from(s));
                }
                Some(_) => self.fail(
                    name,
                    "must be lowercase letters, digits or hyphens, starting with a letter",
                ),
                None => self.fail(name, "must be a string"),
            }
        }
        self
    }

    /// String with a minimum length; used for passwords, which are
    /// never length-capped.
    pub fn min_len_string(mut self, name: &str, required: bool, min_len: usize) -> Self {
        if let Some(value) = self.presence(name, required) {
            match value.as_str() {
                Some(s) if s.chars().count() < min_len => {
                    self.fail(name, format!("must be at least {min_len} characters"))
                }
                Some(s) => {
                    self.approved.insert(name.to_string(), Value::from(s));
                }
                None => self.fail(name, "must be a string"),
            }
        }
        self
    }

    pub fn finish(self) -> Result<ApprovedFields, FieldErrors> {
        if self.errors.is_empty() {
            Ok(self.approved)
        } else {
            Err(self.errors)
        }
    }
}

fn looks_like_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn is_slug(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn required_field_missing_on_create() {
        let payload = json!({});
        let result = Check::new(&payload, ValidationMode::Create)
            .string("name", true, 255)
            .finish();
        let errors = result.unwrap_err();
        assert_eq!(errors["name"], vec!["is required"]);
    }

    #[test]
    fn required_field_missing_on_update_is_fine() {
        let payload = json!({});
        let approved = Check::new(&payload, ValidationMode::Update)
            .string("name", true, 255)
            .finish()
            .unwrap();
        assert!(approved.is_empty());
    }

    #[test]
    fn present_field_still_checked_on_update() {
        let payload = json!({ "name": 42 });
        let result = Check::new(&payload, ValidationMode::Update)
            .string("name", true, 255)
            .finish();
        assert!(result.is_err());
    }

    #[test]
    fn unknown_fields_are_not_approved() {
        let payload = json!({ "name": "ok", "is_admin": true });
        let approved = Check::new(&payload, ValidationMode::Create)
            .string("name", true, 255)
            .finish()
            .unwrap();
        assert_eq!(approved.len(), 1);
        assert!(approved.contains_key("name"));
        assert!(!approved.contains_key("is_admin"));
    }

    #[test]
    fn multiple_errors_reported_together() {
        let payload = json!({ "name": "", "position": "first" });
        let errors = Check::new(&payload, ValidationMode::Create)
            .string("name", true, 255)
            .integer("position", true)
            .finish()
            .unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn email_rules() {
        for bad in ["plainaddress", "a@b", "@no-local.com", "x@.com"] {
            let payload = json!({ "email": bad });
            assert!(
                Check::new(&payload, ValidationMode::Create)
                    .email("email", true)
                    .finish()
                    .is_err(),
                "{bad} should be rejected"
            );
        }
        let payload = json!({ "email": "admin@admin.com" });
        assert!(
            Check::new(&payload, ValidationMode::Create)
                .email("email", true)
                .finish()
                .is_ok()
        );
    }

    #[test]
    fn identifier_rules() {
        let good = json!({ "db_name": "tenant_one" });
        assert!(
            Check::new(&good, ValidationMode::Create)
                .identifier("db_name", true, 63)
                .finish()
                .is_ok()
        );
        for bad in ["Tenant", "1tenant", "ten-ant", "drop database x"] {
            let payload = json!({ "db_name": bad });
            assert!(
                Check::new(&payload, ValidationMode::Create)
                    .identifier("db_name", true, 63)
                    .finish()
                    .is_err(),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn slug_rules() {
        let good = json!({ "slug": "acme-corp" });
        assert!(
            Check::new(&good, ValidationMode::Create)
                .slug("slug", true, 100)
                .finish()
                .is_ok()
        );
        let bad = json!({ "slug": "Acme Corp" });
        assert!(
            Check::new(&bad, ValidationMode::Create)
                .slug("slug", true, 100)
                .finish()
                .is_err()
        );
    }

    #[test]
    fn one_of_rejects_out_of_vocabulary() {
        let payload = json!({ "state": "Archived" });
        let errors = Check::new(&payload, ValidationMode::Update)
            .one_of("state", false, &["Active", "Inactive"])
            .finish()
            .unwrap_err();
        assert!(errors["state"][0].contains("Active"));
    }

    #[test]
    fn non_object_payload_rejected() {
        let payload = json!([1, 2, 3]);
        let errors = Check::new(&payload, ValidationMode::Create)
            .finish()
            .unwrap_err();
        assert!(errors.contains_key("payload"));
    }

    #[test]
    fn null_counts_as_absent() {
        let payload = json!({ "icon": null });
        let approved = Check::new(&payload, ValidationMode::Update)
            .optional_string("icon", 100)
            .finish()
            .unwrap();
        assert!(approved.is_empty());
    }
}
