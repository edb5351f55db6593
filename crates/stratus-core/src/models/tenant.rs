//! Tenant catalog model.
//!
//! A tenant is an isolated customer: one catalog row in the master
//! database, one dedicated database (and database login) on the
//! cluster. The catalog row never holds the plaintext database
//! password — it is encrypted on write and only decrypted while a
//! connection descriptor is being built.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lifecycle::RecordState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// URL-safe identifier, unique among non-deleted tenants.
    pub slug: String,
    /// Database name suffix; the cluster-wide prefix is prepended when
    /// the physical database is created.
    pub db_name: String,
    /// Dedicated database login for this tenant.
    pub db_user: String,
    /// AES-256-GCM ciphertext (base64). See [`crate::models`] docs.
    pub db_password: String,
    pub expiration_date: NaiveDate,
    /// Display order in admin listings.
    pub position: i64,
    pub state: RecordState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create (and provision) a new tenant.
///
/// `db_password` is plaintext here; the catalog encrypts it before
/// persisting and the provisioner uses it once to create the login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub name: String,
    pub slug: String,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub expiration_date: NaiveDate,
    pub position: Option<i64>,
}

/// Fields that can be updated on an existing tenant.
///
/// Connection credentials (`db_name`, `db_user`, `db_password`) are
/// fixed at provisioning time and cannot be edited here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTenant {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub position: Option<i64>,
    pub state: Option<RecordState>,
}
