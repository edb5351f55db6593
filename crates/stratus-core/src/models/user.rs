//! User account model (tenant database).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lifecycle::RecordState;
use crate::models::person::Person;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: Uuid,
    /// The person this login belongs to.
    pub person_id: Uuid,
    pub email: String,
    /// Argon2id PHC-format hash; never serialized to clients.
    pub password_hash: String,
    pub state: RecordState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user account as returned to clients: no password hash, person
/// relation attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub person_id: Uuid,
    pub email: String,
    pub state: RecordState,
    pub person: Option<Person>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AuthenticatedUser {
    pub fn from_account(account: UserAccount, person: Option<Person>) -> Self {
        Self {
            id: account.id,
            person_id: account.person_id,
            email: account.email,
            state: account.state,
            person,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}
