//! SurrealDB implementation of [`UserRepository`].
//!
//! Lives in a tenant database. User accounts are written through the
//! generic dispatcher (which hashes passwords in its prepare hook);
//! this repository covers the lookups the auth flow needs.

use chrono::{DateTime, Utc};
use stratus_core::error::StratusResult;
use stratus_core::models::person::Person;
use stratus_core::models::user::UserAccount;
use stratus_core::repository::UserRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::parse_state;

#[derive(Debug, SurrealValue)]
struct UserRow {
    person_id: String,
    email: String,
    password_hash: String,
    state: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    person_id: String,
    email: String,
    password_hash: String,
    state: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct PersonRow {
    name: String,
    position: i64,
    state: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_account(self, id: Uuid) -> Result<UserAccount, DbError> {
        let person_id = Uuid::parse_str(&self.person_id)
            .map_err(|e| DbError::Decode(format!("invalid person UUID: {e}")))?;
        Ok(UserAccount {
            id,
            person_id,
            email: self.email,
            password_hash: self.password_hash,
            state: parse_state(&self.state)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl UserRowWithId {
    fn try_into_account(self) -> Result<UserAccount, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        UserRow {
            person_id: self.person_id,
            email: self.email,
            password_hash: self.password_hash,
            state: self.state,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_account(id)
    }
}

/// SurrealDB implementation of the user repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn get_by_email(&self, email: &str) -> StratusResult<UserAccount> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE email = $email AND state != 'Deleted'",
            )
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.try_into_account()?)
    }

    async fn get_by_id(&self, id: Uuid) -> StratusResult<UserAccount> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_account(id)?)
    }

    async fn get_person(&self, id: Uuid) -> StratusResult<Person> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('person', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PersonRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "person".into(),
            id: id_str,
        })?;

        Ok(Person {
            id,
            name: row.name,
            position: row.position,
            state: parse_state(&row.state)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
