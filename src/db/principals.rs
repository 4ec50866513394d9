//! Principal repository.
//!
//! Handles principal creation, lookup, and role lifecycle updates. Email
//! uniqueness is enforced by the schema; the UNIQUE violation is mapped to a
//! distinguishable [`DbError::EmailExists`] so a racing duplicate insert is
//! never mistaken for an internal failure.

use super::DbError;
use classgate_authz::{Principal, Role};
use sqlx::SqlitePool;

/// Fields for creating a new principal.
#[derive(Debug, Clone)]
pub struct NewPrincipal<'a> {
    pub email: &'a str,
    pub display_name: &'a str,
    /// Stored credential form, if one was issued at creation.
    pub password_hash: Option<&'a str>,
    pub global_role: Role,
    pub organization_id: Option<i64>,
}

/// Repository for principal operations.
pub struct PrincipalRepository<'a> {
    pool: &'a SqlitePool,
}

type PrincipalRow = (i64, String, String, String, Option<i64>);

fn decode_row((id, email, display_name, role, organization_id): PrincipalRow) -> Result<Principal, DbError> {
    let global_role: Role = role
        .parse()
        .map_err(|_| DbError::InvalidRow(format!("principal {id} has unknown role {role:?}")))?;
    Ok(Principal {
        id,
        email,
        display_name,
        global_role,
        organization_id,
    })
}

impl<'a> PrincipalRepository<'a> {
    /// Create a new principal repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a principal.
    pub async fn create(&self, fields: NewPrincipal<'_>) -> Result<Principal, DbError> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO principals (email, display_name, password_hash, global_role, organization_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(fields.email)
        .bind(fields.display_name)
        .bind(fields.password_hash)
        .bind(fields.global_role.as_str())
        .bind(fields.organization_id)
        .bind(now)
        .execute(self.pool)
        .await
        .map_err(|e| {
            // Convert UNIQUE constraint violation to EmailExists error
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return DbError::EmailExists(fields.email.to_string());
            }
            DbError::from(e)
        })?;

        Ok(Principal {
            id: result.last_insert_rowid(),
            email: fields.email.to_string(),
            display_name: fields.display_name.to_string(),
            global_role: fields.global_role,
            organization_id: fields.organization_id,
        })
    }

    /// Find a principal by ID.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Principal>, DbError> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT id, email, display_name, global_role, organization_id
            FROM principals
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(decode_row).transpose()
    }

    /// Find a principal by email (case-insensitive, like the schema).
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, DbError> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT id, email, display_name, global_role, organization_id
            FROM principals
            WHERE email = ? COLLATE NOCASE
            "#,
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(decode_row).transpose()
    }
}
