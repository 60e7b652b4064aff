//! Admin account repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use eyeric_core::{AdminRole, AdminUserId, Email};

use super::RepositoryError;
use crate::models::Admin;

#[derive(Debug, sqlx::FromRow)]
struct AdminRow {
    id: AdminUserId,
    email: String,
    name: String,
    role: AdminRole,
    created_at: DateTime<Utc>,
}

impl TryFrom<AdminRow> for Admin {
    type Error = RepositoryError;

    fn try_from(row: AdminRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            email,
            name: row.name,
            role: row.role,
            created_at: row.created_at,
        })
    }
}

/// Repository for admin account operations.
pub struct AdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an admin and their password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn get_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<(Admin, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            #[sqlx(flatten)]
            admin: AdminRow,
            password_hash: String,
        }

        let row: Option<Row> = sqlx::query_as(
            r"
            SELECT id, email, name, role, created_at, password_hash
            FROM admin
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(|row| Ok((Admin::try_from(row.admin)?, row.password_hash)))
            .transpose()
    }

    /// Create an admin account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, password_hash), fields(email = %email))]
    pub async fn create(
        &self,
        email: &Email,
        name: &str,
        password_hash: &str,
        role: AdminRole,
    ) -> Result<Admin, RepositoryError> {
        let row: AdminRow = sqlx::query_as(
            r"
            INSERT INTO admin (email, name, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, name, role, created_at
            ",
        )
        .bind(email.as_str())
        .bind(name)
        .bind(password_hash)
        .bind(role)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "admin email"))?;

        Admin::try_from(row)
    }
}
