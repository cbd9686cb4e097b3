use axum::async_trait;
use sqlx::PgPool;

use crate::credentials::error::StoreError;
use crate::credentials::model::{NewCredential, UserCredential};

/// Storage seam for credential records. Each call is one logical round trip
/// to durable storage; no caching, no transaction spanning calls.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Every record whose username or email matches. Used only for the
    /// pre-creation collision check, so 0, 1 or 2 rows.
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Vec<UserCredential>, StoreError>;

    /// Persist a new credential; the store assigns id and timestamps.
    async fn insert(&self, new: NewCredential) -> Result<UserCredential, StoreError>;

    /// Canonical identity lookup.
    async fn find_by_username(&self, username: &str) -> Result<UserCredential, StoreError>;

    /// Persist mutations (email, password_hash, salt, authenticated) to an
    /// existing record and bump updated_at.
    async fn save(&self, record: &UserCredential) -> Result<(), StoreError>;
}

const PG_UNIQUE_VIOLATION: &str = "23505";

fn map_db_err(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(PG_UNIQUE_VIOLATION) => {
            let field = if db.constraint().is_some_and(|c| c.contains("email")) {
                "email"
            } else {
                "username"
            };
            StoreError::UniqueViolation(field.to_owned())
        }
        other => StoreError::Database(other),
    }
}

#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Vec<UserCredential>, StoreError> {
        let rows = sqlx::query_as::<_, UserCredential>(
            r#"
            SELECT id, username, email, password_hash, salt, authenticated, created_at, updated_at
            FROM user_credentials
            WHERE username = $1 OR email = $2
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(rows)
    }

    async fn insert(&self, new: NewCredential) -> Result<UserCredential, StoreError> {
        let record = sqlx::query_as::<_, UserCredential>(
            r#"
            INSERT INTO user_credentials (username, email, password_hash, salt, authenticated)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, password_hash, salt, authenticated, created_at, updated_at
            "#,
        )
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.salt)
        .bind(new.authenticated)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(record)
    }

    async fn find_by_username(&self, username: &str) -> Result<UserCredential, StoreError> {
        let record = sqlx::query_as::<_, UserCredential>(
            r#"
            SELECT id, username, email, password_hash, salt, authenticated, created_at, updated_at
            FROM user_credentials
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(record)
    }

    async fn save(&self, record: &UserCredential) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE user_credentials
            SET email = $2, password_hash = $3, salt = $4, authenticated = $5, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(record.id)
        .bind(&record.email)
        .bind(&record.password_hash)
        .bind(&record.salt)
        .bind(record.authenticated)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
