use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Credential record as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserCredential {
    pub id: Uuid,                     // server-generated, immutable
    pub username: String,             // unique, case-sensitive
    pub email: String,                // unique
    #[serde(skip_serializing)]
    pub password_hash: String,        // peppered Argon2 PHC string, never plaintext
    #[serde(skip_serializing)]
    pub salt: String,                 // per-credential B64 salt
    pub authenticated: bool,          // false until email verification flips it
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields supplied on insert; id and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub authenticated: bool,
}
