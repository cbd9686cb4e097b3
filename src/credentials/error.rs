use thiserror::Error;

/// Failures surfaced by a [`CredentialStore`](super::store::CredentialStore).
///
/// `Database` covers connectivity and query failures and is the retryable
/// class; `NotFound` and `UniqueViolation` are definitive answers from the
/// storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential not found")]
    NotFound,
    #[error("unique constraint violated on {0}")]
    UniqueViolation(String),
    #[error("storage failure")]
    Database(#[from] sqlx::Error),
}

/// Failures surfaced by the [`AuthEngine`](super::engine::AuthEngine).
///
/// Conflicts (`UsernameTaken`, `EmailTaken`) and auth failures
/// (`UnknownUser`, `IncorrectPassword`, `NotAuthenticated`) are
/// user-correctable and never worth retrying; `Hash` and `Store` are
/// internal.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("username already taken")]
    UsernameTaken,
    #[error("email already taken")]
    EmailTaken,
    #[error("user credential not found")]
    NotFound,
    #[error("unable to authenticate user")]
    UnknownUser,
    #[error("incorrect password")]
    IncorrectPassword,
    #[error("account email is not authenticated")]
    NotAuthenticated,
    #[error(transparent)]
    Hash(anyhow::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// True for infrastructure failures a caller may retry; conflicts and
    /// auth failures stay false.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Store(StoreError::Database(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_storage_failures_are_retryable() {
        let infra = EngineError::Store(StoreError::Database(sqlx::Error::PoolTimedOut));
        assert!(infra.is_retryable());

        assert!(!EngineError::UsernameTaken.is_retryable());
        assert!(!EngineError::IncorrectPassword.is_retryable());
        assert!(!EngineError::Store(StoreError::NotFound).is_retryable());
    }

    #[test]
    fn conflict_messages_name_the_colliding_field() {
        assert_eq!(EngineError::UsernameTaken.to_string(), "username already taken");
        assert_eq!(EngineError::EmailTaken.to_string(), "email already taken");
        assert_eq!(EngineError::IncorrectPassword.to_string(), "incorrect password");
    }
}
