use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::credentials::error::{EngineError, StoreError};
use crate::credentials::model::NewCredential;
use crate::credentials::password;
use crate::credentials::store::CredentialStore;

/// Authentication engine: salt generation, peppered hash derivation and the
/// credential lifecycle operations. Stateless between calls apart from the
/// injected store handle and the pepper, which is read-only after init.
#[derive(Clone)]
pub struct AuthEngine {
    store: Arc<dyn CredentialStore>,
    secret_key: Arc<str>,
}

impl AuthEngine {
    pub fn new(store: Arc<dyn CredentialStore>, secret_key: &str) -> Self {
        Self {
            store,
            secret_key: Arc::from(secret_key),
        }
    }

    /// Create a credential. The collision pre-check exists for a friendlier
    /// error; under concurrent creates the unique indexes are what actually
    /// hold, so a storage-level violation maps to the same conflict errors.
    pub async fn create_user_credential(
        &self,
        username: &str,
        password_plain: &str,
        email: &str,
        authenticated: bool,
    ) -> Result<Uuid, EngineError> {
        let collisions = self
            .store
            .find_by_username_or_email(username, email)
            .await?;
        for existing in &collisions {
            if existing.username == username {
                return Err(EngineError::UsernameTaken);
            }
            if existing.email == email {
                return Err(EngineError::EmailTaken);
            }
        }

        let salt = password::generate_salt();
        let password_hash = password::derive_password_hash(&self.secret_key, password_plain, &salt)
            .map_err(EngineError::Hash)?;

        let new = NewCredential {
            username: username.to_owned(),
            email: email.to_owned(),
            password_hash,
            salt,
            authenticated,
        };
        match self.store.insert(new).await {
            Ok(record) => {
                info!(user_id = %record.id, username = %record.username, "credential created");
                Ok(record.id)
            }
            // Lost the create race to a concurrent writer.
            Err(StoreError::UniqueViolation(field)) => Err(if field == "email" {
                EngineError::EmailTaken
            } else {
                EngineError::UsernameTaken
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Update a credential, keyed by username only. Always regenerates the
    /// salt and re-derives the hash from the supplied password; callers not
    /// rotating the password must resupply the current one.
    pub async fn update_user_credential(
        &self,
        username: &str,
        email: &str,
        password_plain: &str,
        authenticated: bool,
    ) -> Result<(), EngineError> {
        let mut record = match self.store.find_by_username(username).await {
            Ok(record) => record,
            Err(StoreError::NotFound) => return Err(EngineError::NotFound),
            Err(e) => return Err(e.into()),
        };

        let salt = password::generate_salt();
        record.password_hash = password::derive_password_hash(&self.secret_key, password_plain, &salt)
            .map_err(EngineError::Hash)?;
        record.salt = salt;
        record.email = email.to_owned();
        record.authenticated = authenticated;

        match self.store.save(&record).await {
            Ok(()) => {
                info!(user_id = %record.id, username = %record.username, "credential updated");
                Ok(())
            }
            Err(StoreError::UniqueViolation(_)) => Err(EngineError::EmailTaken),
            Err(e) => Err(e.into()),
        }
    }

    /// Mark a credential as verified. Flips the flag only; password hash and
    /// salt are untouched.
    pub async fn authenticate_user_credential(&self, username: &str) -> Result<(), EngineError> {
        let mut record = match self.store.find_by_username(username).await {
            Ok(record) => record,
            Err(StoreError::NotFound) => return Err(EngineError::NotFound),
            Err(e) => return Err(e.into()),
        };

        record.authenticated = true;
        self.store.save(&record).await?;
        info!(user_id = %record.id, username = %record.username, "credential authenticated");
        Ok(())
    }

    /// Verify presented credentials. The unauthenticated-account error is
    /// only reachable once the password has been confirmed correct, so a
    /// wrong-password caller learns nothing about verification state.
    pub async fn check_credentials(
        &self,
        username: &str,
        password_plain: &str,
    ) -> Result<(), EngineError> {
        let record = match self.store.find_by_username(username).await {
            Ok(record) => record,
            Err(e) => {
                warn!(username = %username, error = %e, "credential lookup failed");
                return Err(EngineError::UnknownUser);
            }
        };

        let ok = password::verify_password(&self.secret_key, password_plain, &record.password_hash)
            .map_err(EngineError::Hash)?;
        if !ok {
            return Err(EngineError::IncorrectPassword);
        }
        if !record.authenticated {
            return Err(EngineError::NotAuthenticated);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::store::memory::MemoryStore;

    fn engine() -> AuthEngine {
        AuthEngine::new(Arc::new(MemoryStore::default()), "test-pepper")
    }

    #[tokio::test]
    async fn create_returns_id_and_gates_on_authenticated_flag() {
        let engine = engine();
        let id = engine
            .create_user_credential("alice", "Sup3r$ecret", "alice@x.com", false)
            .await
            .expect("create");
        assert!(!id.is_nil());

        let err = engine
            .check_credentials("alice", "Sup3r$ecret")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotAuthenticated));
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let engine = engine();
        engine
            .create_user_credential("alice", "Sup3r$ecret", "alice@x.com", false)
            .await
            .expect("create");

        let err = engine
            .create_user_credential("alice", "other", "different@x.com", false)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UsernameTaken));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let engine = engine();
        engine
            .create_user_credential("alice", "Sup3r$ecret", "alice@x.com", false)
            .await
            .expect("create");

        let err = engine
            .create_user_credential("bob", "other", "alice@x.com", false)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::EmailTaken));
    }

    #[tokio::test]
    async fn wrong_password_is_rejected_regardless_of_flag() {
        let engine = engine();
        engine
            .create_user_credential("alice", "Sup3r$ecret", "alice@x.com", false)
            .await
            .expect("create");
        let err = engine.check_credentials("alice", "wrongpw").await.unwrap_err();
        assert!(matches!(err, EngineError::IncorrectPassword));

        engine
            .create_user_credential("bob", "Sup3r$ecret", "bob@x.com", true)
            .await
            .expect("create");
        let err = engine.check_credentials("bob", "wrongpw").await.unwrap_err();
        assert!(matches!(err, EngineError::IncorrectPassword));
    }

    #[tokio::test]
    async fn unknown_user_yields_auth_failure() {
        let engine = engine();
        let err = engine
            .check_credentials("ghost", "whatever")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownUser));
    }

    #[tokio::test]
    async fn authenticate_unlocks_login_without_touching_password() {
        let store = Arc::new(MemoryStore::default());
        let engine = AuthEngine::new(store.clone(), "test-pepper");
        engine
            .create_user_credential("alice", "Sup3r$ecret", "alice@x.com", false)
            .await
            .expect("create");
        let before = store.find_by_username("alice").await.expect("find");

        engine
            .authenticate_user_credential("alice")
            .await
            .expect("authenticate");

        let after = store.find_by_username("alice").await.expect("find");
        assert!(after.authenticated);
        assert_eq!(before.password_hash, after.password_hash);
        assert_eq!(before.salt, after.salt);

        engine
            .check_credentials("alice", "Sup3r$ecret")
            .await
            .expect("login after authenticate");
    }

    #[tokio::test]
    async fn authenticate_unknown_user_is_not_found() {
        let engine = engine();
        let err = engine
            .authenticate_user_credential("ghost")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound));
    }

    #[tokio::test]
    async fn update_rotates_salt_and_hash() {
        let store = Arc::new(MemoryStore::default());
        let engine = AuthEngine::new(store.clone(), "test-pepper");
        engine
            .create_user_credential("alice", "Sup3r$ecret", "alice@x.com", false)
            .await
            .expect("create");
        let before = store.find_by_username("alice").await.expect("find");

        engine
            .update_user_credential("alice", "alice2@x.com", "NewPass1!", true)
            .await
            .expect("update");

        let after = store.find_by_username("alice").await.expect("find");
        assert_ne!(before.salt, after.salt);
        assert_ne!(before.password_hash, after.password_hash);
        assert_eq!(after.email, "alice2@x.com");

        engine
            .check_credentials("alice", "NewPass1!")
            .await
            .expect("new password accepted");
        let err = engine
            .check_credentials("alice", "Sup3r$ecret")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::IncorrectPassword));
    }

    #[tokio::test]
    async fn consecutive_updates_never_reuse_a_salt() {
        let store = Arc::new(MemoryStore::default());
        let engine = AuthEngine::new(store.clone(), "test-pepper");
        engine
            .create_user_credential("alice", "Sup3r$ecret", "alice@x.com", true)
            .await
            .expect("create");

        engine
            .update_user_credential("alice", "alice@x.com", "SamePass1!", true)
            .await
            .expect("first update");
        let first = store.find_by_username("alice").await.expect("find");

        engine
            .update_user_credential("alice", "alice@x.com", "SamePass1!", true)
            .await
            .expect("second update");
        let second = store.find_by_username("alice").await.expect("find");

        assert_ne!(first.salt, second.salt);
        assert_ne!(first.password_hash, second.password_hash);
    }

    #[tokio::test]
    async fn update_never_flips_authenticated_implicitly() {
        let store = Arc::new(MemoryStore::default());
        let engine = AuthEngine::new(store.clone(), "test-pepper");
        engine
            .create_user_credential("alice", "Sup3r$ecret", "alice@x.com", false)
            .await
            .expect("create");

        engine
            .update_user_credential("alice", "alice@x.com", "NewPass1!", false)
            .await
            .expect("update");
        let record = store.find_by_username("alice").await.expect("find");
        assert!(!record.authenticated);
    }

    #[tokio::test]
    async fn update_unknown_user_is_not_found() {
        let engine = engine();
        let err = engine
            .update_user_credential("ghost", "ghost@x.com", "pw", false)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound));
    }

    #[tokio::test]
    async fn stored_hash_is_never_the_plaintext() {
        let store = Arc::new(MemoryStore::default());
        let engine = AuthEngine::new(store.clone(), "test-pepper");
        engine
            .create_user_credential("alice", "Sup3r$ecret", "alice@x.com", false)
            .await
            .expect("create");
        let record = store.find_by_username("alice").await.expect("find");
        assert_ne!(record.password_hash, "Sup3r$ecret");

        engine
            .update_user_credential("alice", "alice@x.com", "NewPass1!", false)
            .await
            .expect("update");
        let record = store.find_by_username("alice").await.expect("find");
        assert_ne!(record.password_hash, "NewPass1!");
    }

    #[tokio::test]
    async fn uniqueness_holds_across_successful_creates() {
        let store = Arc::new(MemoryStore::default());
        let engine = AuthEngine::new(store.clone(), "test-pepper");
        for i in 0..5 {
            engine
                .create_user_credential(
                    &format!("user{i}"),
                    "Sup3r$ecret",
                    &format!("user{i}@x.com"),
                    false,
                )
                .await
                .expect("create");
        }

        for i in 0..5 {
            let rows = store
                .find_by_username_or_email(&format!("user{i}"), &format!("user{i}@x.com"))
                .await
                .expect("lookup");
            assert_eq!(rows.len(), 1);
        }
    }
}
