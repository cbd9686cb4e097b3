use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

/// Argon2id keyed with the process-wide pepper. The pepper is mixed into
/// every derivation in addition to the per-credential salt, so a leaked
/// database alone is not enough to mount an offline attack.
fn keyed_argon2(secret_key: &str) -> anyhow::Result<Argon2<'_>> {
    Argon2::new_with_secret(
        secret_key.as_bytes(),
        Algorithm::Argon2id,
        Version::V0x13,
        Params::default(),
    )
    .map_err(|e| {
        error!(error = %e, "argon2 keyed init error");
        anyhow::anyhow!(e.to_string())
    })
}

/// Fresh 128-bit salt from the OS CSPRNG, B64-encoded for storage.
/// Generated once per create and again on every password update.
pub fn generate_salt() -> String {
    SaltString::generate(&mut OsRng).as_str().to_owned()
}

/// Derive the stored hash from (pepper, plaintext, salt). Deterministic for
/// identical inputs; changing any input changes the output.
pub fn derive_password_hash(secret_key: &str, plain: &str, salt: &str) -> anyhow::Result<String> {
    let salt = SaltString::from_b64(salt).map_err(|e| {
        error!(error = %e, "argon2 salt decode error");
        anyhow::anyhow!(e.to_string())
    })?;
    let hash = keyed_argon2(secret_key)?
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Check a presented plaintext against a stored PHC hash using the keyed
/// verifier. Comparison happens inside argon2 in constant time.
pub fn verify_password(secret_key: &str, plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(keyed_argon2(secret_key)?
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}
