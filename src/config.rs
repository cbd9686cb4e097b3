use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    /// Server-side pepper mixed into every password derivation. Required;
    /// losing or changing it invalidates all stored hashes.
    pub secret_key: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let secret_key = std::env::var("SECRET_KEY")?;
        Ok(Self {
            database_url,
            secret_key,
        })
    }
}
