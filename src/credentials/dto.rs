use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for credential creation.
#[derive(Debug, Deserialize)]
pub struct CreateCredentialRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub authenticated: bool,
}

/// Request body for credential update; the username comes from the path.
#[derive(Debug, Deserialize)]
pub struct UpdateCredentialRequest {
    pub email: String,
    pub password: String,
    pub authenticated: bool,
}

/// Request body for a login check.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response returned after a successful creation.
#[derive(Debug, Serialize)]
pub struct CreatedCredential {
    pub id: Uuid,
}
