use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{post, put},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::{
    credentials::{
        dto::{CreateCredentialRequest, CreatedCredential, LoginRequest, UpdateCredentialRequest},
        error::EngineError,
    },
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn credential_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_credential))
        .route("/users/:username", put(update_credential))
        .route("/users/:username/authenticate", post(authenticate_credential))
        .route("/login", post(login))
}

fn status_for(err: &EngineError) -> StatusCode {
    match err {
        EngineError::UsernameTaken | EngineError::EmailTaken => StatusCode::CONFLICT,
        EngineError::NotFound => StatusCode::NOT_FOUND,
        EngineError::UnknownUser
        | EngineError::IncorrectPassword
        | EngineError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        EngineError::Hash(_) | EngineError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[instrument(skip(state, payload))]
pub async fn create_credential(
    State(state): State<AppState>,
    Json(mut payload): Json<CreateCredentialRequest>,
) -> Result<(StatusCode, Json<CreatedCredential>), (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.username.is_empty() {
        warn!("empty username");
        return Err((StatusCode::BAD_REQUEST, "Username required".into()));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }

    let id = state
        .engine
        .create_user_credential(
            &payload.username,
            &payload.password,
            &payload.email,
            payload.authenticated,
        )
        .await
        .map_err(|e| {
            let status = status_for(&e);
            if status.is_server_error() {
                error!(error = %e, "create credential failed");
            } else {
                warn!(username = %payload.username, error = %e, "create credential rejected");
            }
            (status, e.to_string())
        })?;

    info!(user_id = %id, username = %payload.username, "credential registered");
    Ok((StatusCode::CREATED, Json(CreatedCredential { id })))
}

#[instrument(skip(state, payload))]
pub async fn update_credential(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(mut payload): Json<UpdateCredentialRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }

    state
        .engine
        .update_user_credential(
            &username,
            &payload.email,
            &payload.password,
            payload.authenticated,
        )
        .await
        .map_err(|e| {
            let status = status_for(&e);
            if status.is_server_error() {
                error!(error = %e, "update credential failed");
            } else {
                warn!(username = %username, error = %e, "update credential rejected");
            }
            (status, e.to_string())
        })?;

    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn authenticate_credential(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .engine
        .authenticate_user_credential(&username)
        .await
        .map_err(|e| {
            let status = status_for(&e);
            if status.is_server_error() {
                error!(error = %e, "authenticate credential failed");
            } else {
                warn!(username = %username, error = %e, "authenticate credential rejected");
            }
            (status, e.to_string())
        })?;

    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .engine
        .check_credentials(&payload.username, &payload.password)
        .await
        .map_err(|e| {
            let status = status_for(&e);
            if status.is_server_error() {
                error!(error = %e, "login check failed");
            } else {
                warn!(username = %payload.username, error = %e, "login rejected");
            }
            (status, e.to_string())
        })?;

    info!(username = %payload.username, "login accepted");
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::error::StoreError;

    #[test]
    fn email_shape_check() {
        assert!(is_valid_email("alice@x.com"));
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("alice@x"));
        assert!(!is_valid_email("a lice@x.com"));
    }

    #[test]
    fn conflicts_map_to_409_and_auth_failures_to_401() {
        assert_eq!(status_for(&EngineError::UsernameTaken), StatusCode::CONFLICT);
        assert_eq!(status_for(&EngineError::EmailTaken), StatusCode::CONFLICT);
        assert_eq!(
            status_for(&EngineError::IncorrectPassword),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(&EngineError::NotAuthenticated),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_for(&EngineError::UnknownUser), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(&EngineError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&EngineError::Store(StoreError::NotFound)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn created_response_serializes_id() {
        let response = CreatedCredential {
            id: uuid::Uuid::new_v4(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("id"));
    }
}
