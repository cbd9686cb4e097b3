use crate::state::AppState;
use axum::Router;

mod dto;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod model;
pub mod password;
pub mod store;

pub fn router() -> Router<AppState> {
    handlers::credential_routes()
}
