use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::response::{ApiError, ApiResponse};
use crate::api::server::AppState;

#[derive(Deserialize)]
pub struct CreateUserPayload {
    pub user: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct GetUserParams {
    pub user: Option<String>,
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateUserPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected create-user body");
        ApiError::Validation("Invalid JSON")
    })?;

    state
        .users
        .create_user(&payload.user, &payload.password)
        .await
        .map_err(|e| ApiError::storage("Error saving user", e))?;

    Ok(ApiResponse::<()>::with_status(
        StatusCode::CREATED,
        "User created successfully",
        None,
    ))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    params: Result<Query<GetUserParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected get-user query");
        ApiError::Validation("The 'user' parameter is required")
    })?;

    let username = params
        .user
        .filter(|u| !u.is_empty())
        .ok_or(ApiError::Validation("The 'user' parameter is required"))?;

    let user = state
        .users
        .get_user(&username)
        .await
        .map_err(|e| ApiError::storage("Error retrieving user", e))?
        .ok_or(ApiError::NotFound("User not found"))?;

    Ok(ApiResponse::with_status(StatusCode::OK, "User found", Some(user)))
}
