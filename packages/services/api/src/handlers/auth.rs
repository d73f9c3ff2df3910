//! /api/auth 핸들러

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use serde::Deserialize;

use tm_core::auth::TokenPair;

use crate::error::Result;
use crate::middleware::access_token;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub login_id: String,
    pub password: String,
    pub nickname: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub login_id: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// POST /api/auth/signup
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignUpRequest>,
) -> Result<Json<TokenPair>> {
    let pair = state
        .auth
        .sign_up(&request.login_id, &request.password, &request.nickname)
        .await?;
    Ok(Json(pair))
}

/// POST /api/auth/signin
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<TokenPair>> {
    let pair = state.auth.sign_in(&request.login_id, &request.password).await?;
    Ok(Json(pair))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenPair>> {
    let pair = state.auth.refresh(&request.refresh_token).await?;
    Ok(Json(pair))
}

/// POST /api/auth/signout
///
/// Access Token의 사용자와 Refresh Token의 subject가 같아야 합니다.
pub async fn sign_out(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<RefreshRequest>,
) -> Result<StatusCode> {
    let user = state.auth.authenticate(access_token(&headers)?).await?;
    state.auth.sign_out(user.id, &request.refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}
