//! /api/plans 핸들러

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tm_core::guard::ResourceKind;
use tm_core::membership::{ActionClass, Decision, DenyReason, MembershipRecord};
use tm_core::plan::Plan;

use crate::error::{ApiError, Result};
use crate::middleware::access_token;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanRequest {
    pub title: String,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Deserialize)]
pub struct AccessQuery {
    pub resource: String,
    pub action: String,
}

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenyReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AccessResponse {
    fn new(resource: ResourceKind, action: ActionClass, decision: Decision) -> Self {
        match decision {
            Decision::Allow => Self {
                allowed: true,
                reason: None,
                message: None,
            },
            Decision::Deny(reason) => Self {
                allowed: false,
                reason: Some(reason),
                message: Some(resource.deny_message(action)),
            },
        }
    }
}

async fn caller(state: &AppState, headers: &HeaderMap) -> Result<Uuid> {
    let user = state.guard.principal(access_token(headers)?).await?;
    Ok(user.id)
}

/// POST /api/plans
pub async fn create_plan(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CreatePlanRequest>,
) -> Result<(StatusCode, Json<Plan>)> {
    let user_id = caller(&state, &headers).await?;
    let plan = state
        .plans
        .create_plan(user_id, &request.title, request.is_public)
        .await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

/// GET /api/plans/{id}
pub async fn get_plan(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(plan_id): Path<Uuid>,
) -> Result<Json<Plan>> {
    let user_id = caller(&state, &headers).await?;
    Ok(Json(state.plans.get_plan(user_id, plan_id).await?))
}

/// DELETE /api/plans/{id}
pub async fn delete_plan(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(plan_id): Path<Uuid>,
) -> Result<StatusCode> {
    let user_id = caller(&state, &headers).await?;
    state.plans.delete_plan(user_id, plan_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/plans/{id}/join
pub async fn join(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(plan_id): Path<Uuid>,
) -> Result<Json<MembershipRecord>> {
    let user_id = caller(&state, &headers).await?;
    let status = state.plans.join(user_id, plan_id).await?;
    Ok(Json(MembershipRecord::new(plan_id, user_id, status)))
}

/// POST /api/plans/{id}/withdraw
pub async fn withdraw(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(plan_id): Path<Uuid>,
) -> Result<Json<MembershipRecord>> {
    let user_id = caller(&state, &headers).await?;
    let status = state.plans.withdraw(user_id, plan_id).await?;
    Ok(Json(MembershipRecord::new(plan_id, user_id, status)))
}

/// POST /api/plans/{id}/members/{userId}/kick
pub async fn kick(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((plan_id, target)): Path<(Uuid, Uuid)>,
) -> Result<Json<MembershipRecord>> {
    let user_id = caller(&state, &headers).await?;
    let status = state.plans.kick(user_id, plan_id, target).await?;
    Ok(Json(MembershipRecord::new(plan_id, target, status)))
}

/// GET /api/plans/{id}/access?resource=&action=
///
/// 장소/마커/지출 서비스가 쓰는 권한 조회입니다. 거부도 200으로 응답합니다.
pub async fn check_access(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(plan_id): Path<Uuid>,
    Query(query): Query<AccessQuery>,
) -> Result<Json<AccessResponse>> {
    let resource = ResourceKind::from_str(&query.resource).ok_or_else(|| ApiError::BadRequest {
        message: format!("unknown resource: {}", query.resource),
    })?;
    let action = ActionClass::from_str(&query.action).ok_or_else(|| ApiError::BadRequest {
        message: format!("unknown action: {}", query.action),
    })?;

    let user_id = caller(&state, &headers).await?;
    let decision = state.guard.authorize(user_id, plan_id, action).await?;

    tracing::debug!(
        plan_id = %plan_id,
        user_id = %user_id,
        resource = resource.as_str(),
        action = action.as_str(),
        allowed = decision.is_allowed(),
        "access checked"
    );

    Ok(Json(AccessResponse::new(resource, action, decision)))
}
