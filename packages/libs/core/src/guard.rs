//! 리소스 가드
//!
//! 계획, 장소, 마커, 지출 접근 시 공통으로 거치는 확인 절차입니다.
//!
//! 1. Access Token 검증 → 사용자 ID, 활성 계정 확인 (비활성은 `NotFound`)
//! 2. 계획 조회 (없거나 삭제됨 → `NotFound`), 멤버십과 무관하게 먼저 확인
//! 3. 계획의 멤버십 목록 조회
//! 4. 권한 판단
//! 5. 거부 시 리소스별 사유와 함께 `Forbidden`

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::User;
use crate::auth::TokenLifecycle;
use crate::directory::{active_user, MembershipDirectory, PlanDirectory, UserDirectory};
use crate::error::{Error, Result};
use crate::membership::{decide, ActionClass, Decision, MembershipRecord};
use crate::plan::Plan;

/// 보호 대상 리소스 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Plan,
    Place,
    Marker,
    Expense,
}

impl ResourceKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "plan" => Some(ResourceKind::Plan),
            "place" => Some(ResourceKind::Place),
            "marker" => Some(ResourceKind::Marker),
            "expense" => Some(ResourceKind::Expense),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Plan => "plan",
            ResourceKind::Place => "place",
            ResourceKind::Marker => "marker",
            ResourceKind::Expense => "expense",
        }
    }

    fn plural(&self) -> &'static str {
        match self {
            ResourceKind::Plan => "plans",
            ResourceKind::Place => "places",
            ResourceKind::Marker => "markers",
            ResourceKind::Expense => "expenses",
        }
    }

    /// 사람이 읽을 수 있는 거부 메시지
    pub fn deny_message(&self, action: ActionClass) -> String {
        match (self, action) {
            (ResourceKind::Plan, ActionClass::Read) => "no permission to view this plan".to_string(),
            (ResourceKind::Plan, ActionClass::Write) => "no permission to edit this plan".to_string(),
            (ResourceKind::Plan, ActionClass::Delete) => "no permission to delete this plan".to_string(),
            (_, ActionClass::Kick { .. }) => "no permission to kick members of this plan".to_string(),
            (kind, ActionClass::Read) => format!("no permission to view {} of this plan", kind.plural()),
            (kind, ActionClass::Write) => format!("no permission to modify {} of this plan", kind.plural()),
            (kind, ActionClass::Delete) => format!("no permission to delete {} of this plan", kind.plural()),
        }
    }
}

/// 가드를 통과한 요청의 컨텍스트
#[derive(Debug, Clone)]
pub struct Granted {
    pub user: User,
    pub plan: Plan,
    pub records: Vec<MembershipRecord>,
}

/// 리소스 가드
pub struct AccessGuard {
    tokens: Arc<TokenLifecycle>,
    users: Arc<dyn UserDirectory>,
    plans: Arc<dyn PlanDirectory>,
    memberships: Arc<dyn MembershipDirectory>,
}

impl AccessGuard {
    pub fn new(
        tokens: Arc<TokenLifecycle>,
        users: Arc<dyn UserDirectory>,
        plans: Arc<dyn PlanDirectory>,
        memberships: Arc<dyn MembershipDirectory>,
    ) -> Self {
        Self {
            tokens,
            users,
            plans,
            memberships,
        }
    }

    /// Access Token → 활성 사용자
    pub async fn principal(&self, access_token: &str) -> Result<User> {
        let user_id = self.tokens.verify_access(access_token)?;
        active_user(self.users.as_ref(), user_id).await
    }

    /// 권한 판단 결과만 반환 (거부도 `Ok`)
    pub async fn authorize(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        action: ActionClass,
    ) -> Result<Decision> {
        let (_, _, _, decision) = self.evaluate(user_id, plan_id, action).await?;
        Ok(decision)
    }

    /// 권한 확인. 거부는 `Forbidden`으로 변환합니다.
    pub async fn ensure(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        resource: ResourceKind,
        action: ActionClass,
    ) -> Result<Granted> {
        let (user, plan, records, decision) = self.evaluate(user_id, plan_id, action).await?;

        match decision {
            Decision::Allow => Ok(Granted { user, plan, records }),
            Decision::Deny(reason) => {
                tracing::debug!(
                    user_id = %user_id,
                    plan_id = %plan_id,
                    resource = resource.as_str(),
                    action = action.as_str(),
                    reason = reason.as_str(),
                    "access denied"
                );
                Err(Error::Forbidden {
                    reason: resource.deny_message(action),
                })
            }
        }
    }

    /// Access Token부터 시작하는 전체 확인 절차
    pub async fn check(
        &self,
        access_token: &str,
        plan_id: Uuid,
        resource: ResourceKind,
        action: ActionClass,
    ) -> Result<Granted> {
        let user_id = self.tokens.verify_access(access_token)?;
        self.ensure(user_id, plan_id, resource, action).await
    }

    /// 존재하는(삭제되지 않은) 계획 조회
    pub async fn live_plan(&self, plan_id: Uuid) -> Result<Plan> {
        match self.plans.find_by_id(plan_id).await? {
            Some(plan) if !plan.is_deleted => Ok(plan),
            _ => Err(Error::plan_not_found()),
        }
    }

    async fn evaluate(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        action: ActionClass,
    ) -> Result<(User, Plan, Vec<MembershipRecord>, Decision)> {
        let user = active_user(self.users.as_ref(), user_id).await?;
        let plan = self.live_plan(plan_id).await?;
        let records = self.memberships.find_all_by_plan(plan_id).await?;
        let decision = decide(user_id, &records, &plan, action)?;
        Ok((user, plan, records, decision))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountStatus;
    use crate::auth::{MemorySessionStore, TokenCodec, TokenSettings};
    use crate::directory::MemoryDirectory;
    use crate::membership::MembershipStatus;
    use chrono::Duration;

    const SECRET: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    struct Harness {
        dir: Arc<MemoryDirectory>,
        tokens: Arc<TokenLifecycle>,
        guard: AccessGuard,
    }

    fn harness() -> Harness {
        let dir = Arc::new(MemoryDirectory::new());
        let codec = TokenCodec::new(
            SECRET,
            TokenSettings::new("tripmate", Duration::minutes(30), Duration::days(14)),
        )
        .unwrap();
        let tokens = Arc::new(TokenLifecycle::new(codec, Arc::new(MemorySessionStore::new())));
        let guard = AccessGuard::new(tokens.clone(), dir.clone(), dir.clone(), dir.clone());
        Harness { dir, tokens, guard }
    }

    async fn user(h: &Harness, login_id: &str) -> Uuid {
        let user = User::new(login_id, login_id, "hash".to_string());
        let id = user.id;
        UserDirectory::insert(h.dir.as_ref(), user).await.unwrap();
        id
    }

    async fn plan(h: &Harness, owner: Uuid, is_public: bool) -> Uuid {
        let plan = Plan::new("Gangneung", is_public, owner);
        let id = plan.id;
        PlanDirectory::insert(h.dir.as_ref(), plan).await.unwrap();
        h.dir
            .upsert(MembershipRecord::new(id, owner, MembershipStatus::Owner))
            .await
            .unwrap();
        id
    }

    #[tokio::test]
    async fn test_check_with_access_token() {
        let h = harness();
        let owner = user(&h, "owner").await;
        let plan_id = plan(&h, owner, false).await;
        let pair = h.tokens.issue_initial_tokens(owner).await.unwrap();

        let granted = h
            .guard
            .check(&pair.access_token, plan_id, ResourceKind::Place, ActionClass::Write)
            .await
            .unwrap();
        assert_eq!(granted.user.id, owner);
        assert_eq!(granted.plan.id, plan_id);

        let result = h
            .guard
            .check(&pair.refresh_token, plan_id, ResourceKind::Place, ActionClass::Read)
            .await;
        assert!(matches!(result, Err(Error::InvalidCredentials(_))));
    }

    #[tokio::test]
    async fn test_denial_carries_resource_reason() {
        let h = harness();
        let owner = user(&h, "owner").await;
        let stranger = user(&h, "stranger").await;
        let plan_id = plan(&h, owner, true).await;

        assert!(h.guard.authorize(stranger, plan_id, ActionClass::Read).await.unwrap().is_allowed());

        match h
            .guard
            .ensure(stranger, plan_id, ResourceKind::Expense, ActionClass::Write)
            .await
        {
            Err(Error::Forbidden { reason }) => {
                assert_eq!(reason, "no permission to modify expenses of this plan")
            }
            other => panic!("expected forbidden, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_inactive_user_is_not_found_not_forbidden() {
        let h = harness();
        let owner = user(&h, "owner").await;
        let plan_id = plan(&h, owner, false).await;

        h.dir.set_user_status(owner, AccountStatus::Withdrawn).unwrap();

        let result = h
            .guard
            .ensure(owner, plan_id, ResourceKind::Marker, ActionClass::Read)
            .await;
        assert!(matches!(result, Err(Error::NotFound { resource: "user" })));
    }

    #[tokio::test]
    async fn test_missing_or_deleted_plan_is_not_found() {
        let h = harness();
        let owner = user(&h, "owner").await;
        let stranger = user(&h, "stranger").await;
        let plan_id = plan(&h, owner, false).await;

        let result = h.guard.authorize(owner, Uuid::new_v4(), ActionClass::Read).await;
        assert!(matches!(result, Err(Error::NotFound { resource: "plan" })));

        h.dir.mark_deleted(plan_id).await.unwrap();

        // 삭제된 계획은 멤버십과 무관하게 NotFound
        for who in [owner, stranger] {
            let result = h
                .guard
                .ensure(who, plan_id, ResourceKind::Plan, ActionClass::Read)
                .await;
            assert!(matches!(result, Err(Error::NotFound { resource: "plan" })));
        }
    }

    #[test]
    fn test_resource_kind_parsing() {
        assert_eq!(ResourceKind::from_str("Place"), Some(ResourceKind::Place));
        assert_eq!(ResourceKind::from_str("expense"), Some(ResourceKind::Expense));
        assert_eq!(ResourceKind::from_str("receipt"), None);
        assert_eq!(
            ResourceKind::Plan.deny_message(ActionClass::Delete),
            "no permission to delete this plan"
        );
    }
}
