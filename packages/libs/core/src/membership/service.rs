//! 계획 관리 서비스
//!
//! 계획 생성과 멤버십 상태 전이(join, withdraw, kick, block)를 수행합니다.

use std::sync::Arc;

use uuid::Uuid;

use super::engine::ActionClass;
use super::status::{self, status_of, MembershipRecord, MembershipStatus};
use crate::directory::{active_user, MembershipDirectory, PlanDirectory, UserDirectory};
use crate::error::{Error, Result};
use crate::guard::{AccessGuard, ResourceKind};
use crate::plan::Plan;

/// 계획 관리 서비스
pub struct PlanService {
    guard: Arc<AccessGuard>,
    users: Arc<dyn UserDirectory>,
    plans: Arc<dyn PlanDirectory>,
    memberships: Arc<dyn MembershipDirectory>,
}

impl PlanService {
    pub fn new(
        guard: Arc<AccessGuard>,
        users: Arc<dyn UserDirectory>,
        plans: Arc<dyn PlanDirectory>,
        memberships: Arc<dyn MembershipDirectory>,
    ) -> Self {
        Self {
            guard,
            users,
            plans,
            memberships,
        }
    }

    /// 계획 생성. 생성자는 OWNER가 됩니다.
    pub async fn create_plan(&self, owner: Uuid, title: &str, is_public: bool) -> Result<Plan> {
        active_user(self.users.as_ref(), owner).await?;
        if title.trim().is_empty() {
            return Err(Error::InvalidInput {
                message: "title must not be blank".to_string(),
            });
        }

        let plan = Plan::new(title.trim(), is_public, owner);
        self.plans.insert(plan.clone()).await?;
        self.memberships
            .upsert(MembershipRecord::new(plan.id, owner, MembershipStatus::Owner))
            .await?;

        tracing::info!(plan_id = %plan.id, owner = %owner, "plan created");
        Ok(plan)
    }

    /// 계획 조회 (read 권한)
    pub async fn get_plan(&self, user_id: Uuid, plan_id: Uuid) -> Result<Plan> {
        let granted = self
            .guard
            .ensure(user_id, plan_id, ResourceKind::Plan, ActionClass::Read)
            .await?;
        Ok(granted.plan)
    }

    /// 계획 삭제 (soft delete, delete 권한)
    pub async fn delete_plan(&self, user_id: Uuid, plan_id: Uuid) -> Result<()> {
        self.guard
            .ensure(user_id, plan_id, ResourceKind::Plan, ActionClass::Delete)
            .await?;
        self.plans.mark_deleted(plan_id).await?;

        tracing::info!(plan_id = %plan_id, user_id = %user_id, "plan deleted");
        Ok(())
    }

    /// 참여
    pub async fn join(&self, user_id: Uuid, plan_id: Uuid) -> Result<MembershipStatus> {
        active_user(self.users.as_ref(), user_id).await?;
        self.guard.live_plan(plan_id).await?;
        let records = self.memberships.find_all_by_plan(plan_id).await?;

        let next = status::join(status_of(&records, user_id))?;
        self.transition(plan_id, user_id, next).await?;
        Ok(next)
    }

    /// 탈퇴
    pub async fn withdraw(&self, user_id: Uuid, plan_id: Uuid) -> Result<MembershipStatus> {
        active_user(self.users.as_ref(), user_id).await?;
        self.guard.live_plan(plan_id).await?;
        let records = self.memberships.find_all_by_plan(plan_id).await?;

        let next = status::withdraw(status_of(&records, user_id))?;
        self.transition(plan_id, user_id, next).await?;
        Ok(next)
    }

    /// 강퇴 (OWNER만, 자기 자신 불가, 대상은 현재 MEMBER)
    pub async fn kick(&self, requester: Uuid, plan_id: Uuid, target: Uuid) -> Result<MembershipStatus> {
        let granted = self
            .guard
            .ensure(requester, plan_id, ResourceKind::Plan, ActionClass::Kick { target })
            .await?;

        let next = status::kick(status_of(&granted.records, target))?;
        self.transition(plan_id, target, next).await?;
        Ok(next)
    }

    /// 차단 (운영 기능 전용, 권한 확인은 호출자 책임)
    pub async fn block(&self, plan_id: Uuid, user_id: Uuid) -> Result<MembershipStatus> {
        self.guard.live_plan(plan_id).await?;
        let records = self.memberships.find_all_by_plan(plan_id).await?;

        let next = status::block(status_of(&records, user_id));
        self.transition(plan_id, user_id, next).await?;
        Ok(next)
    }

    async fn transition(&self, plan_id: Uuid, user_id: Uuid, next: MembershipStatus) -> Result<()> {
        self.memberships
            .upsert(MembershipRecord::new(plan_id, user_id, next))
            .await?;
        tracing::info!(
            plan_id = %plan_id,
            user_id = %user_id,
            status = next.as_str(),
            "membership changed"
        );
        Ok(())
    }
}
