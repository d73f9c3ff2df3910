//! 외부 저장소 인터페이스
//!
//! 사용자, 계획, 멤버십 영속화는 코어 밖의 책임입니다. 코어는 아래 trait만 호출하며,
//! [`MemoryDirectory`]는 테스트/로컬 실행용 구현입니다.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::account::User;
use crate::error::{Error, Result};
use crate::membership::MembershipRecord;
use crate::plan::Plan;

/// 사용자 조회/등록
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_by_login_id(&self, login_id: &str) -> Result<Option<User>>;

    /// 로그인 ID가 이미 있으면 `DomainConflict`
    async fn insert(&self, user: User) -> Result<()>;
}

/// 계획 조회/등록
#[async_trait]
pub trait PlanDirectory: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Plan>>;

    async fn insert(&self, plan: Plan) -> Result<()>;

    /// soft delete
    async fn mark_deleted(&self, id: Uuid) -> Result<()>;
}

/// 멤버십 조회/갱신
#[async_trait]
pub trait MembershipDirectory: Send + Sync {
    async fn find_all_by_plan(&self, plan_id: Uuid) -> Result<Vec<MembershipRecord>>;

    /// (plan, user) 키로 삽입 또는 상태 갱신
    async fn upsert(&self, record: MembershipRecord) -> Result<()>;
}

/// 활성 사용자 조회
///
/// 없는 사용자와 비활성(탈퇴/정지/차단/삭제) 사용자는 모두 `NotFound`입니다.
pub async fn active_user(users: &dyn UserDirectory, id: Uuid) -> Result<User> {
    match users.find_by_id(id).await? {
        Some(user) if user.is_active() => Ok(user),
        Some(user) => {
            tracing::debug!(user_id = %id, status = user.status.as_str(), "inactive user treated as missing");
            Err(Error::user_not_found())
        }
        None => Err(Error::user_not_found()),
    }
}

/// 인메모리 저장소
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    users: RwLock<HashMap<Uuid, User>>,
    plans: RwLock<HashMap<Uuid, Plan>>,
    memberships: RwLock<HashMap<(Uuid, Uuid), MembershipRecord>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 계정 상태 직접 변경 (계정 수명주기는 코어 밖에서 관리)
    pub fn set_user_status(&self, id: Uuid, status: crate::account::AccountStatus) -> Result<()> {
        let mut users = self.users.write();
        let user = users.get_mut(&id).ok_or_else(Error::user_not_found)?;
        user.status = status;
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn find_by_login_id(&self, login_id: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|user| user.login_id == login_id)
            .cloned())
    }

    async fn insert(&self, user: User) -> Result<()> {
        let mut users = self.users.write();
        if users.values().any(|existing| existing.login_id == user.login_id) {
            return Err(Error::conflict("login id already in use"));
        }
        users.insert(user.id, user);
        Ok(())
    }
}

#[async_trait]
impl PlanDirectory for MemoryDirectory {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Plan>> {
        Ok(self.plans.read().get(&id).cloned())
    }

    async fn insert(&self, plan: Plan) -> Result<()> {
        self.plans.write().insert(plan.id, plan);
        Ok(())
    }

    async fn mark_deleted(&self, id: Uuid) -> Result<()> {
        let mut plans = self.plans.write();
        let plan = plans.get_mut(&id).ok_or_else(Error::plan_not_found)?;
        plan.is_deleted = true;
        Ok(())
    }
}

#[async_trait]
impl MembershipDirectory for MemoryDirectory {
    async fn find_all_by_plan(&self, plan_id: Uuid) -> Result<Vec<MembershipRecord>> {
        Ok(self
            .memberships
            .read()
            .values()
            .filter(|record| record.plan_id == plan_id)
            .cloned()
            .collect())
    }

    async fn upsert(&self, record: MembershipRecord) -> Result<()> {
        self.memberships
            .write()
            .insert((record.plan_id, record.user_id), record);
        Ok(())
    }
}
