//! 멤버십 권한 판단
//!
//! 요청자 멤버십 상태 × 계획 공개 범위 × 작업 종류로 허용/거부를 결정하는 순수 함수입니다.
//!
//! | 작업                 | BLOCKED | OWNER/MEMBER | WITHDRAWN/KICKED | 기록 없음 |
//! |----------------------|---------|--------------|------------------|-----------|
//! | read (공개)          | 거부    | 허용         | 허용             | 허용      |
//! | read (비공개)        | 거부    | 허용         | 거부             | 거부      |
//! | write                | 거부    | 허용         | 거부             | 거부      |
//! | delete               | 거부    | 허용         | 거부             | 거부      |
//! | kick                 | 거부    | OWNER만 허용 | 거부             | 거부      |

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::{status_of, MembershipRecord, MembershipStatus};
use crate::error::{Error, Result};
use crate::plan::{Plan, Visibility};

/// 작업 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionClass {
    Read,
    Write,
    Delete,
    /// 특정 멤버 강퇴
    Kick { target: Uuid },
}

impl ActionClass {
    /// 문자열에서 파싱 (kick은 대상이 필요하므로 제외)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "read" => Some(ActionClass::Read),
            "write" | "modify" => Some(ActionClass::Write),
            "delete" => Some(ActionClass::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionClass::Read => "read",
            ActionClass::Write => "write",
            ActionClass::Delete => "delete",
            ActionClass::Kick { .. } => "kick",
        }
    }
}

/// 거부 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// 계획에서 차단됨
    Blocked,
    /// 비공개 계획의 현재 멤버가 아님
    NotVisible,
    /// 현재 멤버가 아님
    NotMember,
    /// 소유자가 아님
    NotOwner,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::Blocked => "blocked from this plan",
            DenyReason::NotVisible => "plan is private",
            DenyReason::NotMember => "not a member of this plan",
            DenyReason::NotOwner => "only the plan owner may do this",
        }
    }
}

/// 판단 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// 권한 판단
///
/// 삭제된 계획은 판단 대상이 아니므로 `NotFound`를 반환합니다. 강퇴 대상이 잘못된 경우
/// (자기 자신, OWNER, 현재 멤버가 아님)는 거부가 아니라 `DomainConflict`입니다.
pub fn decide(
    requester: Uuid,
    records: &[MembershipRecord],
    plan: &Plan,
    action: ActionClass,
) -> Result<Decision> {
    if plan.is_deleted {
        return Err(Error::plan_not_found());
    }

    let status = status_of(records, requester);
    let visibility = plan.visibility();

    let decision = match action {
        ActionClass::Read => read(status, visibility),
        ActionClass::Write | ActionClass::Delete => participate(status),
        ActionClass::Kick { target } => return kick(requester, status, records, target),
    };

    Ok(decision)
}

fn read(status: Option<MembershipStatus>, visibility: Visibility) -> Decision {
    match (status, visibility) {
        (Some(MembershipStatus::Blocked), _) => Decision::Deny(DenyReason::Blocked),
        (Some(MembershipStatus::Owner | MembershipStatus::Member), _) => Decision::Allow,
        (Some(MembershipStatus::Withdrawn | MembershipStatus::Kicked) | None, Visibility::Public) => {
            Decision::Allow
        }
        (Some(MembershipStatus::Withdrawn | MembershipStatus::Kicked) | None, Visibility::Private) => {
            Decision::Deny(DenyReason::NotVisible)
        }
    }
}

fn participate(status: Option<MembershipStatus>) -> Decision {
    match status {
        Some(MembershipStatus::Blocked) => Decision::Deny(DenyReason::Blocked),
        Some(MembershipStatus::Owner | MembershipStatus::Member) => Decision::Allow,
        Some(MembershipStatus::Withdrawn | MembershipStatus::Kicked) | None => {
            Decision::Deny(DenyReason::NotMember)
        }
    }
}

fn kick(
    requester: Uuid,
    status: Option<MembershipStatus>,
    records: &[MembershipRecord],
    target: Uuid,
) -> Result<Decision> {
    if status == Some(MembershipStatus::Blocked) {
        return Ok(Decision::Deny(DenyReason::Blocked));
    }
    if requester == target {
        return Err(Error::conflict("cannot kick yourself"));
    }

    match status {
        Some(MembershipStatus::Owner) => {}
        Some(MembershipStatus::Member) => return Ok(Decision::Deny(DenyReason::NotOwner)),
        Some(MembershipStatus::Withdrawn | MembershipStatus::Kicked | MembershipStatus::Blocked)
        | None => return Ok(Decision::Deny(DenyReason::NotMember)),
    }

    super::status::kick(status_of(records, target))?;
    Ok(Decision::Allow)
}
