//! 멤버십 상태와 상태 전이
//!
//! ```text
//! ∅ / WITHDRAWN / KICKED ──join──▶ MEMBER ──withdraw──▶ WITHDRAWN
//!                                  MEMBER ──kick──────▶ KICKED
//! create ──▶ OWNER
//! any ──block──▶ BLOCKED (sink)
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// 계획별 멤버십 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipStatus {
    Owner,
    Member,
    Withdrawn,
    Kicked,
    Blocked,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Owner => "OWNER",
            MembershipStatus::Member => "MEMBER",
            MembershipStatus::Withdrawn => "WITHDRAWN",
            MembershipStatus::Kicked => "KICKED",
            MembershipStatus::Blocked => "BLOCKED",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "OWNER" => Some(MembershipStatus::Owner),
            "MEMBER" => Some(MembershipStatus::Member),
            "WITHDRAWN" => Some(MembershipStatus::Withdrawn),
            "KICKED" => Some(MembershipStatus::Kicked),
            "BLOCKED" => Some(MembershipStatus::Blocked),
            _ => None,
        }
    }
}

/// (plan, user) 당 하나만 존재하는 멤버십 레코드
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRecord {
    pub plan_id: Uuid,
    pub user_id: Uuid,
    pub status: MembershipStatus,
}

impl MembershipRecord {
    pub fn new(plan_id: Uuid, user_id: Uuid, status: MembershipStatus) -> Self {
        Self {
            plan_id,
            user_id,
            status,
        }
    }
}

/// 레코드 목록에서 특정 사용자의 상태 조회
pub fn status_of(records: &[MembershipRecord], user_id: Uuid) -> Option<MembershipStatus> {
    records
        .iter()
        .find(|record| record.user_id == user_id)
        .map(|record| record.status)
}

/// 참여(join) 전이
pub fn join(current: Option<MembershipStatus>) -> Result<MembershipStatus> {
    match current {
        None | Some(MembershipStatus::Withdrawn) | Some(MembershipStatus::Kicked) => {
            Ok(MembershipStatus::Member)
        }
        Some(MembershipStatus::Owner) | Some(MembershipStatus::Member) => {
            Err(Error::conflict("already a member of this plan"))
        }
        Some(MembershipStatus::Blocked) => Err(Error::Forbidden {
            reason: "blocked from this plan".to_string(),
        }),
    }
}

/// 탈퇴(withdraw) 전이
pub fn withdraw(current: Option<MembershipStatus>) -> Result<MembershipStatus> {
    match current {
        Some(MembershipStatus::Member) => Ok(MembershipStatus::Withdrawn),
        Some(MembershipStatus::Owner) => Err(Error::conflict("plan owner cannot withdraw")),
        None
        | Some(MembershipStatus::Withdrawn)
        | Some(MembershipStatus::Kicked)
        | Some(MembershipStatus::Blocked) => Err(Error::NotFound {
            resource: "membership",
        }),
    }
}

/// 강퇴 대상의 상태 전이
///
/// 요청자 권한은 [`crate::membership::decide`]가 먼저 판단합니다.
pub fn kick(target: Option<MembershipStatus>) -> Result<MembershipStatus> {
    match target {
        Some(MembershipStatus::Member) => Ok(MembershipStatus::Kicked),
        Some(MembershipStatus::Owner) => Err(Error::conflict("plan owner cannot be kicked")),
        Some(MembershipStatus::Withdrawn)
        | Some(MembershipStatus::Kicked)
        | Some(MembershipStatus::Blocked) => Err(Error::conflict("target is not a current member")),
        None => Err(Error::conflict("target has never joined this plan")),
    }
}

/// 차단(block): 어떤 상태에서든 BLOCKED로
pub fn block(_current: Option<MembershipStatus>) -> MembershipStatus {
    MembershipStatus::Blocked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_transitions() {
        assert_eq!(join(None).unwrap(), MembershipStatus::Member);
        assert_eq!(join(Some(MembershipStatus::Withdrawn)).unwrap(), MembershipStatus::Member);
        assert_eq!(join(Some(MembershipStatus::Kicked)).unwrap(), MembershipStatus::Member);

        assert!(matches!(join(Some(MembershipStatus::Member)), Err(Error::DomainConflict { .. })));
        assert!(matches!(join(Some(MembershipStatus::Owner)), Err(Error::DomainConflict { .. })));
        assert!(matches!(join(Some(MembershipStatus::Blocked)), Err(Error::Forbidden { .. })));
    }

    #[test]
    fn test_withdraw_transitions() {
        assert_eq!(withdraw(Some(MembershipStatus::Member)).unwrap(), MembershipStatus::Withdrawn);
        assert!(matches!(withdraw(Some(MembershipStatus::Owner)), Err(Error::DomainConflict { .. })));
        assert!(matches!(withdraw(None), Err(Error::NotFound { .. })));
        assert!(matches!(withdraw(Some(MembershipStatus::Kicked)), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_kick_target_transitions() {
        assert_eq!(kick(Some(MembershipStatus::Member)).unwrap(), MembershipStatus::Kicked);
        for target in [
            None,
            Some(MembershipStatus::Owner),
            Some(MembershipStatus::Withdrawn),
            Some(MembershipStatus::Kicked),
            Some(MembershipStatus::Blocked),
        ] {
            assert!(matches!(kick(target), Err(Error::DomainConflict { .. })));
        }
    }

    #[test]
    fn test_blocked_is_sink() {
        assert_eq!(block(Some(MembershipStatus::Owner)), MembershipStatus::Blocked);
        assert_eq!(block(None), MembershipStatus::Blocked);
        assert!(join(Some(block(Some(MembershipStatus::Member)))).is_err());
        assert!(withdraw(Some(MembershipStatus::Blocked)).is_err());
    }

    #[test]
    fn test_status_of() {
        let plan = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let records = vec![MembershipRecord::new(plan, a, MembershipStatus::Owner)];

        assert_eq!(status_of(&records, a), Some(MembershipStatus::Owner));
        assert_eq!(status_of(&records, b), None);
    }
}
