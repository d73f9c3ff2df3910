//! 사용자 계정 모델

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 계정 상태
///
/// `Active`가 아닌 계정은 호출자에게 "존재하지 않는 사용자"로 보입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Withdrawn,
    Suspended,
    Blocked,
    Deleted,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Withdrawn => "withdrawn",
            AccountStatus::Suspended => "suspended",
            AccountStatus::Blocked => "blocked",
            AccountStatus::Deleted => "deleted",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "active" => Some(AccountStatus::Active),
            "withdrawn" => Some(AccountStatus::Withdrawn),
            "suspended" => Some(AccountStatus::Suspended),
            "blocked" => Some(AccountStatus::Blocked),
            "deleted" => Some(AccountStatus::Deleted),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, AccountStatus::Active)
    }
}

/// 사용자
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,

    /// 로그인 ID (고유)
    pub login_id: String,

    pub nickname: String,

    /// 비밀번호 해시 (PHC 문자열)
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub status: AccountStatus,

    pub created_at: DateTime<Utc>,
}

impl User {
    /// 새 활성 사용자
    pub fn new(login_id: impl Into<String>, nickname: impl Into<String>, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            login_id: login_id.into(),
            nickname: nickname.into(),
            password_hash,
            status: AccountStatus::Active,
            created_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}
