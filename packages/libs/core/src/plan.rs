//! 여행 계획 모델

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 여행 계획
///
/// 권한 판단에 필요한 것은 공개 여부와 삭제 여부뿐입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: Uuid,

    pub title: String,

    /// 공개 계획 여부
    pub is_public: bool,

    /// soft delete 여부
    #[serde(skip_serializing, default)]
    pub is_deleted: bool,

    pub created_by: Uuid,

    pub created_at: DateTime<Utc>,
}

impl Plan {
    pub fn new(title: impl Into<String>, is_public: bool, created_by: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            is_public,
            is_deleted: false,
            created_by,
            created_at: Utc::now(),
        }
    }

    pub fn visibility(&self) -> Visibility {
        if self.is_public {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }
}

/// 계획 공개 범위
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
}
