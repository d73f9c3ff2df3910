//! 토큰 Claims
//!
//! Access Token과 Refresh Token이 공유하는 JWT 페이로드 구조입니다.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 토큰 종류 (`typ` claim)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// JWT Claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (사용자 ID)
    pub sub: Uuid,

    /// 발급자
    pub iss: String,

    /// 토큰 종류
    pub typ: TokenType,

    /// 발급 시각 (unix seconds)
    pub iat: i64,

    /// 만료 시각 (unix seconds)
    pub exp: i64,

    /// 토큰 ID. 같은 초에 발급된 토큰끼리도 값이 달라지도록 넣습니다.
    pub jti: String,
}

impl Claims {
    /// 새 claims 생성
    pub fn new(sub: Uuid, issuer: &str, typ: TokenType, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub,
            iss: issuer.to_string(),
            typ,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: ulid::Ulid::new().to_string(),
        }
    }

    /// 만료 시각
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// 만료 여부 확인
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// 남은 TTL (초)
    pub fn remaining_ttl(&self) -> i64 {
        (self.exp - Utc::now().timestamp()).max(0)
    }
}
