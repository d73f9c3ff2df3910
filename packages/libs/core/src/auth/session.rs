//! Refresh 세션 저장소
//!
//! 사용자별로 "현재 유효한" Refresh Token 문자열 하나만 TTL과 함께 보관합니다.
//! 운영 환경에서는 분산 TTL 저장소, 테스트/로컬에서는 [`MemorySessionStore`]를 주입합니다.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::Result;

/// 조건부 삭제 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// 일치하는 세션을 삭제함
    Removed,
    /// 세션이 없음 (또는 이미 만료)
    Missing,
    /// 세션은 있으나 다른 토큰임
    Mismatch,
}

/// Refresh 세션 저장소
///
/// 모든 쓰기 연산은 키(사용자) 단위로 원자적이어야 합니다.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 현재 토큰 조회 (만료된 항목은 없는 것으로 취급)
    async fn get(&self, user_id: Uuid) -> Result<Option<String>>;

    /// 무조건 덮어쓰기
    async fn put(&self, user_id: Uuid, token: &str, expires_at: DateTime<Utc>) -> Result<()>;

    /// 저장된 값이 `expected`와 정확히 같을 때만 `replacement`로 교체
    async fn compare_and_swap(
        &self,
        user_id: Uuid,
        expected: &str,
        replacement: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// 저장된 값이 `expected`와 같을 때만 삭제
    async fn remove_if(&self, user_id: Uuid, expected: &str) -> Result<RemoveOutcome>;
}

#[derive(Debug, Clone)]
struct SessionEntry {
    token: String,
    expires_at: DateTime<Utc>,
}

impl SessionEntry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// 인메모리 세션 저장소
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<Uuid, SessionEntry>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 만료된 항목 정리. 삭제된 개수를 반환합니다.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, user_id: Uuid) -> Result<Option<String>> {
        let now = Utc::now();
        let entries = self.entries.read();
        Ok(entries
            .get(&user_id)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.token.clone()))
    }

    async fn put(&self, user_id: Uuid, token: &str, expires_at: DateTime<Utc>) -> Result<()> {
        self.entries.write().insert(
            user_id,
            SessionEntry {
                token: token.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        user_id: Uuid,
        expected: &str,
        replacement: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool> {
        let now = Utc::now();
        let mut entries = self.entries.write();
        match entries.get_mut(&user_id) {
            Some(entry) if entry.is_live(now) && entry.token == expected => {
                entry.token = replacement.to_string();
                entry.expires_at = expires_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove_if(&self, user_id: Uuid, expected: &str) -> Result<RemoveOutcome> {
        let now = Utc::now();
        let mut entries = self.entries.write();
        let outcome = match entries.get(&user_id) {
            None => RemoveOutcome::Missing,
            Some(entry) if !entry.is_live(now) => RemoveOutcome::Missing,
            Some(entry) if entry.token != expected => RemoveOutcome::Mismatch,
            Some(_) => RemoveOutcome::Removed,
        };

        if outcome != RemoveOutcome::Mismatch {
            entries.remove(&user_id);
        }
        Ok(outcome)
    }
}
