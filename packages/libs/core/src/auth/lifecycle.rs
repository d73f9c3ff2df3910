//! 토큰 수명 관리
//!
//! 발급, 회전(rotation), 폐기, Access Token 검증을 담당합니다.
//!
//! # 세션 모델
//!
//! 사용자당 Refresh 세션은 하나뿐입니다. 새로 발급하면 이전 세션은 즉시 무효가 되고,
//! 회전/폐기된 Refresh Token은 서명이 유효하고 만료 전이어도 저장소 비교를 통과할 수 없습니다.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::claims::{Claims, TokenType};
use super::session::{RemoveOutcome, SessionStore};
use super::token::TokenCodec;
use crate::error::{CredentialFault, Error, Result};

/// Access/Refresh Token 쌍
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// 토큰 수명 관리자
pub struct TokenLifecycle {
    codec: TokenCodec,
    sessions: Arc<dyn SessionStore>,
}

impl TokenLifecycle {
    pub fn new(codec: TokenCodec, sessions: Arc<dyn SessionStore>) -> Self {
        Self { codec, sessions }
    }

    /// 최초 토큰 발급 (회원가입/로그인 직후)
    ///
    /// 기존 세션은 조건 없이 덮어씁니다.
    pub async fn issue_initial_tokens(&self, user_id: Uuid) -> Result<TokenPair> {
        let access = self.codec.issue(user_id, TokenType::Access)?;
        let refresh = self.codec.issue(user_id, TokenType::Refresh)?;

        self.sessions
            .put(user_id, &refresh.token, refresh.claims.expires_at())
            .await?;

        tracing::debug!(user_id = %user_id, "issued initial token pair");
        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
        })
    }

    /// Refresh Token 회전
    ///
    /// 저장된 값과 바이트 단위로 같을 때만 교체되며, 동시에 같은 토큰으로 들어온
    /// 요청 중 하나만 성공합니다.
    pub async fn rotate(&self, presented: &str) -> Result<TokenPair> {
        let claims = self.verify_refresh(presented)?;
        let user_id = claims.sub;

        let access = self.codec.issue(user_id, TokenType::Access)?;
        let refresh = self.codec.issue(user_id, TokenType::Refresh)?;

        let swapped = self
            .sessions
            .compare_and_swap(user_id, presented, &refresh.token, refresh.claims.expires_at())
            .await?;
        if !swapped {
            let fault = match self.sessions.get(user_id).await? {
                Some(_) => CredentialFault::SessionMismatch,
                None => CredentialFault::SessionMissing,
            };
            return Err(reject(fault, Some(user_id)));
        }

        tracing::debug!(user_id = %user_id, "rotated refresh token");
        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
        })
    }

    /// 세션 폐기 (로그아웃)
    ///
    /// 저장된 세션이 없으면 이미 로그아웃된 것으로 보고 성공합니다.
    pub async fn revoke(&self, user_id: Uuid, presented: &str) -> Result<()> {
        let claims = self.verify_refresh(presented)?;
        if claims.sub != user_id {
            return Err(reject(CredentialFault::SubjectMismatch, Some(user_id)));
        }

        match self.sessions.remove_if(user_id, presented).await? {
            RemoveOutcome::Removed => {
                tracing::debug!(user_id = %user_id, "revoked refresh session");
                Ok(())
            }
            RemoveOutcome::Missing => {
                tracing::debug!(user_id = %user_id, "no refresh session to revoke");
                Ok(())
            }
            RemoveOutcome::Mismatch => Err(reject(CredentialFault::SessionMismatch, Some(user_id))),
        }
    }

    /// Access Token 검증 → 사용자 ID
    pub fn verify_access(&self, token: &str) -> Result<Uuid> {
        self.codec
            .verify(token, TokenType::Access)
            .map(|claims| claims.sub)
            .map_err(|e| log_rejection(e, None))
    }

    /// Refresh Token 검증 → 사용자 ID (세션 저장소는 보지 않음)
    pub fn refresh_subject(&self, token: &str) -> Result<Uuid> {
        self.verify_refresh(token).map(|claims| claims.sub)
    }

    fn verify_refresh(&self, token: &str) -> Result<Claims> {
        self.codec
            .verify(token, TokenType::Refresh)
            .map_err(|e| log_rejection(e, None))
    }
}

fn reject(fault: CredentialFault, user_id: Option<Uuid>) -> Error {
    log_rejection(Error::InvalidCredentials(fault), user_id)
}

fn log_rejection(err: Error, user_id: Option<Uuid>) -> Error {
    if let Some(fault) = err.credential_fault() {
        match user_id {
            Some(user_id) => tracing::warn!(cause = %fault, user_id = %user_id, "credential rejected"),
            None => tracing::warn!(cause = %fault, "credential rejected"),
        }
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::MemorySessionStore;
    use crate::auth::token::TokenSettings;
    use chrono::Duration;

    const SECRET: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn lifecycle() -> (TokenLifecycle, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::new());
        let codec = TokenCodec::new(
            SECRET,
            TokenSettings::new("tripmate", Duration::minutes(30), Duration::days(14)),
        )
        .unwrap();
        (TokenLifecycle::new(codec, store.clone()), store)
    }

    fn fault<T: std::fmt::Debug>(result: Result<T>) -> CredentialFault {
        result.unwrap_err().credential_fault().expect("credential error")
    }

    #[tokio::test]
    async fn test_issue_stores_refresh_session() {
        let (tokens, store) = lifecycle();
        let user = Uuid::new_v4();

        let pair = tokens.issue_initial_tokens(user).await.unwrap();

        assert_eq!(store.get(user).await.unwrap(), Some(pair.refresh_token.clone()));
        assert_eq!(tokens.verify_access(&pair.access_token).unwrap(), user);
    }

    #[tokio::test]
    async fn test_new_sign_in_replaces_previous_session() {
        let (tokens, _) = lifecycle();
        let user = Uuid::new_v4();

        let first = tokens.issue_initial_tokens(user).await.unwrap();
        let second = tokens.issue_initial_tokens(user).await.unwrap();

        assert_eq!(fault(tokens.rotate(&first.refresh_token).await), CredentialFault::SessionMismatch);
        assert!(tokens.rotate(&second.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_rotation_is_single_use() {
        let (tokens, store) = lifecycle();
        let user = Uuid::new_v4();
        let original = tokens.issue_initial_tokens(user).await.unwrap();

        let rotated = tokens.rotate(&original.refresh_token).await.unwrap();
        assert_ne!(rotated.refresh_token, original.refresh_token);
        assert_eq!(store.get(user).await.unwrap(), Some(rotated.refresh_token.clone()));

        // 원래 토큰 재사용 (replay)
        assert_eq!(fault(tokens.rotate(&original.refresh_token).await), CredentialFault::SessionMismatch);

        // 새 토큰으로는 계속 회전 가능
        assert!(tokens.rotate(&rotated.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_rotation_allows_one_winner() {
        let (tokens, _) = lifecycle();
        let tokens = Arc::new(tokens);
        let user = Uuid::new_v4();
        let original = tokens.issue_initial_tokens(user).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tokens = tokens.clone();
                let presented = original.refresh_token.clone();
                tokio::spawn(async move { tokens.rotate(&presented).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn test_rotation_without_session_is_missing() {
        let (tokens, store) = lifecycle();
        let user = Uuid::new_v4();
        let pair = tokens.issue_initial_tokens(user).await.unwrap();

        store.remove_if(user, &pair.refresh_token).await.unwrap();

        assert_eq!(fault(tokens.rotate(&pair.refresh_token).await), CredentialFault::SessionMissing);
        assert_eq!(tokens.refresh_subject(&pair.refresh_token).unwrap(), user);
    }

    #[tokio::test]
    async fn test_rotate_rejects_access_token() {
        let (tokens, _) = lifecycle();
        let pair = tokens.issue_initial_tokens(Uuid::new_v4()).await.unwrap();

        assert_eq!(fault(tokens.rotate(&pair.access_token).await), CredentialFault::WrongType);
        assert_eq!(fault(tokens.verify_access(&pair.refresh_token)), CredentialFault::WrongType);
    }

    #[tokio::test]
    async fn test_revoke_then_reuse_fails() {
        let (tokens, store) = lifecycle();
        let user = Uuid::new_v4();
        let pair = tokens.issue_initial_tokens(user).await.unwrap();

        tokens.revoke(user, &pair.refresh_token).await.unwrap();
        assert_eq!(store.get(user).await.unwrap(), None);

        assert_eq!(fault(tokens.rotate(&pair.refresh_token).await), CredentialFault::SessionMissing);

        // 세션이 없으면 로그아웃은 멱등 성공이고, 세션이 되살아나지 않음
        tokens.revoke(user, &pair.refresh_token).await.unwrap();
        assert_eq!(store.get(user).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_revoke_with_stale_token_fails() {
        let (tokens, store) = lifecycle();
        let user = Uuid::new_v4();
        let stale = tokens.issue_initial_tokens(user).await.unwrap();
        let current = tokens.rotate(&stale.refresh_token).await.unwrap();

        assert_eq!(
            fault(tokens.revoke(user, &stale.refresh_token).await),
            CredentialFault::SessionMismatch
        );
        assert_eq!(store.get(user).await.unwrap(), Some(current.refresh_token));
    }

    #[tokio::test]
    async fn test_revoke_rejects_other_users_token() {
        let (tokens, _) = lifecycle();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let bobs = tokens.issue_initial_tokens(bob).await.unwrap();

        assert_eq!(
            fault(tokens.revoke(alice, &bobs.refresh_token).await),
            CredentialFault::SubjectMismatch
        );
        assert!(tokens.rotate(&bobs.refresh_token).await.is_ok());
    }
}
