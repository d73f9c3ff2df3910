//! 회원가입/로그인/토큰 갱신/로그아웃

use std::sync::Arc;

use uuid::Uuid;

use super::lifecycle::{TokenLifecycle, TokenPair};
use super::password::PasswordHasher;
use crate::account::User;
use crate::directory::{active_user, UserDirectory};
use crate::error::{CredentialFault, Error, Result};

/// 인증 서비스
pub struct AuthService {
    users: Arc<dyn UserDirectory>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<TokenLifecycle>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<TokenLifecycle>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// 회원가입 후 토큰 발급
    pub async fn sign_up(&self, login_id: &str, password: &str, nickname: &str) -> Result<TokenPair> {
        require("loginId", login_id)?;
        require("password", password)?;
        require("nickname", nickname)?;

        let login_id = login_id.trim();
        if self.users.find_by_login_id(login_id).await?.is_some() {
            return Err(Error::conflict("login id already in use"));
        }

        let hash = self.hasher.hash(password)?;
        let user = User::new(login_id, nickname.trim(), hash);
        let user_id = user.id;
        self.users.insert(user).await?;

        tracing::info!(user_id = %user_id, "user signed up");
        self.tokens.issue_initial_tokens(user_id).await
    }

    /// 로그인
    ///
    /// 활성 사용자가 없으면 `NotFound`, 비밀번호가 틀리면 `InvalidCredentials`입니다.
    pub async fn sign_in(&self, login_id: &str, password: &str) -> Result<TokenPair> {
        let user = match self.users.find_by_login_id(login_id.trim()).await? {
            Some(user) if user.is_active() => user,
            _ => return Err(Error::user_not_found()),
        };

        if !self.hasher.verify(password, &user.password_hash) {
            tracing::warn!(
                cause = %CredentialFault::PasswordMismatch,
                user_id = %user.id,
                "credential rejected"
            );
            return Err(Error::InvalidCredentials(CredentialFault::PasswordMismatch));
        }

        tracing::info!(user_id = %user.id, "user signed in");
        self.tokens.issue_initial_tokens(user.id).await
    }

    /// 토큰 갱신 (Refresh Token 회전)
    ///
    /// 활성 계정만 회전할 수 있습니다. 비활성 계정이면 세션을 지우고 `NotFound`입니다.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let user_id = self.tokens.refresh_subject(refresh_token)?;

        if let Err(err) = active_user(self.users.as_ref(), user_id).await {
            if matches!(err, Error::NotFound { .. }) {
                if let Err(revoke_err) = self.tokens.revoke(user_id, refresh_token).await {
                    tracing::debug!(user_id = %user_id, error = %revoke_err, "stale session left in place");
                }
            }
            return Err(err);
        }

        self.tokens.rotate(refresh_token).await
    }

    /// 로그아웃
    pub async fn sign_out(&self, user_id: Uuid, refresh_token: &str) -> Result<()> {
        self.tokens.revoke(user_id, refresh_token).await?;
        tracing::info!(user_id = %user_id, "user signed out");
        Ok(())
    }

    /// Access Token → 활성 사용자
    pub async fn authenticate(&self, access_token: &str) -> Result<User> {
        let user_id = self.tokens.verify_access(access_token)?;
        active_user(self.users.as_ref(), user_id).await
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput {
            message: format!("{} must not be blank", field),
        });
    }
    Ok(())
}
