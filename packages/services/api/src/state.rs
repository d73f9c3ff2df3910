//! API 앱 상태

use std::sync::Arc;

use tm_core::auth::{Argon2PasswordHasher, AuthService, TokenCodec, TokenLifecycle};
use tm_core::guard::AccessGuard;
use tm_core::membership::PlanService;

use crate::config::Config;
use crate::db::SqliteStore;

/// 앱 상태
///
/// 모든 핸들러에서 공유하는 상태입니다.
pub struct AppState {
    /// 회원가입/로그인/토큰
    pub auth: AuthService,

    /// 리소스 가드
    pub guard: Arc<AccessGuard>,

    /// 계획/멤버십
    pub plans: PlanService,

    /// SQLite 저장소
    pub store: Arc<SqliteStore>,
}

impl AppState {
    /// 새 상태 생성
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let store = Arc::new(SqliteStore::connect(&config.db_url, 5).await?);
        Ok(Self::with_store(config, store)?)
    }

    pub fn with_store(config: &Config, store: Arc<SqliteStore>) -> tm_core::Result<Self> {
        let codec = TokenCodec::new(&config.jwt_secret, config.token_settings())?;
        let tokens = Arc::new(TokenLifecycle::new(codec, store.clone()));

        let auth = AuthService::new(store.clone(), Arc::new(Argon2PasswordHasher::new()), tokens.clone());
        let guard = Arc::new(AccessGuard::new(
            tokens,
            store.clone(),
            store.clone(),
            store.clone(),
        ));
        let plans = PlanService::new(guard.clone(), store.clone(), store.clone(), store.clone());

        Ok(Self {
            auth,
            guard,
            plans,
            store,
        })
    }
}
