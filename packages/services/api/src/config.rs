//! API 서버 설정

use std::env;

use chrono::Duration;
use tm_core::auth::TokenSettings;

/// API 서버 설정
#[derive(Clone)]
pub struct Config {
    /// 서버 포트
    pub port: u16,

    /// SQLite URL
    pub db_url: String,

    /// JWT 서명 키 (hex, base64, raw)
    pub jwt_secret: String,

    /// `iss` claim
    pub jwt_issuer: String,

    /// Access Token 수명 (초)
    pub access_token_ttl_secs: u32,

    /// Refresh Token 수명 (초)
    pub refresh_token_ttl_secs: u32,
}

/// 토큰 수명 상한 (365일)
const MAX_TTL_SECS: u32 = 365 * 24 * 60 * 60;

impl Config {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            port: env::var("TM_API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,

            db_url: env::var("TM_DB_URL")
                .unwrap_or_else(|_| "sqlite://tripmate.db".to_string()),

            jwt_secret: env::var("TM_JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("TM_JWT_SECRET must be set"))?,

            jwt_issuer: env::var("TM_JWT_ISSUER").unwrap_or_else(|_| "tripmate".to_string()),

            access_token_ttl_secs: parse_ttl(
                "TM_ACCESS_TOKEN_TTL_SECS",
                env::var("TM_ACCESS_TOKEN_TTL_SECS").ok(),
                1800,
            )?,

            refresh_token_ttl_secs: parse_ttl(
                "TM_REFRESH_TOKEN_TTL_SECS",
                env::var("TM_REFRESH_TOKEN_TTL_SECS").ok(),
                1_209_600,
            )?,
        })
    }

    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings::new(
            self.jwt_issuer.clone(),
            Duration::seconds(i64::from(self.access_token_ttl_secs)),
            Duration::seconds(i64::from(self.refresh_token_ttl_secs)),
        )
    }
}

/// 토큰 수명 파싱 (1초 이상, 상한 이하)
fn parse_ttl(name: &str, raw: Option<String>, default: u32) -> anyhow::Result<u32> {
    let Some(raw) = raw else {
        return Ok(default);
    };

    let secs: u32 = raw
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{} must be a positive number of seconds, got {:?}", name, raw))?;
    if secs == 0 || secs > MAX_TTL_SECS {
        anyhow::bail!("{} must be between 1 and {} seconds, got {}", name, MAX_TTL_SECS, secs);
    }
    Ok(secs)
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("db_url", &self.db_url)
            .field("jwt_secret", &"<redacted>")
            .field("jwt_issuer", &self.jwt_issuer)
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .finish()
    }
}
