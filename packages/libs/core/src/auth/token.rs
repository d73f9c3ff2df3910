//! 토큰 서명/검증
//!
//! Access/Refresh Token을 HS256 JWT로 발급하고 검증하는 상태 없는 코덱입니다.

use base64::{engine::general_purpose, Engine as _};
use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use super::claims::{Claims, TokenType};
use crate::error::{CredentialFault, Error, Result};

/// 최소 키 길이 (bytes)
const MIN_KEY_LEN: usize = 32;

/// `Authorization` 헤더에서 Bearer 토큰 추출
///
/// `Bearer ` 접두사가 없거나 값이 비어 있으면 `None`입니다.
pub fn bearer_token(auth_header: Option<&str>) -> Option<&str> {
    let token = auth_header?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// 토큰 발급 설정
#[derive(Debug, Clone)]
pub struct TokenSettings {
    /// `iss` claim 값
    pub issuer: String,

    /// Access Token 수명
    pub access_ttl: Duration,

    /// Refresh Token 수명
    pub refresh_ttl: Duration,
}

impl TokenSettings {
    pub fn new(issuer: impl Into<String>, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            issuer: issuer.into(),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn ttl(&self, typ: TokenType) -> Duration {
        match typ {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        }
    }
}

/// 발급된 토큰 (문자열 + claims)
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// 토큰 코덱
///
/// 서명 키와 발급 설정만 들고 있으며 어떤 상태도 저장하지 않습니다.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    settings: TokenSettings,
}

impl TokenCodec {
    /// 키 원문(hex, base64, base64url, raw)으로 코덱 생성
    pub fn new(secret: &str, settings: TokenSettings) -> Result<Self> {
        let key = parse_key_material(secret).ok_or_else(|| Error::InvalidInput {
            message: format!("signing key must provide at least {} bytes", MIN_KEY_LEN),
        })?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(&key),
            decoding_key: DecodingKey::from_secret(&key),
            settings,
        })
    }

    /// 토큰 발급
    pub fn issue(&self, user_id: Uuid, typ: TokenType) -> Result<IssuedToken> {
        let claims = Claims::new(user_id, &self.settings.issuer, typ, self.settings.ttl(typ));
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| Error::Internal {
                message: format!("token signing failed: {}", e),
            })?;

        Ok(IssuedToken { token, claims })
    }

    /// 토큰 검증 (서명, 발급자, 만료, typ)
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.settings.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| Error::InvalidCredentials(classify(e.kind())))?;

        if data.claims.typ != expected {
            return Err(Error::InvalidCredentials(CredentialFault::WrongType));
        }

        Ok(data.claims)
    }
}

fn classify(kind: &ErrorKind) -> CredentialFault {
    match kind {
        ErrorKind::InvalidSignature => CredentialFault::BadSignature,
        ErrorKind::ExpiredSignature => CredentialFault::Expired,
        ErrorKind::InvalidIssuer => CredentialFault::IssuerMismatch,
        _ => CredentialFault::Malformed,
    }
}

fn parse_key_material(raw: &str) -> Option<Vec<u8>> {
    let trimmed = raw.trim();

    if trimmed.len() >= MIN_KEY_LEN * 2 && trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
        if let Ok(bytes) = hex::decode(trimmed) {
            return Some(bytes);
        }
    }

    if let Ok(bytes) = general_purpose::URL_SAFE_NO_PAD.decode(trimmed) {
        if bytes.len() >= MIN_KEY_LEN {
            return Some(bytes);
        }
    }

    if let Ok(bytes) = general_purpose::STANDARD.decode(trimmed) {
        if bytes.len() >= MIN_KEY_LEN {
            return Some(bytes);
        }
    }

    let raw_bytes = trimmed.as_bytes();
    if raw_bytes.len() >= MIN_KEY_LEN {
        return Some(raw_bytes.to_vec());
    }

    None
}
