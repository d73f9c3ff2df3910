//! 공통 에러 타입
//!
//! 세션/권한 코어 전체에서 사용되는 에러 타입을 정의합니다.
//! 외부 호출자에게는 분류(인증 실패, 미존재, 권한 없음, 도메인 충돌)만 노출되고,
//! 인증 실패의 세부 원인은 로깅용으로만 보존됩니다.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// 인증 실패의 내부 원인
///
/// `Display`/`code()`로는 절대 노출되지 않으며 tracing 필드로만 기록됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialFault {
    /// 토큰 형식 오류 (디코딩 불가, 필수 claim 누락)
    Malformed,
    /// 서명 불일치
    BadSignature,
    /// 발급자(iss) 불일치
    IssuerMismatch,
    /// typ 불일치 (access ↔ refresh 혼용)
    WrongType,
    /// 만료
    Expired,
    /// 토큰 subject와 요청 사용자 불일치
    SubjectMismatch,
    /// 저장된 세션 없음
    SessionMissing,
    /// 저장된 세션과 제시된 토큰 불일치
    SessionMismatch,
    /// 비밀번호 불일치
    PasswordMismatch,
}

impl CredentialFault {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialFault::Malformed => "malformed",
            CredentialFault::BadSignature => "bad_signature",
            CredentialFault::IssuerMismatch => "issuer_mismatch",
            CredentialFault::WrongType => "wrong_type",
            CredentialFault::Expired => "expired",
            CredentialFault::SubjectMismatch => "subject_mismatch",
            CredentialFault::SessionMissing => "session_missing",
            CredentialFault::SessionMismatch => "session_mismatch",
            CredentialFault::PasswordMismatch => "password_mismatch",
        }
    }
}

impl std::fmt::Display for CredentialFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 코어 공통 에러
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────────
    // Auth Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("invalid credentials")]
    InvalidCredentials(CredentialFault),

    // ─────────────────────────────────────────────────────────────────────────────
    // Lookup / Access Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    #[error("forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("conflict: {message}")]
    DomainConflict { message: String },

    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Backend Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("storage error: {message}")]
    Storage { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl Error {
    pub fn user_not_found() -> Self {
        Error::NotFound { resource: "user" }
    }

    pub fn plan_not_found() -> Self {
        Error::NotFound { resource: "plan" }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Error::DomainConflict {
            message: message.into(),
        }
    }

    pub fn storage(err: impl std::fmt::Display) -> Self {
        Error::Storage {
            message: err.to_string(),
        }
    }

    /// 인증 실패 원인 (로깅용)
    pub fn credential_fault(&self) -> Option<CredentialFault> {
        match self {
            Error::InvalidCredentials(fault) => Some(*fault),
            _ => None,
        }
    }

    /// HTTP 상태 코드로 변환
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Error::InvalidInput { .. } => 400,

            // 401 Unauthorized
            Error::InvalidCredentials(_) => 401,

            // 403 Forbidden
            Error::Forbidden { .. } => 403,

            // 404 Not Found
            Error::NotFound { .. } => 404,

            // 409 Conflict
            Error::DomainConflict { .. } => 409,

            // 500 Internal Server Error
            Error::Storage { .. } | Error::Internal { .. } => 500,
        }
    }

    /// 에러 코드 (클라이언트용)
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidCredentials(_) => "INVALID_CREDENTIALS",
            Error::NotFound { .. } => "NOT_FOUND",
            Error::Forbidden { .. } => "FORBIDDEN",
            Error::DomainConflict { .. } => "CONFLICT",
            Error::InvalidInput { .. } => "INVALID_INPUT",
            Error::Storage { .. } => "STORAGE_ERROR",
            Error::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}
