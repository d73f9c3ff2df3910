//! 인증 관련 타입 및 로직
//!
//! # 개요
//!
//! 주체는 End User 하나뿐이고 토큰 audience도 이 백엔드 하나입니다.
//!
//! # 토큰 종류
//!
//! - **Access Token**: 짧은 수명의 HS256 JWT (`typ = "access"`), 저장하지 않음
//! - **Refresh Token**: 긴 수명의 HS256 JWT (`typ = "refresh"`), 사용자당 하나만 세션 저장소에 보관

mod claims;
mod lifecycle;
mod password;
mod service;
mod session;
mod token;

pub use claims::{Claims, TokenType};
pub use lifecycle::{TokenLifecycle, TokenPair};
pub use password::{Argon2PasswordHasher, PasswordHasher};
pub use service::AuthService;
pub use session::{MemorySessionStore, RemoveOutcome, SessionStore};
pub use token::{bearer_token, IssuedToken, TokenCodec, TokenSettings};
