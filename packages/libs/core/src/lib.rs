//! tm-core: Tripmate 세션/접근 제어 핵심 라이브러리
//!
//! 여행 계획 서비스의 모든 기능이 거치는 두 가지 공통 메커니즘을 제공합니다.
//!
//! # 모듈 구조
//!
//! - `auth`: JWT 발급/검증, Refresh 세션 저장소, 토큰 회전, 회원가입/로그인
//! - `membership`: 멤버십 상태 전이와 권한 판단
//! - `guard`: 계획/장소/마커/지출 리소스 가드
//! - `directory`: 사용자/계획/멤버십 저장소 인터페이스
//! - `account`, `plan`: 도메인 모델
//! - `error`: 공통 에러 타입

pub mod account;
pub mod auth;
pub mod directory;
pub mod error;
pub mod guard;
pub mod membership;
pub mod plan;

pub use error::{CredentialFault, Error, Result};
