//! 멤버십 기반 권한 판단
//!
//! # 모듈 구조
//!
//! - `status`: 멤버십 상태와 상태 전이
//! - `engine`: 상태 × 공개 범위 × 작업 종류 판단표
//! - `service`: 계획 생성 및 join/withdraw/kick/block

mod engine;
mod service;
mod status;

pub use engine::{decide, ActionClass, Decision, DenyReason};
pub use service::PlanService;
pub use status::{status_of, MembershipRecord, MembershipStatus};
