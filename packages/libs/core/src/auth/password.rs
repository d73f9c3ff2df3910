//! 비밀번호 해시
//!
//! 코어는 해시 방식을 알지 못하고 [`PasswordHasher`]만 호출합니다.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString};
use argon2::Argon2;

use crate::error::{Error, Result};

/// 비밀번호 해시/검증 능력
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String>;

    fn verify(&self, plain: &str, hash: &str) -> bool;
}

/// Argon2id (PHC 문자열) 구현
#[derive(Default)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, plain: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(plain.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| Error::Internal {
                message: format!("password hashing failed: {}", e),
            })
    }

    fn verify(&self, plain: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self.argon2.verify_password(plain.as_bytes(), &parsed).is_ok(),
            Err(_) => false,
        }
    }
}
