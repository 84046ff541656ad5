//! 密码哈希与校验
//!
//! Argon2id PHC 字符串。旧系统迁移过来的记录可能存着明文密码：解析失败时
//! 退回明文比较，匹配成功的调用方应当立即重哈希。

use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::utils::AppError;

/// 校验结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// 密码正确
    Valid,
    /// 密码正确，但存储的是旧明文，需要重哈希
    ValidNeedsRehash,
    /// 密码错误
    Invalid,
}

pub fn hash_password(raw: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(raw.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

pub fn verify_password(raw: &str, stored: &str) -> VerifyOutcome {
    match PasswordHash::new(stored) {
        Ok(parsed) => {
            if Argon2::default()
                .verify_password(raw.as_bytes(), &parsed)
                .is_ok()
            {
                VerifyOutcome::Valid
            } else {
                VerifyOutcome::Invalid
            }
        }
        // Legacy plaintext row
        Err(_) => {
            if raw == stored {
                VerifyOutcome::ValidNeedsRehash
            } else {
                VerifyOutcome::Invalid
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_roundtrip() {
        let hash = hash_password("rahasia123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert_eq!(verify_password("rahasia123", &hash), VerifyOutcome::Valid);
        assert_eq!(verify_password("salah", &hash), VerifyOutcome::Invalid);
    }

    #[test]
    fn legacy_plaintext_requests_rehash() {
        assert_eq!(
            verify_password("rahasia123", "rahasia123"),
            VerifyOutcome::ValidNeedsRehash
        );
        assert_eq!(
            verify_password("salah", "rahasia123"),
            VerifyOutcome::Invalid
        );
    }
}
