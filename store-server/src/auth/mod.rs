//! 认证模块
//!
//! - [`password`] - Argon2 哈希与校验（兼容旧系统明文密码）
//! - [`session`] - 内存会话存储（cookie token）
//! - [`extractor`] - 当前顾客 extractor

pub mod extractor;
pub mod password;
pub mod session;

pub use extractor::CurrentCustomer;
pub use session::{SESSION_COOKIE, SessionService};
