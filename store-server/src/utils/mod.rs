//! 工具模块

pub mod currency;
pub mod error;
pub mod logger;
pub mod time;

pub use currency::format_rupiah;
pub use error::{AppError, AppResult, ok, ok_with_message};
pub use time::format_millis;
