//! 通知模块
//!
//! - [`mailer`] - 邮件 outbox（mpsc 队列 + 后台投递 worker）
//! - [`service`] - 通知门面（顾客邮件 / 管理员邮件 / 站内通知）

pub mod mailer;
pub mod service;

pub use mailer::{GatewayTransport, LogTransport, MailTransport, MailWorker, Mailer};
pub use service::Notifier;
