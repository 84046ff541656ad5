//! Notification 模型（站内通知）

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// 通知类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    TransactionCreated,
    TransactionCompleted,
    PaymentReminder,
    OrderAutoCancelled,
    BirthdayGreeting,
    FeedbackReminder,
}

/// 站内通知记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    /// 顾客键 "customer:xxx"
    pub customer_id: String,
    pub kind: NotificationKind,
    pub body: String,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: i64,
}

impl Notification {
    pub fn key(&self) -> String {
        self.id
            .as_ref()
            .map(|id| id.key().to_string())
            .unwrap_or_default()
    }
}
