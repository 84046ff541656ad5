//! Order 模型与状态机

use serde::{Deserialize, Serialize};
use std::fmt;
use surrealdb::RecordId;

use super::serde_helpers;

/// 订单状态
///
/// 正常流转: PROCESSING → AWAITING_VERIFICATION → PAID → SHIPPED → COMPLETED。
/// CANCELLED 可从两个未付款状态进入（超时扫描或管理员操作）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Processing,
    AwaitingVerification,
    Paid,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// 尚未付款（可被超时取消、需要付款提醒）
    pub fn is_unpaid(self) -> bool {
        matches!(self, OrderStatus::Processing | OrderStatus::AwaitingVerification)
    }

    /// 进入该状态后付款提醒视为已结清（置位提醒标志）
    pub fn settles_payment_reminder(self) -> bool {
        matches!(
            self,
            OrderStatus::Paid | OrderStatus::Cancelled | OrderStatus::Completed
        )
    }

    /// 顾客可见的状态名（邮件与通知使用印尼语）
    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Processing => "Diproses",
            OrderStatus::AwaitingVerification => "Menunggu Verifikasi",
            OrderStatus::Paid => "Dibayar",
            OrderStatus::Shipped => "Dikirim",
            OrderStatus::Completed => "Selesai",
            OrderStatus::Cancelled => "Dibatalkan",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 订单记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    /// 顾客键 "customer:xxx"
    pub customer_id: String,
    pub created_at: i64,
    /// 总额 = 明细小计之和 + 运费
    pub total: f64,
    #[serde(default)]
    pub shipping_fee: f64,
    pub status: OrderStatus,
    /// 付款凭证相对路径
    #[serde(default)]
    pub payment_proof: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub feedback_photo: Option<String>,
    pub checkout_at: i64,
    /// 付款截止时间 (unix millis)
    #[serde(default)]
    pub payment_deadline_at: Option<i64>,
    #[serde(default)]
    pub is_payment_reminder_sent: bool,
}

impl Order {
    pub fn key(&self) -> String {
        self.id
            .as_ref()
            .map(|id| id.key().to_string())
            .unwrap_or_default()
    }

    /// 反馈是否为空（None 或空串都算空）
    pub fn feedback_is_empty(&self) -> bool {
        self.feedback.as_deref().map_or(true, |f| f.trim().is_empty())
    }
}

/// 订单明细
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    /// 订单键 "order:xxx"
    pub order_id: String,
    /// 商品键 "product:xxx"
    pub product_id: String,
    /// 下单时的商品名（冗余存储，商品改名不影响历史订单）
    pub product_name: String,
    pub quantity: i64,
    /// 下单时的单价
    pub unit_price: f64,
    /// quantity * unit_price
    pub subtotal: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reminder_flag_recomputation() {
        // Paid/terminal statuses settle the reminder, unpaid ones do not
        assert!(OrderStatus::Paid.settles_payment_reminder());
        assert!(OrderStatus::Cancelled.settles_payment_reminder());
        assert!(OrderStatus::Completed.settles_payment_reminder());
        assert!(!OrderStatus::Processing.settles_payment_reminder());
        assert!(!OrderStatus::AwaitingVerification.settles_payment_reminder());
        assert!(!OrderStatus::Shipped.settles_payment_reminder());
    }

    #[test]
    fn unpaid_statuses() {
        assert!(OrderStatus::Processing.is_unpaid());
        assert!(OrderStatus::AwaitingVerification.is_unpaid());
        assert!(!OrderStatus::Paid.is_unpaid());
        assert!(!OrderStatus::Cancelled.is_unpaid());
    }

    #[test]
    fn status_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::AwaitingVerification).unwrap(),
            "\"AWAITING_VERIFICATION\""
        );
        assert_eq!(
            serde_json::from_str::<OrderStatus>("\"CANCELLED\"").unwrap(),
            OrderStatus::Cancelled
        );
    }

    #[test]
    fn empty_feedback_detection() {
        let mut order = Order {
            id: None,
            customer_id: "customer:a".into(),
            created_at: 0,
            total: 0.0,
            shipping_fee: 0.0,
            status: OrderStatus::Completed,
            payment_proof: None,
            shipping_address: None,
            feedback: None,
            feedback_photo: None,
            checkout_at: 0,
            payment_deadline_at: None,
            is_payment_reminder_sent: false,
        };
        assert!(order.feedback_is_empty());
        order.feedback = Some("   ".into());
        assert!(order.feedback_is_empty());
        order.feedback = Some("Mantap".into());
        assert!(!order.feedback_is_empty());
    }
}
