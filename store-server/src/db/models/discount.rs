//! CustomerDiscount 模型

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountStatus {
    Active,
    Inactive,
}

/// 顾客折扣记录（目前只有生日忠诚度折扣）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerDiscount {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    /// 顾客键 "customer:xxx"
    pub customer_id: String,
    /// 限定商品键，None 表示全场适用
    #[serde(default)]
    pub product_id: Option<String>,
    pub percent: i32,
    pub status: DiscountStatus,
    #[serde(default)]
    pub message: Option<String>,
    pub created_at: i64,
}

/// 折后单价
pub fn discounted_price(price: f64, percent: i32) -> f64 {
    price * (100 - percent.clamp(0, 100)) as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discount_application() {
        assert_eq!(discounted_price(100_000.0, 10), 90_000.0);
        assert_eq!(discounted_price(100_000.0, 0), 100_000.0);
        // Out-of-range percents are clamped
        assert_eq!(discounted_price(100_000.0, 150), 0.0);
        assert_eq!(discounted_price(100_000.0, -5), 100_000.0);
    }
}
