//! Customer 模型

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use validator::Validate;

use super::serde_helpers;

/// 顾客记录
///
/// `password` 正常情况下是 Argon2 PHC 字符串；从旧系统迁移的记录可能是
/// 明文，登录成功后会被重新哈希。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    pub name: String,
    pub address: String,
    pub birth_date: NaiveDate,
    pub phone: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
    /// 生日折扣是否生效
    #[serde(default)]
    pub is_birthday_discount_active: bool,
    /// 生日折扣激活时间 (unix millis)，24 小时后过期
    #[serde(default)]
    pub birthday_discount_activated_at: Option<i64>,
    /// 累计已完成订单消费额，生日扫描时重算
    #[serde(default)]
    pub lifetime_spend: f64,
}

impl Customer {
    /// 纯 id（去掉表前缀），记录未持久化时返回空串
    pub fn key(&self) -> String {
        self.id
            .as_ref()
            .map(|id| id.key().to_string())
            .unwrap_or_default()
    }
}

/// 注册请求
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CustomerCreate {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,
    pub birth_date: NaiveDate,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    #[validate(length(min = 3, message = "username must be at least 3 characters"))]
    pub username: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    #[validate(email(message = "invalid email"))]
    pub email: Option<String>,
}

/// 账户更新请求（全部可选）
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
    #[validate(email(message = "invalid email"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: Option<String>,
}

/// API 响应中的顾客视图（不含密码）
#[derive(Debug, Clone, Serialize)]
pub struct CustomerResponse {
    pub id: Option<String>,
    pub name: String,
    pub address: String,
    pub birth_date: NaiveDate,
    pub phone: String,
    pub username: String,
    pub email: Option<String>,
    pub is_birthday_discount_active: bool,
    pub lifetime_spend: f64,
}

impl From<Customer> for CustomerResponse {
    fn from(c: Customer) -> Self {
        Self {
            id: c.id.as_ref().map(|id| id.to_string()),
            name: c.name,
            address: c.address,
            birth_date: c.birth_date,
            phone: c.phone,
            username: c.username,
            email: c.email,
            is_birthday_discount_active: c.is_birthday_discount_active,
            lifetime_spend: c.lifetime_spend,
        }
    }
}
