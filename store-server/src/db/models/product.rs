//! Product 模型

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// 商品记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// 图片相对路径 (uploads/ 下)
    #[serde(default)]
    pub image: String,
    pub stock: i64,
    pub price: f64,
    /// 分类键 "category:xxx"，可为空
    #[serde(default)]
    pub category_id: Option<String>,
    /// 最近一次到货广播时间 (unix millis)
    #[serde(default)]
    pub last_restock_broadcast_at: Option<i64>,
}

impl Product {
    pub fn key(&self) -> String {
        self.id
            .as_ref()
            .map(|id| id.key().to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    pub stock: i64,
    pub price: f64,
    #[serde(default)]
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub stock: Option<i64>,
    pub price: Option<f64>,
    pub category_id: Option<String>,
}
