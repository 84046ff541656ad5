//! Repository Module
//!
//! Provides CRUD operations for SurrealDB tables.

pub mod category;
pub mod customer;
pub mod discount;
pub mod notification;
pub mod order;
pub mod product;

// Re-exports
pub use category::CategoryRepository;
pub use customer::CustomerRepository;
pub use discount::DiscountRepository;
pub use notification::NotificationRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;

use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

// =============================================================================
// ID Convention: 全栈统一使用 "table:id" 格式
// =============================================================================
//
// 使用 surrealdb::RecordId 处理所有 ID：
//   - 解析: let id: RecordId = "product:abc".parse()?;
//   - 创建: let id = RecordId::from_table_key("product", "abc");
//   - 获取纯ID: id.key().to_string()
//
// 跨表引用以 "table:id" 字符串存储，便于等值过滤。

/// 纯 id：去掉可能存在的 "table:" 前缀
pub fn pure_key<'a>(table: &str, id: &'a str) -> &'a str {
    id.strip_prefix(&format!("{}:", table) as &str).unwrap_or(id)
}

/// 引用键："table:id" 字符串
pub fn record_key(table: &str, id: &str) -> String {
    format!("{}:{}", table, pure_key(table, id))
}

/// RecordId，用于 UPDATE $thing 等绑定
pub fn record_id(table: &str, id: &str) -> RecordId {
    RecordId::from_table_key(table, pure_key(table, id))
}

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_helpers_strip_and_add_prefix() {
        assert_eq!(pure_key("order", "order:abc"), "abc");
        assert_eq!(pure_key("order", "abc"), "abc");
        assert_eq!(record_key("order", "abc"), "order:abc");
        assert_eq!(record_key("order", "order:abc"), "order:abc");
    }
}
