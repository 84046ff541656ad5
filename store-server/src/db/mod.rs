//! 数据库层
//!
//! 嵌入式 SurrealDB 存储：模型 + 仓储。

pub mod models;
pub mod repository;

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, RocksDb};

use crate::utils::AppError;

const NAMESPACE: &str = "barokah";
const DATABASE: &str = "store";

/// 数据库服务
///
/// 持有嵌入式 SurrealDB 句柄，负责初始化（namespace/database 选择 + 索引）。
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open the on-disk database at `db_path`.
    pub async fn open(db_path: &str) -> Result<Self, AppError> {
        let db = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;
        Self::prepare(db).await
    }

    /// Open an in-memory database (tests, local experiments).
    pub async fn open_in_memory() -> Result<Self, AppError> {
        let db = Surreal::new::<Mem>(())
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;
        Self::prepare(db).await
    }

    async fn prepare(db: Surreal<Db>) -> Result<Self, AppError> {
        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::Database(format!("Failed to select namespace: {}", e)))?;

        Self::apply_schema(&db).await?;

        tracing::info!("Database ready (ns={}, db={})", NAMESPACE, DATABASE);
        Ok(Self { db })
    }

    /// Indexes for the hot lookup paths. Uniqueness of usernames is enforced
    /// here; email uniqueness is checked in the auth handlers (via
    /// `find_by_email`) because email is optional.
    async fn apply_schema(db: &Surreal<Db>) -> Result<(), AppError> {
        let statements = [
            "DEFINE INDEX IF NOT EXISTS customer_username ON TABLE customer FIELDS username UNIQUE",
            "DEFINE INDEX IF NOT EXISTS order_customer ON TABLE `order` FIELDS customer_id",
            "DEFINE INDEX IF NOT EXISTS order_status ON TABLE `order` FIELDS status",
            "DEFINE INDEX IF NOT EXISTS order_line_order ON TABLE order_line FIELDS order_id",
            "DEFINE INDEX IF NOT EXISTS notification_customer ON TABLE notification FIELDS customer_id",
        ];

        for stmt in statements {
            db.query(stmt)
                .await
                .map_err(|e| AppError::Database(format!("Failed to apply schema: {}", e)))?;
        }
        Ok(())
    }
}
