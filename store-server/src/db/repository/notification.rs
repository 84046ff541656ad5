//! Notification Repository（站内通知）

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, pure_key, record_id, record_key};
use crate::db::models::{Notification, NotificationKind};
use shared::util::now_millis;

const NOTIFICATION_TABLE: &str = "notification";

#[derive(Debug, Deserialize)]
struct CountRow {
    #[serde(default)]
    total: i64,
}

#[derive(Clone)]
pub struct NotificationRepository {
    base: BaseRepository,
}

impl NotificationRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn create(
        &self,
        customer_id: &str,
        kind: NotificationKind,
        body: String,
    ) -> RepoResult<Notification> {
        let notification = Notification {
            id: None,
            customer_id: record_key("customer", customer_id),
            kind,
            body,
            is_read: false,
            created_at: now_millis(),
        };
        let created: Option<Notification> = self
            .base
            .db()
            .create(NOTIFICATION_TABLE)
            .content(notification)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create notification".to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Notification>> {
        let notification: Option<Notification> = self
            .base
            .db()
            .select((NOTIFICATION_TABLE, pure_key(NOTIFICATION_TABLE, id)))
            .await?;
        Ok(notification)
    }

    pub async fn find_by_customer(&self, customer_id: &str) -> RepoResult<Vec<Notification>> {
        let customer_key = record_key("customer", customer_id);
        let notifications: Vec<Notification> = self
            .base
            .db()
            .query("SELECT * FROM notification WHERE customer_id = $customer ORDER BY created_at DESC")
            .bind(("customer", customer_key))
            .await?
            .take(0)?;
        Ok(notifications)
    }

    pub async fn unread_count(&self, customer_id: &str) -> RepoResult<i64> {
        let customer_key = record_key("customer", customer_id);
        let rows: Vec<CountRow> = self
            .base
            .db()
            .query("SELECT count() AS total FROM notification WHERE customer_id = $customer AND is_read = false GROUP ALL")
            .bind(("customer", customer_key))
            .await?
            .take(0)?;
        Ok(rows.into_iter().next().map(|r| r.total).unwrap_or(0))
    }

    pub async fn mark_read(&self, id: &str) -> RepoResult<Notification> {
        let updated: Vec<Notification> = self
            .base
            .db()
            .query("UPDATE $thing SET is_read = true RETURN AFTER")
            .bind(("thing", record_id(NOTIFICATION_TABLE, id)))
            .await?
            .take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Notification {} not found", id)))
    }
}
