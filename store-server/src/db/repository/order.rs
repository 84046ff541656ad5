//! Order Repository
//!
//! 订单与订单明细的持久化。`recompute_total` 是总额不变式的唯一写入点：
//! total = sum(line.subtotal) + shipping_fee。

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, pure_key, record_id, record_key};
use crate::db::models::{Order, OrderLine, OrderStatus};

const ORDER_TABLE: &str = "order";
const ORDER_LINE_TABLE: &str = "order_line";

#[derive(Debug, Deserialize)]
struct SubtotalRow {
    #[serde(default)]
    total: f64,
}

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn create(&self, order: Order) -> RepoResult<Order> {
        let created: Option<Order> = self
            .base
            .db()
            .create(ORDER_TABLE)
            .content(order)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create order".to_string()))
    }

    pub async fn add_line(&self, line: OrderLine) -> RepoResult<OrderLine> {
        let created: Option<OrderLine> = self
            .base
            .db()
            .create(ORDER_LINE_TABLE)
            .content(line)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create order line".to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let order: Option<Order> = self
            .base
            .db()
            .select((ORDER_TABLE, pure_key(ORDER_TABLE, id)))
            .await?;
        Ok(order)
    }

    pub async fn find_lines(&self, order_id: &str) -> RepoResult<Vec<OrderLine>> {
        let order_key = record_key(ORDER_TABLE, order_id);
        let lines: Vec<OrderLine> = self
            .base
            .db()
            .query("SELECT * FROM order_line WHERE order_id = $order")
            .bind(("order", order_key))
            .await?
            .take(0)?;
        Ok(lines)
    }

    /// All orders, newest first (admin view).
    pub async fn find_all(&self) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM `order` ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(orders)
    }

    pub async fn find_by_customer(&self, customer_id: &str) -> RepoResult<Vec<Order>> {
        let customer_key = record_key("customer", customer_id);
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM `order` WHERE customer_id = $customer ORDER BY created_at DESC")
            .bind(("customer", customer_key))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Re-derive `total` from the stored lines plus the order's shipping fee.
    pub async fn recompute_total(&self, order_id: &str) -> RepoResult<Order> {
        let order_key = record_key(ORDER_TABLE, order_id);
        let rows: Vec<SubtotalRow> = self
            .base
            .db()
            .query("SELECT math::sum(subtotal) AS total FROM order_line WHERE order_id = $order GROUP ALL")
            .bind(("order", order_key))
            .await?
            .take(0)?;
        let line_sum = rows.into_iter().next().map(|r| r.total).unwrap_or(0.0);

        let updated: Vec<Order> = self
            .base
            .db()
            .query("UPDATE $thing SET total = $line_sum + shipping_fee RETURN AFTER")
            .bind(("thing", record_id(ORDER_TABLE, order_id)))
            .bind(("line_sum", line_sum))
            .await?
            .take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", order_id)))
    }

    /// Persist a status change together with the recomputed reminder flag.
    pub async fn set_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        reminder_sent: bool,
    ) -> RepoResult<Order> {
        let updated: Vec<Order> = self
            .base
            .db()
            .query("UPDATE $thing SET status = $status, is_payment_reminder_sent = $flag RETURN AFTER")
            .bind(("thing", record_id(ORDER_TABLE, order_id)))
            .bind(("status", status))
            .bind(("flag", reminder_sent))
            .await?
            .take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", order_id)))
    }

    pub async fn set_payment_proof(&self, order_id: &str, path: String) -> RepoResult<Order> {
        let updated: Vec<Order> = self
            .base
            .db()
            .query("UPDATE $thing SET payment_proof = $path RETURN AFTER")
            .bind(("thing", record_id(ORDER_TABLE, order_id)))
            .bind(("path", path))
            .await?
            .take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", order_id)))
    }

    /// Set the shipping fee and recompute the total in one go.
    pub async fn set_shipping_fee(&self, order_id: &str, fee: f64) -> RepoResult<Order> {
        self.base
            .db()
            .query("UPDATE $thing SET shipping_fee = $fee")
            .bind(("thing", record_id(ORDER_TABLE, order_id)))
            .bind(("fee", fee))
            .await?;
        self.recompute_total(order_id).await
    }

    pub async fn set_feedback(
        &self,
        order_id: &str,
        feedback: String,
        photo: Option<String>,
    ) -> RepoResult<Order> {
        let updated: Vec<Order> = self
            .base
            .db()
            .query("UPDATE $thing SET feedback = $feedback, feedback_photo = $photo RETURN AFTER")
            .bind(("thing", record_id(ORDER_TABLE, order_id)))
            .bind(("feedback", feedback))
            .bind(("photo", photo))
            .await?
            .take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", order_id)))
    }

    /// Unpaid orders whose payment deadline has passed.
    pub async fn find_expired_unpaid(&self, now: i64) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM `order` WHERE status IN $statuses AND payment_deadline_at != NONE AND payment_deadline_at <= $now")
            .bind(("statuses", unpaid_statuses()))
            .bind(("now", now))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Unpaid orders due inside the `[from, to]` window that have not been
    /// reminded yet.
    pub async fn find_due_for_reminder(&self, from: i64, to: i64) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM `order` WHERE status IN $statuses AND is_payment_reminder_sent = false AND payment_deadline_at != NONE AND payment_deadline_at >= $from AND payment_deadline_at <= $to")
            .bind(("statuses", unpaid_statuses()))
            .bind(("from", from))
            .bind(("to", to))
            .await?
            .take(0)?;
        Ok(orders)
    }

    pub async fn set_reminder_sent(&self, order_id: &str) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE $thing SET is_payment_reminder_sent = true")
            .bind(("thing", record_id(ORDER_TABLE, order_id)))
            .await?;
        Ok(())
    }
}

fn unpaid_statuses() -> Vec<OrderStatus> {
    vec![OrderStatus::Processing, OrderStatus::AwaitingVerification]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use shared::util::now_millis;

    async fn repo() -> OrderRepository {
        let service = DbService::open_in_memory().await.unwrap();
        OrderRepository::new(service.db)
    }

    fn new_order(customer: &str, deadline: Option<i64>) -> Order {
        let now = now_millis();
        Order {
            id: None,
            customer_id: customer.into(),
            created_at: now,
            total: 0.0,
            shipping_fee: 0.0,
            status: OrderStatus::Processing,
            payment_proof: None,
            shipping_address: Some("Jl. Melati 2".into()),
            feedback: None,
            feedback_photo: None,
            checkout_at: now,
            payment_deadline_at: deadline,
            is_payment_reminder_sent: false,
        }
    }

    fn line(order_key: &str, qty: i64, unit_price: f64) -> OrderLine {
        OrderLine {
            id: None,
            order_id: record_key("order", order_key),
            product_id: "product:semen".into(),
            product_name: "Semen 50kg".into(),
            quantity: qty,
            unit_price,
            subtotal: qty as f64 * unit_price,
        }
    }

    #[tokio::test]
    async fn total_equals_line_sum_plus_shipping() {
        let repo = repo().await;
        let order = repo.create(new_order("customer:a", None)).await.unwrap();
        let key = order.key();

        repo.add_line(line(&key, 2, 85_000.0)).await.unwrap();
        repo.add_line(line(&key, 1, 30_000.0)).await.unwrap();

        let recomputed = repo.recompute_total(&key).await.unwrap();
        assert_eq!(recomputed.total, 200_000.0);

        // Shipping fee change must flow into the total
        let with_fee = repo.set_shipping_fee(&key, 50_000.0).await.unwrap();
        assert_eq!(with_fee.total, 250_000.0);
        assert_eq!(with_fee.shipping_fee, 50_000.0);
    }

    #[tokio::test]
    async fn recompute_with_no_lines_is_shipping_only() {
        let repo = repo().await;
        let order = repo.create(new_order("customer:a", None)).await.unwrap();
        let recomputed = repo.recompute_total(&order.key()).await.unwrap();
        assert_eq!(recomputed.total, 0.0);
    }

    #[tokio::test]
    async fn set_status_persists_reminder_flag() {
        let repo = repo().await;
        let order = repo.create(new_order("customer:a", None)).await.unwrap();
        let key = order.key();

        let paid = repo.set_status(&key, OrderStatus::Paid, true).await.unwrap();
        assert_eq!(paid.status, OrderStatus::Paid);
        assert!(paid.is_payment_reminder_sent);

        let shipped = repo.set_status(&key, OrderStatus::Shipped, false).await.unwrap();
        assert!(!shipped.is_payment_reminder_sent);
    }

    #[tokio::test]
    async fn expired_and_reminder_queries_filter_correctly() {
        let repo = repo().await;
        let now = now_millis();
        let hour = shared::util::HOUR_MILLIS;

        // Past deadline, unpaid -> expired
        let expired = repo.create(new_order("customer:a", Some(now - hour))).await.unwrap();
        // Due in 2h, unpaid -> reminder candidate
        let due_soon = repo.create(new_order("customer:a", Some(now + 2 * hour))).await.unwrap();
        // Due in 2 days -> outside the reminder window
        repo.create(new_order("customer:a", Some(now + 48 * hour))).await.unwrap();
        // Past deadline but already paid -> untouched
        let paid = repo.create(new_order("customer:a", Some(now - hour))).await.unwrap();
        repo.set_status(&paid.key(), OrderStatus::Paid, true).await.unwrap();

        let expired_found = repo.find_expired_unpaid(now).await.unwrap();
        assert_eq!(expired_found.len(), 1);
        assert_eq!(expired_found[0].key(), expired.key());

        let due = repo.find_due_for_reminder(now + hour, now + 24 * hour).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].key(), due_soon.key());

        // Once flagged, the order drops out of the reminder query
        repo.set_reminder_sent(&due_soon.key()).await.unwrap();
        let due_again = repo.find_due_for_reminder(now + hour, now + 24 * hour).await.unwrap();
        assert!(due_again.is_empty());
    }
}
