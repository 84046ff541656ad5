//! CustomerDiscount Repository

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, record_key};
use crate::db::models::{CustomerDiscount, DiscountStatus};
use shared::util::now_millis;

const DISCOUNT_TABLE: &str = "customer_discount";

#[derive(Clone)]
pub struct DiscountRepository {
    base: BaseRepository,
}

impl DiscountRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn create(
        &self,
        customer_id: &str,
        percent: i32,
        message: Option<String>,
    ) -> RepoResult<CustomerDiscount> {
        let discount = CustomerDiscount {
            id: None,
            customer_id: record_key("customer", customer_id),
            product_id: None,
            percent,
            status: DiscountStatus::Active,
            message,
            created_at: now_millis(),
        };
        let created: Option<CustomerDiscount> = self
            .base
            .db()
            .create(DISCOUNT_TABLE)
            .content(discount)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create discount".to_string()))
    }

    pub async fn find_active_for_customer(
        &self,
        customer_id: &str,
    ) -> RepoResult<Vec<CustomerDiscount>> {
        let customer_key = record_key("customer", customer_id);
        let discounts: Vec<CustomerDiscount> = self
            .base
            .db()
            .query("SELECT * FROM customer_discount WHERE customer_id = $customer AND status = $status ORDER BY created_at DESC")
            .bind(("customer", customer_key))
            .bind(("status", DiscountStatus::Active))
            .await?
            .take(0)?;
        Ok(discounts)
    }

    /// Highest active discount percent for a customer, 0 when none.
    pub async fn best_active_percent(&self, customer_id: &str) -> RepoResult<i32> {
        let active = self.find_active_for_customer(customer_id).await?;
        Ok(active.iter().map(|d| d.percent).max().unwrap_or(0))
    }

    /// Deactivate every active discount for a customer (birthday expiry).
    pub async fn deactivate_for_customer(&self, customer_id: &str) -> RepoResult<()> {
        let customer_key = record_key("customer", customer_id);
        self.base
            .db()
            .query("UPDATE customer_discount SET status = $inactive WHERE customer_id = $customer AND status = $active")
            .bind(("customer", customer_key))
            .bind(("inactive", DiscountStatus::Inactive))
            .bind(("active", DiscountStatus::Active))
            .await?;
        Ok(())
    }
}
