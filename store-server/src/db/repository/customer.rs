//! Customer Repository

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, pure_key, record_id};
use crate::db::models::{Customer, CustomerUpdate};

const CUSTOMER_TABLE: &str = "customer";

#[derive(Debug, Deserialize)]
struct SpendRow {
    #[serde(default)]
    total: f64,
}

#[derive(Clone)]
pub struct CustomerRepository {
    base: BaseRepository,
}

impl CustomerRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Customer>> {
        let customer: Option<Customer> = self
            .base
            .db()
            .select((CUSTOMER_TABLE, pure_key(CUSTOMER_TABLE, id)))
            .await?;
        Ok(customer)
    }

    pub async fn find_by_username(&self, username: &str) -> RepoResult<Option<Customer>> {
        let customers: Vec<Customer> = self
            .base
            .db()
            .query("SELECT * FROM customer WHERE username = $username")
            .bind(("username", username.to_string()))
            .await?
            .take(0)?;
        Ok(customers.into_iter().next())
    }

    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<Customer>> {
        let customers: Vec<Customer> = self
            .base
            .db()
            .query("SELECT * FROM customer WHERE email = $email")
            .bind(("email", email.to_string()))
            .await?
            .take(0)?;
        Ok(customers.into_iter().next())
    }

    /// Persist a new customer. `customer.password` must already be hashed.
    pub async fn create(&self, customer: Customer) -> RepoResult<Customer> {
        let created: Option<Customer> = self
            .base
            .db()
            .create(CUSTOMER_TABLE)
            .content(customer)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create customer".to_string()))
    }

    /// Partial profile update. Password changes go through [`set_password`].
    pub async fn update(&self, id: &str, data: CustomerUpdate) -> RepoResult<Customer> {
        let thing = record_id(CUSTOMER_TABLE, id);

        let mut set_parts: Vec<&str> = Vec::new();
        if data.name.is_some() { set_parts.push("name = $name"); }
        if data.address.is_some() { set_parts.push("address = $address"); }
        if data.birth_date.is_some() { set_parts.push("birth_date = $birth_date"); }
        if data.phone.is_some() { set_parts.push("phone = $phone"); }
        if data.email.is_some() { set_parts.push("email = $email"); }

        if set_parts.is_empty() {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("Customer {} not found", id)));
        }

        let query_str = format!("UPDATE $thing SET {} RETURN AFTER", set_parts.join(", "));
        let mut query = self.base.db().query(&query_str).bind(("thing", thing));

        if let Some(v) = data.name { query = query.bind(("name", v)); }
        if let Some(v) = data.address { query = query.bind(("address", v)); }
        if let Some(v) = data.birth_date { query = query.bind(("birth_date", v)); }
        if let Some(v) = data.phone { query = query.bind(("phone", v)); }
        if let Some(v) = data.email { query = query.bind(("email", v)); }

        let updated: Vec<Customer> = query.await?.take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Customer {} not found", id)))
    }

    /// Replace the stored password hash (registration rehash, account update).
    pub async fn set_password(&self, id: &str, password_hash: String) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE $thing SET password = $password")
            .bind(("thing", record_id(CUSTOMER_TABLE, id)))
            .bind(("password", password_hash))
            .await?;
        Ok(())
    }

    /// Customers whose birth date falls on the given month/day.
    ///
    /// `birth_date` is stored as an ISO string, so a month-day suffix match
    /// works for every year.
    pub async fn find_birthdays(&self, month: u32, day: u32) -> RepoResult<Vec<Customer>> {
        let suffix = format!("-{:02}-{:02}", month, day);
        let customers: Vec<Customer> = self
            .base
            .db()
            .query("SELECT * FROM customer WHERE string::ends_with(<string> birth_date, $suffix) AND is_birthday_discount_active = false")
            .bind(("suffix", suffix))
            .await?
            .take(0)?;
        Ok(customers)
    }

    /// Activate the birthday discount flag and refresh the lifetime spend.
    pub async fn activate_birthday_discount(
        &self,
        id: &str,
        activated_at: i64,
        lifetime_spend: f64,
    ) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE $thing SET is_birthday_discount_active = true, birthday_discount_activated_at = $at, lifetime_spend = $spend")
            .bind(("thing", record_id(CUSTOMER_TABLE, id)))
            .bind(("at", activated_at))
            .bind(("spend", lifetime_spend))
            .await?;
        Ok(())
    }

    /// Customers whose active birthday discount was activated at or before `cutoff`.
    pub async fn find_expired_birthday_discounts(&self, cutoff: i64) -> RepoResult<Vec<Customer>> {
        let customers: Vec<Customer> = self
            .base
            .db()
            .query("SELECT * FROM customer WHERE is_birthday_discount_active = true AND birthday_discount_activated_at != NONE AND birthday_discount_activated_at <= $cutoff")
            .bind(("cutoff", cutoff))
            .await?
            .take(0)?;
        Ok(customers)
    }

    pub async fn clear_birthday_discount(&self, id: &str) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE $thing SET is_birthday_discount_active = false, birthday_discount_activated_at = NONE")
            .bind(("thing", record_id(CUSTOMER_TABLE, id)))
            .await?;
        Ok(())
    }

    /// All customers with a usable email address (restock broadcast).
    pub async fn find_with_email(&self) -> RepoResult<Vec<Customer>> {
        let customers: Vec<Customer> = self
            .base
            .db()
            .query("SELECT * FROM customer WHERE email != NONE AND email != ''")
            .await?
            .take(0)?;
        Ok(customers)
    }

    /// Sum of `total` over the customer's COMPLETED orders.
    pub async fn completed_spend(&self, id: &str) -> RepoResult<f64> {
        let customer_key = super::record_key(CUSTOMER_TABLE, id);
        let rows: Vec<SpendRow> = self
            .base
            .db()
            .query("SELECT math::sum(total) AS total FROM `order` WHERE customer_id = $customer AND status = $status GROUP ALL")
            .bind(("customer", customer_key))
            .bind(("status", "COMPLETED"))
            .await?
            .take(0)?;
        Ok(rows.into_iter().next().map(|r| r.total).unwrap_or(0.0))
    }
}
