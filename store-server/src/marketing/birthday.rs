//! 生日问候与忠诚度折扣
//!
//! 每日扫描（`TaskKind::Periodic`），两个阶段：
//!
//! 1. **过期清理**：激活超过 24 小时的生日折扣清除标志，相关折扣记录
//!    置为 INACTIVE
//! 2. **生日问候**：生日在今天且折扣未激活的顾客，重算累计完成消费；
//!    达到门槛（默认 Rp 5.000.000）给 10% 忠诚度折扣记录，否则只发
//!    标准生日祝福。两种情况都置位折扣标志 + 激活时间并发问候
//!
//! 查询本身排除已激活的顾客，因此同一天重复执行是幂等的。

use chrono::{Datelike, Utc};
use std::time::Duration;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tokio_util::sync::CancellationToken;

use shared::util::{DAY_MILLIS, now_millis};

use crate::db::models::NotificationKind;
use crate::db::repository::{CustomerRepository, DiscountRepository};
use crate::notify::Notifier;
use crate::utils::format_rupiah;

pub struct BirthdayScheduler {
    db: Surreal<Db>,
    notifier: Notifier,
    loyalty_spend_threshold: f64,
    loyalty_discount_percent: i32,
    interval: Duration,
    shutdown: CancellationToken,
}

impl BirthdayScheduler {
    pub fn new(
        db: Surreal<Db>,
        notifier: Notifier,
        loyalty_spend_threshold: f64,
        loyalty_discount_percent: i32,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            db,
            notifier,
            loyalty_spend_threshold,
            loyalty_discount_percent,
            interval,
            shutdown,
        }
    }

    pub async fn run(self) {
        tracing::info!("Birthday scheduler started (interval {:?})", self.interval);
        loop {
            // Expiry first so a discount from yesterday is cleared before
            // today's pass looks at the flag
            self.expire_once().await;
            self.greet_once().await;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.shutdown.cancelled() => break,
            }
        }
        tracing::info!("Birthday scheduler stopped");
    }

    /// 清理激活超过 24 小时的生日折扣，返回清理数量
    pub async fn expire_once(&self) -> usize {
        let customers = CustomerRepository::new(self.db.clone());
        let discounts = DiscountRepository::new(self.db.clone());

        let cutoff = now_millis() - DAY_MILLIS;
        let expired = match customers.find_expired_birthday_discounts(cutoff).await {
            Ok(list) => list,
            Err(e) => {
                tracing::error!(error = %e, "Birthday expiry query failed");
                return 0;
            }
        };

        let mut cleared = 0;
        for customer in expired {
            let key = customer.key();
            if let Err(e) = customers.clear_birthday_discount(&key).await {
                tracing::error!(error = %e, customer = %key, "Failed to clear birthday discount");
                continue;
            }
            if let Err(e) = discounts.deactivate_for_customer(&key).await {
                tracing::error!(error = %e, customer = %key, "Failed to deactivate discount records");
            }
            cleared += 1;
        }

        if cleared > 0 {
            tracing::info!(count = cleared, "Expired birthday discounts cleared");
        }
        cleared
    }

    /// 今天生日的顾客：问候 + 按消费决定忠诚度折扣
    pub async fn greet_once(&self) {
        let today = Utc::now().date_naive();
        self.greet_for_date(today.month(), today.day()).await;
    }

    /// 按给定月/日执行问候（测试入口）
    pub async fn greet_for_date(&self, month: u32, day: u32) {
        let customers = CustomerRepository::new(self.db.clone());
        let discounts = DiscountRepository::new(self.db.clone());

        let birthday_customers = match customers.find_birthdays(month, day).await {
            Ok(list) => list,
            Err(e) => {
                tracing::error!(error = %e, "Birthday query failed");
                return;
            }
        };

        for customer in birthday_customers {
            let key = customer.key();
            let spend = match customers.completed_spend(&key).await {
                Ok(spend) => spend,
                Err(e) => {
                    tracing::error!(error = %e, customer = %key, "Failed to compute lifetime spend");
                    continue;
                }
            };

            if let Err(e) = customers
                .activate_birthday_discount(&key, now_millis(), spend)
                .await
            {
                tracing::error!(error = %e, customer = %key, "Failed to activate birthday discount");
                continue;
            }

            let loyal = spend >= self.loyalty_spend_threshold;
            let body = if loyal {
                let message = format!(
                    "Diskon ulang tahun {}% untuk pelanggan setia (total belanja {})",
                    self.loyalty_discount_percent,
                    format_rupiah(spend)
                );
                if let Err(e) = discounts
                    .create(&key, self.loyalty_discount_percent, Some(message))
                    .await
                {
                    tracing::error!(error = %e, customer = %key, "Failed to create loyalty discount");
                }
                format!(
                    "Selamat ulang tahun, {}! Sebagai pelanggan setia, Anda mendapat \
                     diskon {}% untuk semua produk selama 24 jam. Selamat berbelanja!",
                    customer.name, self.loyalty_discount_percent
                )
            } else {
                format!(
                    "Selamat ulang tahun, {}! Semoga hari Anda menyenangkan. \
                     Jangan lupa cek penawaran spesial hari ini di toko kami!",
                    customer.name
                )
            };

            tracing::info!(customer = %key, loyal, "Birthday greeting");
            self.notifier
                .email_customer(&customer, "🎂 Selamat Ulang Tahun!", body.clone(), None)
                .await;
            self.notifier
                .in_app(&key, NotificationKind::BirthdayGreeting, body)
                .await;
        }
    }
}
