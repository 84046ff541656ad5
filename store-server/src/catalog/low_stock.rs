//! 每日低库存报告
//!
//! 周期任务：库存低于阈值（默认 5）的商品汇总成一封管理员邮件。

use std::time::Duration;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tokio_util::sync::CancellationToken;

use crate::db::repository::ProductRepository;
use crate::notify::Notifier;

pub struct LowStockReporter {
    db: Surreal<Db>,
    notifier: Notifier,
    threshold: i64,
    interval: Duration,
    shutdown: CancellationToken,
}

impl LowStockReporter {
    pub fn new(
        db: Surreal<Db>,
        notifier: Notifier,
        threshold: i64,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            db,
            notifier,
            threshold,
            interval,
            shutdown,
        }
    }

    pub async fn run(self) {
        tracing::info!("Low stock reporter started (interval {:?})", self.interval);
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.shutdown.cancelled() => break,
            }
            self.report_once().await;
        }
        tracing::info!("Low stock reporter stopped");
    }

    /// 一次报告：没有低库存商品就什么都不发
    pub async fn report_once(&self) {
        let products = ProductRepository::new(self.db.clone());
        let low = match products.find_low_stock(self.threshold).await {
            Ok(list) => list,
            Err(e) => {
                tracing::error!(error = %e, "Low stock query failed");
                return;
            }
        };

        if low.is_empty() {
            tracing::debug!("No products below stock threshold");
            return;
        }

        let lines: Vec<String> = low
            .iter()
            .map(|p| format!("- {} (sisa {})", p.name, p.stock))
            .collect();
        let body = format!(
            "Produk berikut stoknya di bawah {}:\n{}\n\nMohon segera lakukan pengadaan.",
            self.threshold,
            lines.join("\n")
        );

        tracing::info!(count = low.len(), "Sending low stock report");
        self.notifier
            .email_admins("📉 Laporan Stok Menipis", body, None)
            .await;
    }
}
