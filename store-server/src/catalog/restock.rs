//! 到货广播
//!
//! 管理员更新库存时，库存从低水位以下（<5）跳到高水位以上（>10）视为
//! 一次补货，给所有留了邮箱的顾客群发到货通知，并在商品上盖时间戳。

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use shared::util::now_millis;

use crate::db::models::Product;
use crate::db::repository::{CustomerRepository, ProductRepository};
use crate::notify::Notifier;
use crate::utils::format_rupiah;

/// 低水位：低于视为缺货
pub const RESTOCK_LOW_WATER: i64 = 5;
/// 高水位：补到以上才广播
pub const RESTOCK_HIGH_WATER: i64 = 10;

/// 是否构成一次到货广播
pub fn crosses_restock_watermark(previous_stock: i64, new_stock: i64) -> bool {
    previous_stock < RESTOCK_LOW_WATER && new_stock > RESTOCK_HIGH_WATER
}

/// 库存更新后调用：满足水位条件则广播
pub async fn maybe_broadcast_restock(
    db: &Surreal<Db>,
    notifier: &Notifier,
    previous_stock: i64,
    product: &Product,
) {
    if !crosses_restock_watermark(previous_stock, product.stock) {
        return;
    }
    broadcast_restock(db, notifier, product).await;
}

async fn broadcast_restock(db: &Surreal<Db>, notifier: &Notifier, product: &Product) {
    let customers = CustomerRepository::new(db.clone());
    let recipients: Vec<String> = match customers.find_with_email().await {
        Ok(list) => list.into_iter().filter_map(|c| c.email).collect(),
        Err(e) => {
            tracing::error!(error = %e, "Restock broadcast recipient query failed");
            return;
        }
    };

    if recipients.is_empty() {
        tracing::info!(product = %product.name, "Restock broadcast skipped, no recipients");
        return;
    }

    tracing::info!(
        product = %product.name,
        recipients = recipients.len(),
        "Broadcasting restock"
    );

    notifier
        .email(
            recipients,
            format!("🛍️ Stok Kembali Tersedia: {}", product.name),
            format!(
                "Kabar baik! {} sudah tersedia kembali dengan harga {}. \
                 Stok terbatas, segera pesan sebelum kehabisan lagi!",
                product.name,
                format_rupiah(product.price)
            ),
            None,
        )
        .await;

    let products = ProductRepository::new(db.clone());
    if let Err(e) = products
        .set_restock_broadcast_at(&product.key(), now_millis())
        .await
    {
        tracing::error!(error = %e, product = %product.key(), "Failed to stamp restock broadcast");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watermark_crossing() {
        assert!(crosses_restock_watermark(0, 11));
        assert!(crosses_restock_watermark(4, 50));
        // Not low enough before
        assert!(!crosses_restock_watermark(5, 50));
        // Not high enough after
        assert!(!crosses_restock_watermark(2, 10));
        assert!(!crosses_restock_watermark(2, 3));
    }
}
