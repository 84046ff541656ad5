//! 库存通知
//!
//! - [`restock`] - 到货广播（库存 <5 → >10 触发）
//! - [`low_stock`] - 每日低库存报告

pub mod low_stock;
pub mod restock;

pub use low_stock::LowStockReporter;
