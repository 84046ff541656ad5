//! 数据模型
//!
//! 所有表记录类型。金额使用 f64 (Rupiah)，时间戳使用 unix 毫秒 (i64)，
//! 日历日期使用 `chrono::NaiveDate`。
//!
//! 跨记录引用存储为 "table:id" 字符串键（见 `record_key`），记录自身的
//! id 为 `Option<RecordId>`，通过 serde helper 序列化为字符串。

pub mod serde_helpers;

pub mod category;
pub mod customer;
pub mod discount;
pub mod notification;
pub mod order;
pub mod product;

pub use category::{Category, CategoryCreate, CategoryUpdate};
pub use customer::{Customer, CustomerCreate, CustomerResponse, CustomerUpdate};
pub use discount::{CustomerDiscount, DiscountStatus, discounted_price};
pub use notification::{Notification, NotificationKind};
pub use order::{Order, OrderLine, OrderStatus};
pub use product::{Product, ProductCreate, ProductUpdate};
