//! 订单域
//!
//! - [`lifecycle`] - 状态变更与通知扇出
//! - [`sweeps`] - 付款超时取消与付款提醒扫描

pub mod lifecycle;
pub mod sweeps;

pub use lifecycle::OrderLifecycle;
pub use sweeps::DeadlineSweeper;
