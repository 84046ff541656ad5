//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 注册 / 登录 / 账户
//! - [`categories`] - 分类（公开读，管理员写）
//! - [`products`] - 商品（公开读，管理员写）
//! - [`cart`] - 会话购物车
//! - [`orders`] - 结账与订单
//! - [`notifications`] - 站内通知
//! - [`discounts`] - 顾客折扣
//!
//! 管理员路由用 `X-Admin-Token` 共享令牌保护（见 [`admin`]），
//! 顾客路由用会话 cookie（见 [`crate::auth::CurrentCustomer`]）。

pub mod admin;

pub mod auth;
pub mod health;

// Data models API
pub mod cart;
pub mod categories;
pub mod discounts;
pub mod notifications;
pub mod orders;
pub mod products;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

/// Build the Axum router (without state)
pub fn build_router() -> Router<ServerState> {
    Router::<ServerState>::new()
        // Core APIs
        .merge(health::router())
        .merge(auth::router())
        // Data model APIs
        .merge(categories::router())
        .merge(products::router())
        .merge(cart::router())
        .merge(orders::router())
        .merge(notifications::router())
        .merge(discounts::router())
        // Tower HTTP 中间件
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
