//! Order API 模块
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/orders/checkout | POST | 购物车结账 | 会话 |
//! | /api/orders | GET | 自己的订单列表 | 会话 |
//! | /api/orders/{id} | GET | 订单详情（含明细） | 会话 |
//! | /api/orders/{id}/payment-proof | POST | 上传付款凭证 | 会话 |
//! | /api/orders/{id}/feedback | POST | 提交反馈 | 会话 |
//! | /api/orders/admin/all | GET | 全部订单 | 管理员 |
//! | /api/orders/{id}/status | PUT | 变更状态 | 管理员 |
//! | /api/orders/{id}/shipping-fee | PUT | 设置运费 | 管理员 |

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    let customer_routes = Router::new()
        .route("/checkout", post(handler::checkout))
        .route("/", get(handler::list_own))
        .route("/{id}", get(handler::get_detail))
        .route("/{id}/payment-proof", post(handler::upload_payment_proof))
        .route("/{id}/feedback", post(handler::submit_feedback));

    let admin_routes = Router::new()
        // Static segment must come before /{id} sibling handlers
        .route("/admin/all", get(handler::list_all))
        .route("/{id}/status", put(handler::update_status))
        .route("/{id}/shipping-fee", put(handler::update_shipping_fee));

    customer_routes.merge(admin_routes)
}
