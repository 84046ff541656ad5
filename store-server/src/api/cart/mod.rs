//! Cart API 模块
//!
//! 购物车以会话 token 为作用域，全部路由需要登录。
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/cart | GET | 查看购物车（含折后价） |
//! | /api/cart/items/{product_id} | POST | 加入商品（数量 +1） |
//! | /api/cart/items | PUT | 批量更新数量 |
//! | /api/cart/items/{product_id} | DELETE | 移除商品 |

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cart", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::view))
        .route("/items", put(handler::set_quantities))
        .route(
            "/items/{product_id}",
            post(handler::add_item).delete(handler::remove_item),
        )
}
