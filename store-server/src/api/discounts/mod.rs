//! Discount API 模块
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/discounts | GET | 自己当前生效的折扣 |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/discounts", routes())
}

fn routes() -> Router<ServerState> {
    Router::new().route("/", get(handler::list_active))
}
