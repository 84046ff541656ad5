//! Notification API 模块（站内通知）
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/notifications | GET | 自己的通知列表 |
//! | /api/notifications/unread-count | GET | 未读数量 |
//! | /api/notifications/{id}/read | PUT | 标记已读 |

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/notifications", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/unread-count", get(handler::unread_count))
        .route("/{id}/read", put(handler::mark_read))
}
