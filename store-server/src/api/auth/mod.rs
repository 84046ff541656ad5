//! 认证 API 模块
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/auth/register | POST | 注册并登录 | 无 |
//! | /api/auth/login | POST | 登录 | 无 |
//! | /api/auth/logout | POST | 登出 | 会话 |
//! | /api/auth/me | GET | 当前账户 | 会话 |
//! | /api/auth/me | PUT | 更新账户 | 会话 |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/auth", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/register", post(handler::register))
        .route("/login", post(handler::login))
        .route("/logout", post(handler::logout))
        .route("/me", get(handler::me).put(handler::update_me))
}
