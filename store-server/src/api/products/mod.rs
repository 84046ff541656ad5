//! Product API 模块
//!
//! 读路由公开，写路由需要管理员令牌。管理员补货（库存从低水位
//! 升过高水位）会触发到货广播。

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/products", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id));

    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .route("/{id}/image", post(handler::upload_image));

    read_routes.merge(manage_routes)
}
