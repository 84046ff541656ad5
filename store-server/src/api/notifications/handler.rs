//! Notification API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use shared::ApiResponse;

use crate::auth::CurrentCustomer;
use crate::core::ServerState;
use crate::db::models::Notification;
use crate::db::repository::{NotificationRepository, record_key};
use crate::utils::{AppError, AppResult, ok};

/// GET /api/notifications - 自己的通知，新的在前
pub async fn list(
    State(state): State<ServerState>,
    current: CurrentCustomer,
) -> AppResult<Json<ApiResponse<Vec<Notification>>>> {
    let repo = NotificationRepository::new(state.db.clone());
    Ok(ok(repo.find_by_customer(&current.key()).await?))
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub unread: i64,
}

/// GET /api/notifications/unread-count - 未读数量
pub async fn unread_count(
    State(state): State<ServerState>,
    current: CurrentCustomer,
) -> AppResult<Json<ApiResponse<UnreadCount>>> {
    let repo = NotificationRepository::new(state.db.clone());
    let unread = repo.unread_count(&current.key()).await?;
    Ok(ok(UnreadCount { unread }))
}

/// PUT /api/notifications/{id}/read - 标记已读
pub async fn mark_read(
    State(state): State<ServerState>,
    current: CurrentCustomer,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Notification>>> {
    let repo = NotificationRepository::new(state.db.clone());
    let notification = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", id)))?;

    if notification.customer_id != record_key("customer", &current.key()) {
        return Err(AppError::Forbidden("Not your notification".to_string()));
    }

    Ok(ok(repo.mark_read(&notification.key()).await?))
}
