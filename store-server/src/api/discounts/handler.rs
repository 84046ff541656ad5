//! Discount API Handlers

use axum::{Json, extract::State};

use shared::ApiResponse;

use crate::auth::CurrentCustomer;
use crate::core::ServerState;
use crate::db::models::CustomerDiscount;
use crate::db::repository::DiscountRepository;
use crate::utils::{AppResult, ok};

/// GET /api/discounts - 自己当前生效的折扣
pub async fn list_active(
    State(state): State<ServerState>,
    current: CurrentCustomer,
) -> AppResult<Json<ApiResponse<Vec<CustomerDiscount>>>> {
    let repo = DiscountRepository::new(state.db.clone());
    Ok(ok(repo.find_active_for_customer(&current.key()).await?))
}
