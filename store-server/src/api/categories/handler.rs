//! Category API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};

use shared::ApiResponse;

use crate::api::admin::require_admin;
use crate::core::ServerState;
use crate::db::models::{Category, CategoryCreate, CategoryUpdate, Product};
use crate::db::repository::{CategoryRepository, ProductRepository};
use crate::utils::{AppError, AppResult, ok};

/// GET /api/categories - 获取所有分类
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<ApiResponse<Vec<Category>>>> {
    let repo = CategoryRepository::new(state.db.clone());
    Ok(ok(repo.find_all().await?))
}

/// GET /api/categories/{id} - 获取单个分类
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Category>>> {
    let repo = CategoryRepository::new(state.db.clone());
    let category = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))?;
    Ok(ok(category))
}

/// GET /api/categories/{id}/products - 分类下的商品
pub async fn list_products(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<Product>>>> {
    let categories = CategoryRepository::new(state.db.clone());
    if categories.find_by_id(&id).await?.is_none() {
        return Err(AppError::NotFound(format!("Category {} not found", id)));
    }

    let products = ProductRepository::new(state.db.clone());
    Ok(ok(products.find_by_category(&id).await?))
}

/// POST /api/categories - 创建分类（管理员）
pub async fn create(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(payload): Json<CategoryCreate>,
) -> AppResult<Json<ApiResponse<Category>>> {
    require_admin(&state, &headers)?;
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Category name is required".to_string()));
    }

    let repo = CategoryRepository::new(state.db.clone());
    Ok(ok(repo.create(payload).await?))
}

/// PUT /api/categories/{id} - 更新分类（管理员）
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<CategoryUpdate>,
) -> AppResult<Json<ApiResponse<Category>>> {
    require_admin(&state, &headers)?;
    let repo = CategoryRepository::new(state.db.clone());
    Ok(ok(repo.update(&id, payload).await?))
}

/// DELETE /api/categories/{id} - 删除分类（管理员）
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> AppResult<Json<ApiResponse<bool>>> {
    require_admin(&state, &headers)?;
    let repo = CategoryRepository::new(state.db.clone());
    Ok(ok(repo.delete(&id).await?))
}
