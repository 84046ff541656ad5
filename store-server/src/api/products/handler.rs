//! Product API Handlers

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::HeaderMap,
};
use serde::Deserialize;

use shared::ApiResponse;

use crate::api::admin::require_admin;
use crate::catalog::restock;
use crate::core::ServerState;
use crate::db::models::{Product, ProductCreate, ProductUpdate};
use crate::db::repository::ProductRepository;
use crate::utils::{AppError, AppResult, ok};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// 按分类过滤，"category:xxx" 或纯 id
    pub category_id: Option<String>,
}

/// GET /api/products - 商品列表，可按分类过滤
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<Vec<Product>>>> {
    let repo = ProductRepository::new(state.db.clone());
    let products = match query.category_id {
        Some(category_id) => repo.find_by_category(&category_id).await?,
        None => repo.find_all().await?,
    };
    Ok(ok(products))
}

/// GET /api/products/{id} - 获取单个商品
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let repo = ProductRepository::new(state.db.clone());
    let product = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))?;
    Ok(ok(product))
}

/// POST /api/products - 创建商品（管理员）
pub async fn create(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(payload): Json<ProductCreate>,
) -> AppResult<Json<ApiResponse<Product>>> {
    require_admin(&state, &headers)?;
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Product name is required".to_string()));
    }
    if payload.price < 0.0 {
        return Err(AppError::Validation("Price cannot be negative".to_string()));
    }

    let repo = ProductRepository::new(state.db.clone());
    Ok(ok(repo.create(payload).await?))
}

/// PUT /api/products/{id} - 更新商品（管理员）
///
/// 库存从缺货（<5）补到充足（>10）会给留了邮箱的顾客群发到货通知。
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<Json<ApiResponse<Product>>> {
    require_admin(&state, &headers)?;
    if let Some(price) = payload.price {
        if price < 0.0 {
            return Err(AppError::Validation("Price cannot be negative".to_string()));
        }
    }

    let repo = ProductRepository::new(state.db.clone());
    let previous = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))?;

    let updated = repo.update(&id, payload).await?;

    restock::maybe_broadcast_restock(&state.db, &state.notifier, previous.stock, &updated).await;

    Ok(ok(updated))
}

/// DELETE /api/products/{id} - 删除商品（管理员）
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> AppResult<Json<ApiResponse<bool>>> {
    require_admin(&state, &headers)?;
    let repo = ProductRepository::new(state.db.clone());
    Ok(ok(repo.delete(&id).await?))
}

/// POST /api/products/{id}/image - 上传商品图片（管理员，multipart）
pub async fn upload_image(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<Product>>> {
    require_admin(&state, &headers)?;

    let repo = ProductRepository::new(state.db.clone());
    if repo.find_by_id(&id).await?.is_none() {
        return Err(AppError::NotFound(format!("Product {} not found", id)));
    }

    let mut saved_path: Option<String> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(ToString::to_string)
            .ok_or_else(|| AppError::Validation("Missing file name".to_string()))?;
        let data = field.bytes().await?;
        saved_path = Some(state.storage.save_product_image(&file_name, &data).await?);
    }

    let image = saved_path
        .ok_or_else(|| AppError::Validation("Missing 'image' field".to_string()))?;
    let updated = repo
        .update(
            &id,
            ProductUpdate {
                name: None,
                description: None,
                image: Some(image),
                stock: None,
                price: None,
                category_id: None,
            },
        )
        .await?;
    Ok(ok(updated))
}
