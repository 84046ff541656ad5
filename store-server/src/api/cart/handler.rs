//! Cart API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use shared::ApiResponse;

use crate::auth::CurrentCustomer;
use crate::core::ServerState;
use crate::db::models::discounted_price;
use crate::db::repository::{DiscountRepository, ProductRepository, record_key};
use crate::utils::{AppError, AppResult, ok, ok_with_message};

/// 购物车视图条目
#[derive(Debug, Serialize)]
pub struct CartItemView {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    /// 标价
    pub unit_price: f64,
    /// 折后单价（无折扣时等于标价）
    pub discounted_unit_price: f64,
    pub subtotal: f64,
    pub stock: i64,
}

#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    /// 生效的折扣百分比（0 表示无折扣）
    pub discount_percent: i32,
    pub total: f64,
}

/// 把内存购物车条目转换为带定价的视图。
/// 商品已下架的条目直接剔除。
pub(super) async fn priced_view(
    state: &ServerState,
    session_token: &str,
    customer_key: &str,
) -> AppResult<CartView> {
    let products = ProductRepository::new(state.db.clone());
    let discounts = DiscountRepository::new(state.db.clone());

    let percent = discounts.best_active_percent(customer_key).await?;

    let mut items = Vec::new();
    let mut total = 0.0;
    for entry in state.carts.entries(session_token) {
        let Some(product) = products.find_by_id(&entry.product_id).await? else {
            state.carts.remove(session_token, &entry.product_id);
            continue;
        };

        let unit = discounted_price(product.price, percent);
        let subtotal = unit * entry.quantity as f64;
        total += subtotal;
        items.push(CartItemView {
            product_id: entry.product_id,
            name: product.name,
            quantity: entry.quantity,
            unit_price: product.price,
            discounted_unit_price: unit,
            subtotal,
            stock: product.stock,
        });
    }

    Ok(CartView {
        items,
        discount_percent: percent,
        total,
    })
}

/// GET /api/cart - 查看购物车
pub async fn view(
    State(state): State<ServerState>,
    current: CurrentCustomer,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let view = priced_view(&state, &current.session_token, &current.key()).await?;
    Ok(ok(view))
}

/// POST /api/cart/items/{product_id} - 加入商品
pub async fn add_item(
    State(state): State<ServerState>,
    current: CurrentCustomer,
    Path(product_id): Path<String>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let products = ProductRepository::new(state.db.clone());
    let product = products
        .find_by_id(&product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))?;

    if product.stock <= 0 {
        return Err(AppError::BusinessRule(format!(
            "{} is out of stock",
            product.name
        )));
    }

    state
        .carts
        .add(&current.session_token, &record_key("product", &product.key()));

    let view = priced_view(&state, &current.session_token, &current.key()).await?;
    Ok(ok_with_message(view, "Item added"))
}

#[derive(Debug, Deserialize)]
pub struct QuantityUpdate {
    pub product_id: String,
    pub quantity: i64,
}

/// PUT /api/cart/items - 批量更新数量（下限 1）
pub async fn set_quantities(
    State(state): State<ServerState>,
    current: CurrentCustomer,
    Json(payload): Json<Vec<QuantityUpdate>>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let updates: Vec<(String, i64)> = payload
        .into_iter()
        .map(|u| (u.product_id, u.quantity))
        .collect();
    state.carts.set_quantities(&current.session_token, &updates);

    let view = priced_view(&state, &current.session_token, &current.key()).await?;
    Ok(ok(view))
}

/// DELETE /api/cart/items/{product_id} - 移除商品
pub async fn remove_item(
    State(state): State<ServerState>,
    current: CurrentCustomer,
    Path(product_id): Path<String>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    state
        .carts
        .remove(&current.session_token, &record_key("product", &product_id));
    let view = priced_view(&state, &current.session_token, &current.key()).await?;
    Ok(ok(view))
}
