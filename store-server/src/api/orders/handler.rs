//! Order API Handlers
//!
//! 结账把购物车变成订单：下单即扣库存，付款期限 24 小时（可配置），
//! 超时由后台扫描自动取消。

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};

use shared::ApiResponse;
use shared::util::{HOUR_MILLIS, now_millis};

use crate::api::admin::require_admin;
use crate::auth::CurrentCustomer;
use crate::core::ServerState;
use crate::db::models::{Order, OrderLine, OrderStatus, discounted_price};
use crate::db::repository::{DiscountRepository, OrderRepository, ProductRepository, record_key};
use crate::utils::{AppError, AppResult, ok, ok_with_message};

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: String,
}

/// 订单详情视图
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLine>,
    /// 已完成且尚未反馈时可以提交反馈
    pub can_feedback: bool,
}

async fn load_detail(repo: &OrderRepository, order: Order) -> AppResult<OrderDetail> {
    let lines = repo.find_lines(&order.key()).await?;
    let can_feedback = order.status == OrderStatus::Completed && order.feedback_is_empty();
    Ok(OrderDetail {
        order,
        lines,
        can_feedback,
    })
}

fn assert_owner(order: &Order, current: &CurrentCustomer) -> Result<(), AppError> {
    if order.customer_id == record_key("customer", &current.key()) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Not your order".to_string()))
    }
}

/// POST /api/orders/checkout - 购物车结账
///
/// 明细单价按生效折扣计算并冗余存储；库存立即扣减。
pub async fn checkout(
    State(state): State<ServerState>,
    current: CurrentCustomer,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    if payload.shipping_address.trim().is_empty() {
        return Err(AppError::Validation(
            "Shipping address is required".to_string(),
        ));
    }

    let entries = state.carts.entries(&current.session_token);
    if entries.is_empty() {
        return Err(AppError::BusinessRule("Cart is empty".to_string()));
    }

    let products = ProductRepository::new(state.db.clone());
    let discounts = DiscountRepository::new(state.db.clone());
    let orders = OrderRepository::new(state.db.clone());

    let percent = discounts.best_active_percent(&current.key()).await?;

    // 先校验再落库，避免写到一半发现缺货
    let mut picked = Vec::new();
    for entry in &entries {
        let Some(product) = products.find_by_id(&entry.product_id).await? else {
            tracing::warn!(product = %entry.product_id, "Cart references missing product, skipping");
            continue;
        };
        if product.stock < entry.quantity {
            return Err(AppError::BusinessRule(format!(
                "Insufficient stock for {}: {} left",
                product.name, product.stock
            )));
        }
        picked.push((product, entry.quantity));
    }
    if picked.is_empty() {
        return Err(AppError::BusinessRule("Cart is empty".to_string()));
    }

    let now = now_millis();
    let order = orders
        .create(Order {
            id: None,
            customer_id: record_key("customer", &current.key()),
            created_at: now,
            total: 0.0,
            shipping_fee: 0.0,
            status: OrderStatus::Processing,
            payment_proof: None,
            shipping_address: Some(payload.shipping_address),
            feedback: None,
            feedback_photo: None,
            checkout_at: now,
            payment_deadline_at: Some(now + state.config.payment_deadline_hours * HOUR_MILLIS),
            is_payment_reminder_sent: false,
        })
        .await?;
    let order_key = order.key();

    for (product, quantity) in picked {
        let unit_price = discounted_price(product.price, percent);
        orders
            .add_line(OrderLine {
                id: None,
                order_id: record_key("order", &order_key),
                product_id: record_key("product", &product.key()),
                product_name: product.name.clone(),
                quantity,
                unit_price,
                subtotal: unit_price * quantity as f64,
            })
            .await?;
        products.adjust_stock(&product.key(), -quantity).await?;
    }

    let order = orders.recompute_total(&order_key).await?;

    tracing::info!(
        order = %order_key,
        customer = %current.customer.username,
        total = order.total,
        "Checkout completed"
    );

    state.lifecycle.handle_created(&order).await;
    state.carts.clear(&current.session_token);

    let detail = load_detail(&orders, order).await?;
    Ok(ok_with_message(detail, "Order created"))
}

/// GET /api/orders - 自己的订单列表
pub async fn list_own(
    State(state): State<ServerState>,
    current: CurrentCustomer,
) -> AppResult<Json<ApiResponse<Vec<Order>>>> {
    let repo = OrderRepository::new(state.db.clone());
    Ok(ok(repo.find_by_customer(&current.key()).await?))
}

/// GET /api/orders/{id} - 订单详情
pub async fn get_detail(
    State(state): State<ServerState>,
    current: CurrentCustomer,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let repo = OrderRepository::new(state.db.clone());
    let order = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", id)))?;
    assert_owner(&order, &current)?;

    let detail = load_detail(&repo, order).await?;
    Ok(ok(detail))
}

/// POST /api/orders/{id}/payment-proof - 上传付款凭证（multipart, 字段 "proof"）
///
/// 订单转入 AWAITING_VERIFICATION，重复上传会覆盖旧凭证。
pub async fn upload_payment_proof(
    State(state): State<ServerState>,
    current: CurrentCustomer,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<Order>>> {
    let repo = OrderRepository::new(state.db.clone());
    let order = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", id)))?;
    assert_owner(&order, &current)?;

    if !order.status.is_unpaid() {
        return Err(AppError::BusinessRule(format!(
            "Order is already {}",
            order.status
        )));
    }

    let mut saved_path: Option<String> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("proof") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(ToString::to_string)
            .ok_or_else(|| AppError::Validation("Missing file name".to_string()))?;
        let data = field.bytes().await?;
        saved_path = Some(state.storage.save_payment_proof(&file_name, &data).await?);
    }
    let path = saved_path
        .ok_or_else(|| AppError::Validation("Missing 'proof' field".to_string()))?;

    let updated = repo.set_payment_proof(&order.key(), path).await?;
    state.lifecycle.handle_payment_proof(&updated).await;

    let updated = state
        .lifecycle
        .change_status(&order.key(), OrderStatus::AwaitingVerification)
        .await?;

    Ok(ok_with_message(updated, "Payment proof received"))
}

/// POST /api/orders/{id}/feedback - 提交反馈
///
/// multipart 字段: "feedback" 文本（必填）+ "photo" 图片（可选）。
/// 仅限已完成且尚未反馈的订单，一单一次。
pub async fn submit_feedback(
    State(state): State<ServerState>,
    current: CurrentCustomer,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<Order>>> {
    let repo = OrderRepository::new(state.db.clone());
    let order = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", id)))?;
    assert_owner(&order, &current)?;

    if order.status != OrderStatus::Completed {
        return Err(AppError::BusinessRule(
            "Feedback is only allowed on completed orders".to_string(),
        ));
    }
    if !order.feedback_is_empty() {
        return Err(AppError::BusinessRule(
            "Feedback has already been submitted".to_string(),
        ));
    }

    let mut feedback: Option<String> = None;
    let mut photo: Option<String> = None;
    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("feedback") => {
                feedback = Some(field.text().await?);
            }
            Some("photo") => {
                let file_name = field
                    .file_name()
                    .map(ToString::to_string)
                    .ok_or_else(|| AppError::Validation("Missing file name".to_string()))?;
                let data = field.bytes().await?;
                photo = Some(state.storage.save_feedback_photo(&file_name, &data).await?);
            }
            _ => {}
        }
    }

    let feedback = feedback
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Feedback text is required".to_string()))?;

    let updated = repo.set_feedback(&order.key(), feedback, photo).await?;
    tracing::info!(order = %updated.key(), "Feedback submitted");
    Ok(ok_with_message(updated, "Thank you for your feedback"))
}

/// GET /api/orders/admin/all - 全部订单（管理员）
pub async fn list_all(
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> AppResult<Json<ApiResponse<Vec<Order>>>> {
    require_admin(&state, &headers)?;
    let repo = OrderRepository::new(state.db.clone());
    Ok(ok(repo.find_all().await?))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatus,
}

/// PUT /api/orders/{id}/status - 变更状态（管理员）
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<StatusUpdateRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    require_admin(&state, &headers)?;
    let updated = state.lifecycle.change_status(&id, payload.status).await?;
    Ok(ok(updated))
}

#[derive(Debug, Deserialize)]
pub struct ShippingFeeRequest {
    pub shipping_fee: f64,
}

/// PUT /api/orders/{id}/shipping-fee - 设置运费并重算总额（管理员）
pub async fn update_shipping_fee(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<ShippingFeeRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    require_admin(&state, &headers)?;
    if payload.shipping_fee < 0.0 {
        return Err(AppError::Validation(
            "Shipping fee cannot be negative".to_string(),
        ));
    }

    let repo = OrderRepository::new(state.db.clone());
    let updated = repo.set_shipping_fee(&id, payload.shipping_fee).await?;
    Ok(ok(updated))
}
