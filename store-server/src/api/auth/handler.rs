//! 认证 API Handlers

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header::SET_COOKIE},
};
use serde::Deserialize;
use validator::Validate;

use shared::{ApiResponse, Empty};

use crate::auth::password::{self, VerifyOutcome};
use crate::auth::session;
use crate::auth::CurrentCustomer;
use crate::core::ServerState;
use crate::db::models::{Customer, CustomerCreate, CustomerResponse, CustomerUpdate};
use crate::db::repository::CustomerRepository;
use crate::utils::{AppError, AppResult, ok, ok_with_message};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

fn set_cookie_headers(token: &str) -> Result<HeaderMap, AppError> {
    let mut headers = HeaderMap::new();
    let value = session::session_cookie(token)
        .parse()
        .map_err(|e| AppError::Internal(format!("Invalid cookie value: {}", e)))?;
    headers.insert(SET_COOKIE, value);
    Ok(headers)
}

/// POST /api/auth/register - 注册并自动登录
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<CustomerCreate>,
) -> AppResult<(HeaderMap, Json<ApiResponse<CustomerResponse>>)> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let repo = CustomerRepository::new(state.db.clone());
    if repo.find_by_username(&payload.username).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "Username {} is already taken",
            payload.username
        )));
    }
    // 邮箱可选，但填了必须全局唯一
    if let Some(email) = payload.email.as_deref().filter(|e| !e.is_empty())
        && repo.find_by_email(email).await?.is_some()
    {
        return Err(AppError::Conflict(format!(
            "Email {} is already registered",
            email
        )));
    }

    let customer = Customer {
        id: None,
        name: payload.name,
        address: payload.address,
        birth_date: payload.birth_date,
        phone: payload.phone,
        username: payload.username,
        password: password::hash_password(&payload.password)?,
        email: payload.email.filter(|e| !e.is_empty()),
        is_birthday_discount_active: false,
        birthday_discount_activated_at: None,
        lifetime_spend: 0.0,
    };
    let created = repo.create(customer).await?;

    tracing::info!(customer = %created.username, "Customer registered");

    let token = state.sessions.create(created.key());
    Ok((
        set_cookie_headers(&token)?,
        ok_with_message(CustomerResponse::from(created), "Registered"),
    ))
}

/// POST /api/auth/login - 登录
///
/// 旧系统迁移的明文密码在首次成功登录时被重哈希。
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(HeaderMap, Json<ApiResponse<CustomerResponse>>)> {
    let repo = CustomerRepository::new(state.db.clone());
    let customer = repo
        .find_by_username(&payload.username)
        .await?
        .ok_or_else(AppError::invalid_credentials)?;

    match password::verify_password(&payload.password, &customer.password) {
        VerifyOutcome::Valid => {}
        VerifyOutcome::ValidNeedsRehash => {
            let rehashed = password::hash_password(&payload.password)?;
            repo.set_password(&customer.key(), rehashed).await?;
            tracing::info!(customer = %customer.username, "Legacy password rehashed");
        }
        VerifyOutcome::Invalid => return Err(AppError::invalid_credentials()),
    }

    let token = state.sessions.create(customer.key());
    tracing::info!(customer = %customer.username, "Customer logged in");

    Ok((
        set_cookie_headers(&token)?,
        ok(CustomerResponse::from(customer)),
    ))
}

/// POST /api/auth/logout - 登出
pub async fn logout(
    State(state): State<ServerState>,
    current: CurrentCustomer,
) -> AppResult<(HeaderMap, Json<ApiResponse<Empty>>)> {
    state.sessions.destroy(&current.session_token);
    state.carts.clear(&current.session_token);

    let mut headers = HeaderMap::new();
    let value = session::clear_session_cookie()
        .parse()
        .map_err(|e| AppError::Internal(format!("Invalid cookie value: {}", e)))?;
    headers.insert(SET_COOKIE, value);

    Ok((headers, ok_with_message(Empty, "Logged out")))
}

/// GET /api/auth/me - 当前账户
pub async fn me(current: CurrentCustomer) -> Json<ApiResponse<CustomerResponse>> {
    ok(CustomerResponse::from(current.customer))
}

/// PUT /api/auth/me - 更新账户（全部字段可选）
pub async fn update_me(
    State(state): State<ServerState>,
    current: CurrentCustomer,
    Json(mut payload): Json<CustomerUpdate>,
) -> AppResult<Json<ApiResponse<CustomerResponse>>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let repo = CustomerRepository::new(state.db.clone());

    // 换邮箱时同样要求唯一（占用者是自己除外）
    if let Some(email) = payload.email.as_deref().filter(|e| !e.is_empty())
        && let Some(existing) = repo.find_by_email(email).await?
        && existing.key() != current.key()
    {
        return Err(AppError::Conflict(format!(
            "Email {} is already registered",
            email
        )));
    }

    // 密码单独处理，不走动态 SET 更新
    if let Some(raw) = payload.password.take() {
        let hashed = password::hash_password(&raw)?;
        repo.set_password(&current.key(), hashed).await?;
    }

    let updated = repo.update(&current.key(), payload).await?;
    Ok(ok(CustomerResponse::from(updated)))
}
