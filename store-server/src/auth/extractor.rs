//! 当前顾客 extractor
//!
//! 从会话 cookie 解析出登录顾客，handler 直接声明参数即可：
//!
//! ```ignore
//! pub async fn me(current: CurrentCustomer) -> AppResult<Json<CustomerResponse>> { ... }
//! ```

use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;

use crate::auth::session;
use crate::core::ServerState;
use crate::db::models::Customer;
use crate::db::repository::CustomerRepository;
use crate::utils::AppError;

/// 已登录顾客 + 会话 token
#[derive(Clone)]
pub struct CurrentCustomer {
    pub customer: Customer,
    pub session_token: String,
}

impl CurrentCustomer {
    /// 顾客纯 id（去掉表前缀）
    pub fn key(&self) -> String {
        self.customer.key()
    }
}

impl FromRequestParts<ServerState> for CurrentCustomer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        // Resolved once per request; reuse across multiple extractions
        if let Some(current) = parts.extensions.get::<CurrentCustomer>() {
            return Ok(current.clone());
        }

        let cookie_header = parts
            .headers
            .get(COOKIE)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;
        let token =
            session::token_from_cookie_header(cookie_header).ok_or(AppError::Unauthorized)?;

        let customer_id = state.sessions.resolve(token).ok_or(AppError::Unauthorized)?;

        let repo = CustomerRepository::new(state.db.clone());
        let customer = repo
            .find_by_id(&customer_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or(AppError::Unauthorized)?;

        let current = CurrentCustomer {
            customer,
            session_token: token.to_string(),
        };
        parts.extensions.insert(current.clone());
        Ok(current)
    }
}
