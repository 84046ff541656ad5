//! 管理员路由守卫
//!
//! 管理接口共享令牌：请求头 `X-Admin-Token` 必须与配置一致。
//! `ADMIN_TOKEN` 未设置时所有管理接口关闭。

use axum::http::HeaderMap;

use crate::core::ServerState;
use crate::utils::AppError;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// 校验管理员令牌；handler 开头调用
pub fn require_admin(state: &ServerState, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(expected) = state.config.admin_token.as_deref() else {
        return Err(AppError::Forbidden("Admin API is disabled".to_string()));
    };

    let provided = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if provided == expected {
        Ok(())
    } else {
        Err(AppError::Forbidden("Invalid admin token".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;

    fn headers(token: Option<&str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(t) = token {
            map.insert(ADMIN_TOKEN_HEADER, t.parse().unwrap());
        }
        map
    }

    #[tokio::test]
    async fn token_is_checked_against_config() {
        let mut config = Config::with_overrides("/tmp/store-admin-test", 0);
        config.admin_token = Some("rahasia".into());
        let state = crate::core::ServerState::initialize_in_memory(config)
            .await
            .unwrap();

        assert!(require_admin(&state, &headers(Some("rahasia"))).is_ok());
        assert!(require_admin(&state, &headers(Some("salah"))).is_err());
        assert!(require_admin(&state, &headers(None)).is_err());
    }

    #[tokio::test]
    async fn missing_config_disables_admin_api() {
        let mut config = Config::with_overrides("/tmp/store-admin-test2", 0);
        config.admin_token = None;
        let state = crate::core::ServerState::initialize_in_memory(config)
            .await
            .unwrap();

        assert!(require_admin(&state, &headers(Some("anything"))).is_err());
    }
}
