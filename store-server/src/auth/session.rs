//! 内存会话存储
//!
//! uuid v4 token ↔ 顾客键。购物车也以同一个 token 作为作用域。

use dashmap::DashMap;
use uuid::Uuid;

use shared::util::{HOUR_MILLIS, now_millis};

/// 会话 cookie 名
pub const SESSION_COOKIE: &str = "store_session";

/// 默认会话有效期（小时）
const DEFAULT_TTL_HOURS: i64 = 24 * 14;

struct SessionEntry {
    customer_id: String,
    created_at: i64,
}

/// 会话服务
pub struct SessionService {
    sessions: DashMap<String, SessionEntry>,
    ttl_millis: i64,
}

impl SessionService {
    pub fn new() -> Self {
        Self::with_ttl_hours(DEFAULT_TTL_HOURS)
    }

    pub fn with_ttl_hours(hours: i64) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl_millis: hours * HOUR_MILLIS,
        }
    }

    /// 创建会话，返回 token
    pub fn create(&self, customer_id: impl Into<String>) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.sessions.insert(
            token.clone(),
            SessionEntry {
                customer_id: customer_id.into(),
                created_at: now_millis(),
            },
        );
        token
    }

    /// token → 顾客键，过期会话顺手移除
    pub fn resolve(&self, token: &str) -> Option<String> {
        let expired = match self.sessions.get(token) {
            Some(entry) => {
                if now_millis() - entry.created_at <= self.ttl_millis {
                    return Some(entry.customer_id.clone());
                }
                true
            }
            None => false,
        };
        if expired {
            self.sessions.remove(token);
        }
        None
    }

    pub fn destroy(&self, token: &str) {
        self.sessions.remove(token);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionService {
    fn default() -> Self {
        Self::new()
    }
}

/// Set-Cookie 值（HttpOnly）
pub fn session_cookie(token: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, token)
}

/// 清除会话的 Set-Cookie 值
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; Max-Age=0", SESSION_COOKIE)
}

/// 从 Cookie 请求头中取出会话 token
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|part| part.trim().strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .next()
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_resolve_destroy() {
        let sessions = SessionService::new();
        let token = sessions.create("customer:budi");
        assert_eq!(sessions.resolve(&token).as_deref(), Some("customer:budi"));

        sessions.destroy(&token);
        assert_eq!(sessions.resolve(&token), None);
    }

    #[test]
    fn expired_session_is_removed() {
        let sessions = SessionService::with_ttl_hours(0);
        let token = sessions.create("customer:budi");
        // ttl 0h -> already expired (created_at == now, ttl 0 keeps it valid
        // for the same millisecond only, so back-date the check by sleeping)
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(sessions.resolve(&token), None);
        assert!(sessions.is_empty());
    }

    #[test]
    fn cookie_header_parsing() {
        let header = format!("theme=dark; {}=abc123; lang=id", SESSION_COOKIE);
        assert_eq!(token_from_cookie_header(&header), Some("abc123"));
        assert_eq!(token_from_cookie_header("theme=dark"), None);
        assert_eq!(
            token_from_cookie_header(&format!("{}=", SESSION_COOKIE)),
            None
        );
    }
}
