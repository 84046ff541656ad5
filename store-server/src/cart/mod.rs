//! 购物车
//!
//! 购物车存在内存里，以会话 token 为作用域。结账成功后清空；会话过期
//! 购物车随之消失（与原门店流程一致，车内商品不做库存预留）。

use dashmap::DashMap;

/// 购物车条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartEntry {
    /// 商品键 "product:xxx"
    pub product_id: String,
    pub quantity: i64,
}

/// 会话购物车存储
pub struct CartStore {
    carts: DashMap<String, Vec<CartEntry>>,
}

impl CartStore {
    pub fn new() -> Self {
        Self {
            carts: DashMap::new(),
        }
    }

    /// 加入购物车：已存在则数量 +1
    pub fn add(&self, session: &str, product_id: &str) {
        let mut cart = self.carts.entry(session.to_string()).or_default();
        match cart.iter_mut().find(|e| e.product_id == product_id) {
            Some(entry) => entry.quantity += 1,
            None => cart.push(CartEntry {
                product_id: product_id.to_string(),
                quantity: 1,
            }),
        }
    }

    /// 批量更新数量，数量下限为 1（与原收银台行为一致）
    pub fn set_quantities(&self, session: &str, updates: &[(String, i64)]) {
        let Some(mut cart) = self.carts.get_mut(session) else {
            return;
        };
        for (product_id, quantity) in updates {
            if let Some(entry) = cart.iter_mut().find(|e| &e.product_id == product_id) {
                entry.quantity = (*quantity).max(1);
            }
        }
    }

    pub fn remove(&self, session: &str, product_id: &str) {
        if let Some(mut cart) = self.carts.get_mut(session) {
            cart.retain(|e| e.product_id != product_id);
        }
    }

    pub fn entries(&self, session: &str) -> Vec<CartEntry> {
        self.carts
            .get(session)
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    pub fn clear(&self, session: &str) {
        self.carts.remove(session);
    }
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_accumulates_quantity() {
        let store = CartStore::new();
        store.add("s1", "product:semen");
        store.add("s1", "product:semen");
        store.add("s1", "product:pasir");

        let entries = store.entries("s1");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].quantity, 2);
        assert_eq!(entries[1].quantity, 1);
    }

    #[test]
    fn quantities_clamp_to_one() {
        let store = CartStore::new();
        store.add("s1", "product:semen");
        store.set_quantities("s1", &[("product:semen".into(), 0)]);
        assert_eq!(store.entries("s1")[0].quantity, 1);

        store.set_quantities("s1", &[("product:semen".into(), 7)]);
        assert_eq!(store.entries("s1")[0].quantity, 7);
    }

    #[test]
    fn clear_empties_the_cart() {
        let store = CartStore::new();
        store.add("s1", "product:semen");
        store.clear("s1");
        assert!(store.entries("s1").is_empty());
    }

    #[test]
    fn carts_are_session_scoped() {
        let store = CartStore::new();
        store.add("s1", "product:semen");
        store.add("s2", "product:pasir");
        store.remove("s1", "product:semen");
        assert!(store.entries("s1").is_empty());
        assert_eq!(store.entries("s2").len(), 1);
    }
}
