//! Product Repository

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, pure_key, record_id, record_key};
use crate::db::models::{Product, ProductCreate, ProductUpdate};

const PRODUCT_TABLE: &str = "product";

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_all(&self) -> RepoResult<Vec<Product>> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product ORDER BY name")
            .await?
            .take(0)?;
        Ok(products)
    }

    pub async fn find_by_category(&self, category_id: &str) -> RepoResult<Vec<Product>> {
        let category_key = record_key("category", category_id);
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product WHERE category_id = $category ORDER BY name")
            .bind(("category", category_key))
            .await?
            .take(0)?;
        Ok(products)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Product>> {
        let product: Option<Product> = self
            .base
            .db()
            .select((PRODUCT_TABLE, pure_key(PRODUCT_TABLE, id)))
            .await?;
        Ok(product)
    }

    pub async fn create(&self, data: ProductCreate) -> RepoResult<Product> {
        let product = Product {
            id: None,
            name: data.name,
            description: data.description,
            image: data.image.unwrap_or_default(),
            stock: data.stock,
            price: data.price,
            category_id: data.category_id.map(|c| record_key("category", &c)),
            last_restock_broadcast_at: None,
        };
        let created: Option<Product> = self
            .base
            .db()
            .create(PRODUCT_TABLE)
            .content(product)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create product".to_string()))
    }

    /// Update a product. Build dynamic SET clauses with proper type bindings.
    pub async fn update(&self, id: &str, data: ProductUpdate) -> RepoResult<Product> {
        let thing = record_id(PRODUCT_TABLE, id);

        let mut set_parts: Vec<&str> = Vec::new();
        if data.name.is_some() { set_parts.push("name = $name"); }
        if data.description.is_some() { set_parts.push("description = $description"); }
        if data.image.is_some() { set_parts.push("image = $image"); }
        if data.stock.is_some() { set_parts.push("stock = $stock"); }
        if data.price.is_some() { set_parts.push("price = $price"); }
        if data.category_id.is_some() { set_parts.push("category_id = $category_id"); }

        if set_parts.is_empty() {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)));
        }

        let query_str = format!("UPDATE $thing SET {} RETURN AFTER", set_parts.join(", "));
        let mut query = self.base.db().query(&query_str).bind(("thing", thing));

        if let Some(v) = data.name { query = query.bind(("name", v)); }
        if let Some(v) = data.description { query = query.bind(("description", v)); }
        if let Some(v) = data.image { query = query.bind(("image", v)); }
        if let Some(v) = data.stock { query = query.bind(("stock", v)); }
        if let Some(v) = data.price { query = query.bind(("price", v)); }
        if let Some(v) = data.category_id {
            query = query.bind(("category_id", record_key("category", &v)));
        }

        let updated: Vec<Product> = query.await?.take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))
    }

    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let deleted: Option<Product> = self
            .base
            .db()
            .delete((PRODUCT_TABLE, pure_key(PRODUCT_TABLE, id)))
            .await?;
        Ok(deleted.is_some())
    }

    /// Adjust stock by a signed delta. Unguarded: concurrent checkouts may
    /// drive stock negative, matching the store's manual replenishment flow.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> RepoResult<Product> {
        let updated: Vec<Product> = self
            .base
            .db()
            .query("UPDATE $thing SET stock = stock + $delta RETURN AFTER")
            .bind(("thing", record_id(PRODUCT_TABLE, id)))
            .bind(("delta", delta))
            .await?
            .take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))
    }

    /// Products with stock strictly below the threshold.
    pub async fn find_low_stock(&self, threshold: i64) -> RepoResult<Vec<Product>> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product WHERE stock < $threshold ORDER BY stock")
            .bind(("threshold", threshold))
            .await?
            .take(0)?;
        Ok(products)
    }

    pub async fn set_restock_broadcast_at(&self, id: &str, at: i64) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE $thing SET last_restock_broadcast_at = $at")
            .bind(("thing", record_id(PRODUCT_TABLE, id)))
            .bind(("at", at))
            .await?;
        Ok(())
    }
}
