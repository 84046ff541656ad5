//! Category Repository

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, pure_key, record_id};
use crate::db::models::{Category, CategoryCreate, CategoryUpdate};

const CATEGORY_TABLE: &str = "category";

#[derive(Clone)]
pub struct CategoryRepository {
    base: BaseRepository,
}

impl CategoryRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_all(&self) -> RepoResult<Vec<Category>> {
        let categories: Vec<Category> = self
            .base
            .db()
            .query("SELECT * FROM category ORDER BY name")
            .await?
            .take(0)?;
        Ok(categories)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Category>> {
        let category: Option<Category> = self
            .base
            .db()
            .select((CATEGORY_TABLE, pure_key(CATEGORY_TABLE, id)))
            .await?;
        Ok(category)
    }

    pub async fn create(&self, data: CategoryCreate) -> RepoResult<Category> {
        let category = Category {
            id: None,
            name: data.name,
        };
        let created: Option<Category> = self
            .base
            .db()
            .create(CATEGORY_TABLE)
            .content(category)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create category".to_string()))
    }

    pub async fn update(&self, id: &str, data: CategoryUpdate) -> RepoResult<Category> {
        let Some(name) = data.name else {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("Category {} not found", id)));
        };

        let updated: Vec<Category> = self
            .base
            .db()
            .query("UPDATE $thing SET name = $name RETURN AFTER")
            .bind(("thing", record_id(CATEGORY_TABLE, id)))
            .bind(("name", name))
            .await?
            .take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Category {} not found", id)))
    }

    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let deleted: Option<Category> = self
            .base
            .db()
            .delete((CATEGORY_TABLE, pure_key(CATEGORY_TABLE, id)))
            .await?;
        Ok(deleted.is_some())
    }
}
