//! # Category Repository
//!
//! Product categories. Names are unique; deleting a category deletes every
//! product in it (and, through the products, their stock rows and logs).

use sqlx::SqlitePool;
use stockroom_core::validation::validate_category;
use stockroom_core::{new_id, ProductCategory};
use tracing::debug;

use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Creates a category.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - a category with this name exists
    pub async fn create(&self, name: &str, description: &str) -> DbResult<ProductCategory> {
        validate_category(name)?;

        let category = ProductCategory {
            id: new_id(),
            name: name.to_string(),
            description: description.to_string(),
        };

        debug!(name = %name, "Creating category");

        sqlx::query("INSERT INTO product_categories (id, name, description) VALUES (?1, ?2, ?3)")
            .bind(&category.id)
            .bind(&category.name)
            .bind(&category.description)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from(e).with_value(name))?;

        Ok(category)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ProductCategory>> {
        let category = sqlx::query_as::<_, ProductCategory>(
            "SELECT id, name, description FROM product_categories WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<ProductCategory>> {
        let category = sqlx::query_as::<_, ProductCategory>(
            "SELECT id, name, description FROM product_categories WHERE name = ?1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Lists all categories ordered by name.
    pub async fn list(&self) -> DbResult<Vec<ProductCategory>> {
        let categories = sqlx::query_as::<_, ProductCategory>(
            "SELECT id, name, description FROM product_categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn update(&self, category: &ProductCategory) -> DbResult<()> {
        validate_category(&category.name)?;

        debug!(id = %category.id, "Updating category");

        let result =
            sqlx::query("UPDATE product_categories SET name = ?2, description = ?3 WHERE id = ?1")
                .bind(&category.id)
                .bind(&category.name)
                .bind(&category.description)
                .execute(&self.pool)
                .await
                .map_err(|e| DbError::from(e).with_value(&category.name))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("ProductCategory", &category.id));
        }

        Ok(())
    }

    /// Deletes a category and, by cascade, its products.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting category");

        let result = sqlx::query("DELETE FROM product_categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("ProductCategory", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use chrono::NaiveDate;
    use stockroom_core::{Decimal, NewStockReceipt};

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = fixtures::db().await;
        let categories = db.categories();

        categories.create("Tools", "Hand tools").await.unwrap();
        let err = categories.create("Tools", "Power tools").await.unwrap_err();

        assert!(err.is_constraint_violation());
        assert_eq!(
            err.to_string(),
            "Duplicate product_categories.name: 'Tools' already exists"
        );
        assert_eq!(categories.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_name_is_constraint_violation() {
        let db = fixtures::db().await;

        let err = db.categories().create("", "desc").await.unwrap_err();

        assert!(err.is_constraint_violation());
        assert!(matches!(
            err,
            DbError::Validation(stockroom_core::ValidationError::Required { ref field }) if field == "name"
        ));
        assert!(db.categories().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rename_into_existing_name_rejected() {
        let db = fixtures::db().await;
        let categories = db.categories();

        categories.create("Tools", "").await.unwrap();
        let mut paint = categories.create("Paint", "").await.unwrap();

        paint.name = "Tools".to_string();
        assert!(matches!(
            categories.update(&paint).await,
            Err(DbError::UniqueViolation { .. })
        ));

        paint.name = "Paint & Coatings".to_string();
        categories.update(&paint).await.unwrap();
        assert_eq!(
            categories.get_by_name("Paint & Coatings").await.unwrap(),
            Some(paint)
        );
    }

    #[tokio::test]
    async fn test_delete_cascades_to_products_and_their_rows() {
        let db = fixtures::db().await;
        let (category, unit, widget) = fixtures::catalog(&db).await;
        let gadget = fixtures::product(&db, "Gadget", &category, &unit).await;

        let other = fixtures::category(&db, "Garden").await;
        let hose = fixtures::product(&db, "Hose", &other, &unit).await;

        db.inventory()
            .create(&widget.id, Decimal::from_whole(3))
            .await
            .unwrap();
        db.receipts()
            .create(&NewStockReceipt {
                product_id: gadget.id.clone(),
                quantity_received: Decimal::from_whole(10),
                date_received: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
                received_by: None,
                remarks: None,
            })
            .await
            .unwrap();

        db.categories().delete(&category.id).await.unwrap();

        assert!(db.products().get_by_id(&widget.id).await.unwrap().is_none());
        assert!(db.products().get_by_id(&gadget.id).await.unwrap().is_none());
        assert!(db
            .inventory()
            .list_for_product(&widget.id)
            .await
            .unwrap()
            .is_empty());
        assert!(db
            .receipts()
            .list_for_product(&gadget.id)
            .await
            .unwrap()
            .is_empty());

        // Other categories are untouched.
        assert!(db.products().get_by_id(&hose.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_missing() {
        let db = fixtures::db().await;
        assert!(matches!(
            db.categories().delete("missing").await,
            Err(DbError::NotFound { .. })
        ));
    }
}
