//! # Product Repository
//!
//! Database operations for catalog entries.
//!
//! ## Key Operations
//! - CRUD operations
//! - Name search (substring, case-insensitive for ASCII)
//! - Listing by category
//!
//! ## Referential Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  product_categories ──(CASCADE)──► products ◄──(RESTRICT)── units      │
//! │                                       │                                 │
//! │                                       └──(CASCADE)──► inventory,        │
//! │                                                       stock_* logs      │
//! │                                                                         │
//! │  category_id and unit_of_measurement_id are NOT NULL: a product        │
//! │  without either is rejected with DbError::MissingField.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use stockroom_core::validation::{validate_new_product, validate_product};
use stockroom_core::{new_id, NewProduct, Product};
use tracing::debug;

use crate::error::{DbError, DbResult};

const PRODUCT_COLUMNS: &str = "id, name, description, category_id, unit_of_measurement_id, \
                               unit_price, reorder_level, reorder_quantity";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let results = repo.search("widget", 20).await?;
/// let product = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Creates a product.
    ///
    /// ## Errors
    /// * `DbError::Validation` - blank name, decimal out of NUMERIC(10, 2)
    /// * `DbError::MissingField` - no category or no unit given
    /// * `DbError::ForeignKeyViolation` - category or unit does not exist
    pub async fn create(&self, new: &NewProduct) -> DbResult<Product> {
        validate_new_product(new)?;

        debug!(name = %new.name, "Creating product");

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (
                id, name, description, category_id, unit_of_measurement_id,
                unit_price, reorder_level, reorder_quantity
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(new_id())
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.category_id)
        .bind(&new.unit_of_measurement_id)
        .bind(new.unit_price)
        .bind(new.reorder_level)
        .bind(new.reorder_quantity)
        .fetch_one(&self.pool)
        .await?;

        debug!(id = %product.id, "Product created");
        Ok(product)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists all products ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    pub async fn list_by_category(&self, category_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE category_id = ?1 ORDER BY name, id"
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Searches products by name fragment.
    ///
    /// An empty query returns the first `limit` products by name. `%` and
    /// `_` in the query match literally.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching products");

        let pattern = format!("%{}%", escape_like(query));

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE name LIKE ?1 ESCAPE '\'
            ORDER BY name, id
            LIMIT ?2
            "#
        ))
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Updates every field except the ID.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        validate_product(product)?;

        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                description = ?3,
                category_id = ?4,
                unit_of_measurement_id = ?5,
                unit_price = ?6,
                reorder_level = ?7,
                reorder_quantity = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category_id)
        .bind(&product.unit_of_measurement_id)
        .bind(product.unit_price)
        .bind(product.reorder_level)
        .bind(product.reorder_quantity)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Deletes a product together with its inventory rows and stock logs.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Escapes LIKE wildcards with `\`.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use stockroom_core::Decimal;

    #[tokio::test]
    async fn test_create_round_trip() {
        let db = fixtures::db().await;
        let (category, unit, widget) = fixtures::catalog(&db).await;

        assert_eq!(widget.category_id, category.id);
        assert_eq!(widget.unit_of_measurement_id, unit.id);
        assert_eq!(widget.unit_price.to_string(), "19.99");

        let stored = db.products().get_by_id(&widget.id).await.unwrap();
        assert_eq!(stored, Some(widget));
        assert_eq!(db.products().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_product_requires_category_and_unit() {
        let db = fixtures::db().await;
        let (category, unit, _) = fixtures::catalog(&db).await;
        let products = db.products();

        let mut no_category = fixtures::new_product("Gadget", &category, &unit);
        no_category.category_id = None;
        let err = products.create(&no_category).await.unwrap_err();
        assert!(
            matches!(err, DbError::MissingField { ref field } if field == "products.category_id")
        );
        assert!(err.is_constraint_violation());

        let mut no_unit = fixtures::new_product("Gadget", &category, &unit);
        no_unit.unit_of_measurement_id = None;
        let err = products.create(&no_unit).await.unwrap_err();
        assert!(
            matches!(err, DbError::MissingField { ref field } if field == "products.unit_of_measurement_id")
        );

        assert_eq!(products.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_category_rejected() {
        let db = fixtures::db().await;
        let (category, unit, _) = fixtures::catalog(&db).await;

        let mut product = fixtures::new_product("Gadget", &category, &unit);
        product.category_id = Some("no-such-category".to_string());

        assert!(matches!(
            db.products().create(&product).await,
            Err(DbError::ForeignKeyViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_out_of_range_price_rejected() {
        let db = fixtures::db().await;
        let (category, unit, _) = fixtures::catalog(&db).await;

        let mut product = fixtures::new_product("Gadget", &category, &unit);
        product.unit_price = Decimal::from_hundredths(10_000_000_000);

        assert!(matches!(
            db.products().create(&product).await,
            Err(DbError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_search_and_list_by_category() {
        let db = fixtures::db().await;
        let (hardware, unit, _) = fixtures::catalog(&db).await;
        fixtures::product(&db, "Widget Pro", &hardware, &unit).await;
        fixtures::product(&db, "100% Cotton Rag", &hardware, &unit).await;
        let garden = fixtures::category(&db, "Garden").await;
        fixtures::product(&db, "Garden Widget", &garden, &unit).await;

        let products = db.products();

        let names = |ps: Vec<Product>| ps.into_iter().map(|p| p.name).collect::<Vec<_>>();

        assert_eq!(
            names(products.search("widget", 20).await.unwrap()),
            vec!["Garden Widget", "Widget", "Widget Pro"]
        );
        assert_eq!(products.search("widget", 2).await.unwrap().len(), 2);
        assert_eq!(
            names(products.search("100%", 20).await.unwrap()),
            vec!["100% Cotton Rag"]
        );
        assert_eq!(products.search("0%C", 20).await.unwrap().len(), 0);
        assert_eq!(products.search("  ", 20).await.unwrap().len(), 4);

        assert_eq!(
            names(products.list_by_category(&garden.id).await.unwrap()),
            vec!["Garden Widget"]
        );
        assert_eq!(products.list().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = fixtures::db().await;
        let (_, _, mut widget) = fixtures::catalog(&db).await;
        let products = db.products();

        widget.unit_price = "24.50".parse().unwrap();
        widget.description = "Now with more widget".to_string();
        products.update(&widget).await.unwrap();
        assert_eq!(
            products.get_by_id(&widget.id).await.unwrap(),
            Some(widget.clone())
        );

        products.delete(&widget.id).await.unwrap();
        assert!(products.get_by_id(&widget.id).await.unwrap().is_none());
        assert!(matches!(
            products.update(&widget).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_stock_rows_and_logs() {
        let db = fixtures::db().await;
        let (_, _, widget) = fixtures::catalog(&db).await;

        db.inventory()
            .create(&widget.id, Decimal::from_whole(8))
            .await
            .unwrap();
        db.adjustments()
            .create(&stockroom_core::NewStockAdjustment {
                product_id: widget.id.clone(),
                quantity_adjusted: Decimal::from_whole(-1),
                adjustment_reason: "Lost".to_string(),
                date_adjusted: chrono::NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                adjusted_by: None,
                remarks: None,
            })
            .await
            .unwrap();

        db.products().delete(&widget.id).await.unwrap();

        assert!(db
            .inventory()
            .list_for_product(&widget.id)
            .await
            .unwrap()
            .is_empty());
        assert!(db
            .adjustments()
            .list_for_product(&widget.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
