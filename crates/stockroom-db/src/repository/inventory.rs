//! # Inventory Repository
//!
//! Stock level rows. A product may own any number of rows; nothing here
//! enforces one per product.
//!
//! `last_updated` is written by this repository on every insert and every
//! update, whatever fields changed. Callers cannot set it.
//!
//! Stock receipts, issues and adjustments do NOT change `quantity`: they are
//! logs only, and callers keep the two in step themselves.

use chrono::Utc;
use sqlx::SqlitePool;
use stockroom_core::validation::validate_quantity;
use stockroom_core::{new_id, Decimal, Inventory, Product, UnitOfMeasurement};
use tracing::debug;

use crate::error::{DbError, DbResult};

const INVENTORY_COLUMNS: &str = "id, product_id, quantity, last_updated";

#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Creates a stock row for `product_id`.
    pub async fn create(&self, product_id: &str, quantity: Decimal) -> DbResult<Inventory> {
        validate_quantity(quantity)?;

        let inventory = Inventory {
            id: new_id(),
            product_id: product_id.to_string(),
            quantity,
            last_updated: Utc::now(),
        };

        debug!(product_id = %product_id, quantity = %quantity, "Creating inventory row");

        sqlx::query(
            "INSERT INTO inventory (id, product_id, quantity, last_updated) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&inventory.id)
        .bind(&inventory.product_id)
        .bind(inventory.quantity)
        .bind(inventory.last_updated)
        .execute(&self.pool)
        .await?;

        Ok(inventory)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Inventory>> {
        let inventory = sqlx::query_as::<_, Inventory>(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(inventory)
    }

    pub async fn list_for_product(&self, product_id: &str) -> DbResult<Vec<Inventory>> {
        let rows = sqlx::query_as::<_, Inventory>(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory WHERE product_id = ?1 ORDER BY last_updated, id"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Saves every field of `inventory` and stamps `last_updated`.
    ///
    /// The `last_updated` carried by the argument is ignored. Returns the row
    /// as stored.
    pub async fn save(&self, inventory: &Inventory) -> DbResult<Inventory> {
        validate_quantity(inventory.quantity)?;

        let now = Utc::now();

        debug!(id = %inventory.id, quantity = %inventory.quantity, "Saving inventory row");

        let result = sqlx::query(
            r#"
            UPDATE inventory SET
                product_id = ?2,
                quantity = ?3,
                last_updated = ?4
            WHERE id = ?1
            "#,
        )
        .bind(&inventory.id)
        .bind(&inventory.product_id)
        .bind(inventory.quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory", &inventory.id));
        }

        Ok(Inventory {
            last_updated: now,
            ..inventory.clone()
        })
    }

    /// Sets the quantity of one row, stamping `last_updated`.
    ///
    /// Only `quantity` and `last_updated` are written; the other columns
    /// keep whatever is stored at the time of the update.
    pub async fn set_quantity(&self, id: &str, quantity: Decimal) -> DbResult<Inventory> {
        validate_quantity(quantity)?;

        debug!(id = %id, quantity = %quantity, "Setting inventory quantity");

        sqlx::query_as::<_, Inventory>(&format!(
            "UPDATE inventory SET quantity = ?2, last_updated = ?3 WHERE id = ?1 \
             RETURNING {INVENTORY_COLUMNS}"
        ))
        .bind(id)
        .bind(quantity)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Inventory", id))
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting inventory row");

        let result = sqlx::query("DELETE FROM inventory WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory", id));
        }

        Ok(())
    }

    /// Display label, e.g. `"Widget - 12.50 kg"`.
    pub async fn label(&self, id: &str) -> DbResult<String> {
        let inventory = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Inventory", id))?;

        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, category_id, unit_of_measurement_id,
                   unit_price, reorder_level, reorder_quantity
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(&inventory.product_id)
        .fetch_one(&self.pool)
        .await?;

        let unit = sqlx::query_as::<_, UnitOfMeasurement>(
            "SELECT id, name, abbreviation FROM units_of_measurement WHERE id = ?1",
        )
        .bind(&product.unit_of_measurement_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(inventory.label(&product, &unit))
    }
}
