//! # Database Migrations
//!
//! Embedded SQL migrations for Stockroom, and a check of the live schema
//! against the declared one.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  Database::new                                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Compare embedded migrations vs _sqlx_migrations                       │
//! │       │                                                                 │
//! │       ├── 0001_users.sql      ✓ (already applied)                      │
//! │       └── 0002_inventory.sql  ⬜ (pending, runs now)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  verify_schema: tables + foreign keys == stockroom_core::schema        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/sqlite/` with the next sequence number
//! 2. Name format: `NNNN_description.sql`
//! 3. **NEVER** modify existing migrations - always add new ones
//! 4. Keep `stockroom_core::schema::FOREIGN_KEYS` in step with the SQL

use sqlx::SqlitePool;
use std::collections::BTreeSet;
use stockroom_core::schema::{self, Table};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

/// Embedded migrations from the `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations.
///
/// Each migration runs in its own transaction, in filename order.
/// Safe to call repeatedly.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns `(total_migrations, applied_migrations)`.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    // The bookkeeping table does not exist before the first run.
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}

/// One row of `pragma_foreign_key_list`, reduced to what the schema
/// description declares.
type FkSignature = (String, String, String, String);

/// Compares the live database with [`schema::FOREIGN_KEYS`].
///
/// ## Checks
/// - Every table in [`Table::ALL`] exists
/// - Each table has exactly the declared foreign keys: same column, same
///   parent table, parent column `id`, same `ON DELETE` action
pub async fn verify_schema(pool: &SqlitePool) -> DbResult<()> {
    let existing: BTreeSet<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
            .fetch_all(pool)
            .await?
            .into_iter()
            .collect();

    for table in Table::ALL {
        if !existing.contains(table.name()) {
            return Err(DbError::SchemaMismatch(format!(
                "table '{}' does not exist",
                table
            )));
        }

        let actual: BTreeSet<FkSignature> = sqlx::query_as(
            r#"
            SELECT "from", "table", "to", on_delete
            FROM pragma_foreign_key_list(?1)
            "#,
        )
        .bind(table.name())
        .fetch_all(pool)
        .await?
        .into_iter()
        .collect();

        let declared: BTreeSet<FkSignature> = schema::foreign_keys_of(table)
            .map(|fk| {
                (
                    fk.column.to_string(),
                    fk.references.name().to_string(),
                    "id".to_string(),
                    fk.on_delete.sql().to_string(),
                )
            })
            .collect();

        if let Some((column, parent, _, action)) = declared.difference(&actual).next() {
            return Err(DbError::SchemaMismatch(format!(
                "{}.{} should reference {}(id) ON DELETE {}",
                table, column, parent, action
            )));
        }

        if let Some((column, parent, _, action)) = actual.difference(&declared).next() {
            return Err(DbError::SchemaMismatch(format!(
                "undeclared foreign key {}.{} -> {} ON DELETE {}",
                table, column, parent, action
            )));
        }

        debug!(table = %table, foreign_keys = declared.len(), "Table matches schema");
    }

    info!("Schema verified");
    Ok(())
}
