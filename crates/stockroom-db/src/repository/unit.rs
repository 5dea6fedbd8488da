//! # Unit Repository
//!
//! Units of measurement. Name and abbreviation are each unique. A unit that
//! any product still uses cannot be deleted.

use sqlx::SqlitePool;
use stockroom_core::validation::validate_unit;
use stockroom_core::{new_id, UnitOfMeasurement};
use tracing::debug;

use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct UnitRepository {
    pool: SqlitePool,
}

impl UnitRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UnitRepository { pool }
    }

    /// Creates a unit.
    ///
    /// ## Errors
    /// * `DbError::Validation` - abbreviation longer than 10 characters
    /// * `DbError::UniqueViolation` - name or abbreviation already used
    pub async fn create(&self, name: &str, abbreviation: &str) -> DbResult<UnitOfMeasurement> {
        validate_unit(name, abbreviation)?;

        let unit = UnitOfMeasurement {
            id: new_id(),
            name: name.to_string(),
            abbreviation: abbreviation.to_string(),
        };

        debug!(name = %name, abbreviation = %abbreviation, "Creating unit");

        sqlx::query(
            "INSERT INTO units_of_measurement (id, name, abbreviation) VALUES (?1, ?2, ?3)",
        )
        .bind(&unit.id)
        .bind(&unit.name)
        .bind(&unit.abbreviation)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_field(e.into(), &unit))?;

        Ok(unit)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<UnitOfMeasurement>> {
        let unit = sqlx::query_as::<_, UnitOfMeasurement>(
            "SELECT id, name, abbreviation FROM units_of_measurement WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(unit)
    }

    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<UnitOfMeasurement>> {
        let unit = sqlx::query_as::<_, UnitOfMeasurement>(
            "SELECT id, name, abbreviation FROM units_of_measurement WHERE name = ?1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(unit)
    }

    pub async fn get_by_abbreviation(&self, abbreviation: &str) -> DbResult<Option<UnitOfMeasurement>> {
        let unit = sqlx::query_as::<_, UnitOfMeasurement>(
            "SELECT id, name, abbreviation FROM units_of_measurement WHERE abbreviation = ?1",
        )
        .bind(abbreviation)
        .fetch_optional(&self.pool)
        .await?;

        Ok(unit)
    }

    /// Lists all units ordered by name.
    pub async fn list(&self) -> DbResult<Vec<UnitOfMeasurement>> {
        let units = sqlx::query_as::<_, UnitOfMeasurement>(
            "SELECT id, name, abbreviation FROM units_of_measurement ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(units)
    }

    pub async fn update(&self, unit: &UnitOfMeasurement) -> DbResult<()> {
        validate_unit(&unit.name, &unit.abbreviation)?;

        debug!(id = %unit.id, "Updating unit");

        let result = sqlx::query(
            "UPDATE units_of_measurement SET name = ?2, abbreviation = ?3 WHERE id = ?1",
        )
        .bind(&unit.id)
        .bind(&unit.name)
        .bind(&unit.abbreviation)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_field(e.into(), unit))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("UnitOfMeasurement", &unit.id));
        }

        Ok(())
    }

    /// Deletes a unit.
    ///
    /// ## Errors
    /// * `DbError::ForeignKeyViolation` - a product still uses the unit
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting unit");

        let result = sqlx::query("DELETE FROM units_of_measurement WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("UnitOfMeasurement", id));
        }

        Ok(())
    }
}

fn duplicate_field(err: DbError, unit: &UnitOfMeasurement) -> DbError {
    match &err {
        DbError::UniqueViolation { field, .. } if field.ends_with(".abbreviation") => {
            err.with_value(&unit.abbreviation)
        }
        DbError::UniqueViolation { .. } => err.with_value(&unit.name),
        _ => err,
    }
}
