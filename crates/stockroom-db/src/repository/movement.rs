//! # Stock Movement Repositories
//!
//! Receipts, issues and adjustments: dated records of stock coming in,
//! going out, or being corrected.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  product deleted ──────────► movement rows deleted (CASCADE)           │
//! │  acting user deleted ──────► received_by / issued_by / adjusted_by     │
//! │                              set to NULL, row kept (SET NULL)          │
//! │                                                                         │
//! │  Movements are logs: recording one never changes inventory.quantity.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use stockroom_core::validation::{
    validate_adjustment, validate_issue, validate_new_adjustment, validate_new_issue,
    validate_new_receipt, validate_receipt,
};
use stockroom_core::{
    new_id, NewStockAdjustment, NewStockIssue, NewStockReceipt, StockAdjustment, StockIssue,
    StockReceipt,
};
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Name of the product a movement row belongs to.
async fn product_name(pool: &SqlitePool, product_id: &str) -> DbResult<String> {
    let name: String = sqlx::query_scalar("SELECT name FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DbError::not_found("Product", product_id))?;

    Ok(name)
}

// =============================================================================
// Stock Receipts
// =============================================================================

const RECEIPT_COLUMNS: &str =
    "id, product_id, quantity_received, date_received, received_by, remarks";

#[derive(Debug, Clone)]
pub struct StockReceiptRepository {
    pool: SqlitePool,
}

impl StockReceiptRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StockReceiptRepository { pool }
    }

    /// Records a receipt.
    ///
    /// ## Errors
    /// * `DbError::ForeignKeyViolation` - unknown product or receiving user
    pub async fn create(&self, new: &NewStockReceipt) -> DbResult<StockReceipt> {
        validate_new_receipt(new)?;

        let receipt = StockReceipt {
            id: new_id(),
            product_id: new.product_id.clone(),
            quantity_received: new.quantity_received,
            date_received: new.date_received,
            received_by: new.received_by.clone(),
            remarks: new.remarks.clone(),
        };

        debug!(
            product_id = %receipt.product_id,
            quantity = %receipt.quantity_received,
            "Recording stock receipt"
        );

        sqlx::query(
            r#"
            INSERT INTO stock_receipts (
                id, product_id, quantity_received, date_received, received_by, remarks
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&receipt.id)
        .bind(&receipt.product_id)
        .bind(receipt.quantity_received)
        .bind(receipt.date_received)
        .bind(&receipt.received_by)
        .bind(&receipt.remarks)
        .execute(&self.pool)
        .await?;

        Ok(receipt)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StockReceipt>> {
        let receipt = sqlx::query_as::<_, StockReceipt>(&format!(
            "SELECT {RECEIPT_COLUMNS} FROM stock_receipts WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(receipt)
    }

    /// Receipts of one product, newest first.
    pub async fn list_for_product(&self, product_id: &str) -> DbResult<Vec<StockReceipt>> {
        let receipts = sqlx::query_as::<_, StockReceipt>(&format!(
            "SELECT {RECEIPT_COLUMNS} FROM stock_receipts \
             WHERE product_id = ?1 ORDER BY date_received DESC, id"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(receipts)
    }

    /// Receipts recorded by one user, newest first.
    pub async fn list_by_user(&self, user_id: &str) -> DbResult<Vec<StockReceipt>> {
        let receipts = sqlx::query_as::<_, StockReceipt>(&format!(
            "SELECT {RECEIPT_COLUMNS} FROM stock_receipts \
             WHERE received_by = ?1 ORDER BY date_received DESC, id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(receipts)
    }

    pub async fn update(&self, receipt: &StockReceipt) -> DbResult<()> {
        validate_receipt(receipt)?;

        debug!(id = %receipt.id, "Updating stock receipt");

        let result = sqlx::query(
            r#"
            UPDATE stock_receipts SET
                product_id = ?2,
                quantity_received = ?3,
                date_received = ?4,
                received_by = ?5,
                remarks = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&receipt.id)
        .bind(&receipt.product_id)
        .bind(receipt.quantity_received)
        .bind(receipt.date_received)
        .bind(&receipt.received_by)
        .bind(&receipt.remarks)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("StockReceipt", &receipt.id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM stock_receipts WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("StockReceipt", id));
        }

        Ok(())
    }

    /// `"Stock receipt for Widget on 2024-06-30"`
    pub async fn label(&self, id: &str) -> DbResult<String> {
        let receipt = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("StockReceipt", id))?;

        let name = product_name(&self.pool, &receipt.product_id).await?;
        Ok(receipt.label(&name))
    }
}

// =============================================================================
// Stock Issues
// =============================================================================

const ISSUE_COLUMNS: &str =
    "id, product_id, quantity_issued, date_issued, issued_by, issued_to, remarks";

#[derive(Debug, Clone)]
pub struct StockIssueRepository {
    pool: SqlitePool,
}

impl StockIssueRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StockIssueRepository { pool }
    }

    /// Records an issue.
    ///
    /// ## Errors
    /// * `DbError::Validation` - blank `issued_to`
    /// * `DbError::ForeignKeyViolation` - unknown product or issuing user
    pub async fn create(&self, new: &NewStockIssue) -> DbResult<StockIssue> {
        validate_new_issue(new)?;

        let issue = StockIssue {
            id: new_id(),
            product_id: new.product_id.clone(),
            quantity_issued: new.quantity_issued,
            date_issued: new.date_issued,
            issued_by: new.issued_by.clone(),
            issued_to: new.issued_to.clone(),
            remarks: new.remarks.clone(),
        };

        debug!(
            product_id = %issue.product_id,
            quantity = %issue.quantity_issued,
            issued_to = %issue.issued_to,
            "Recording stock issue"
        );

        sqlx::query(
            r#"
            INSERT INTO stock_issues (
                id, product_id, quantity_issued, date_issued, issued_by, issued_to, remarks
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&issue.id)
        .bind(&issue.product_id)
        .bind(issue.quantity_issued)
        .bind(issue.date_issued)
        .bind(&issue.issued_by)
        .bind(&issue.issued_to)
        .bind(&issue.remarks)
        .execute(&self.pool)
        .await?;

        Ok(issue)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StockIssue>> {
        let issue = sqlx::query_as::<_, StockIssue>(&format!(
            "SELECT {ISSUE_COLUMNS} FROM stock_issues WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(issue)
    }

    /// Issues of one product, newest first.
    pub async fn list_for_product(&self, product_id: &str) -> DbResult<Vec<StockIssue>> {
        let issues = sqlx::query_as::<_, StockIssue>(&format!(
            "SELECT {ISSUE_COLUMNS} FROM stock_issues \
             WHERE product_id = ?1 ORDER BY date_issued DESC, id"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(issues)
    }

    /// Issues recorded by one user, newest first.
    pub async fn list_by_user(&self, user_id: &str) -> DbResult<Vec<StockIssue>> {
        let issues = sqlx::query_as::<_, StockIssue>(&format!(
            "SELECT {ISSUE_COLUMNS} FROM stock_issues \
             WHERE issued_by = ?1 ORDER BY date_issued DESC, id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(issues)
    }

    pub async fn update(&self, issue: &StockIssue) -> DbResult<()> {
        validate_issue(issue)?;

        debug!(id = %issue.id, "Updating stock issue");

        let result = sqlx::query(
            r#"
            UPDATE stock_issues SET
                product_id = ?2,
                quantity_issued = ?3,
                date_issued = ?4,
                issued_by = ?5,
                issued_to = ?6,
                remarks = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&issue.id)
        .bind(&issue.product_id)
        .bind(issue.quantity_issued)
        .bind(issue.date_issued)
        .bind(&issue.issued_by)
        .bind(&issue.issued_to)
        .bind(&issue.remarks)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("StockIssue", &issue.id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM stock_issues WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("StockIssue", id));
        }

        Ok(())
    }

    /// `"Stock issue for Widget on 2024-06-30"`
    pub async fn label(&self, id: &str) -> DbResult<String> {
        let issue = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("StockIssue", id))?;

        let name = product_name(&self.pool, &issue.product_id).await?;
        Ok(issue.label(&name))
    }
}

// =============================================================================
// Stock Adjustments
// =============================================================================

const ADJUSTMENT_COLUMNS: &str = "id, product_id, quantity_adjusted, adjustment_reason, \
                                  date_adjusted, adjusted_by, remarks";

#[derive(Debug, Clone)]
pub struct StockAdjustmentRepository {
    pool: SqlitePool,
}

impl StockAdjustmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StockAdjustmentRepository { pool }
    }

    /// Records an adjustment. `quantity_adjusted` may be negative.
    pub async fn create(&self, new: &NewStockAdjustment) -> DbResult<StockAdjustment> {
        validate_new_adjustment(new)?;

        let adjustment = StockAdjustment {
            id: new_id(),
            product_id: new.product_id.clone(),
            quantity_adjusted: new.quantity_adjusted,
            adjustment_reason: new.adjustment_reason.clone(),
            date_adjusted: new.date_adjusted,
            adjusted_by: new.adjusted_by.clone(),
            remarks: new.remarks.clone(),
        };

        debug!(
            product_id = %adjustment.product_id,
            quantity = %adjustment.quantity_adjusted,
            reason = %adjustment.adjustment_reason,
            "Recording stock adjustment"
        );

        sqlx::query(
            r#"
            INSERT INTO stock_adjustments (
                id, product_id, quantity_adjusted, adjustment_reason,
                date_adjusted, adjusted_by, remarks
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&adjustment.id)
        .bind(&adjustment.product_id)
        .bind(adjustment.quantity_adjusted)
        .bind(&adjustment.adjustment_reason)
        .bind(adjustment.date_adjusted)
        .bind(&adjustment.adjusted_by)
        .bind(&adjustment.remarks)
        .execute(&self.pool)
        .await?;

        Ok(adjustment)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StockAdjustment>> {
        let adjustment = sqlx::query_as::<_, StockAdjustment>(&format!(
            "SELECT {ADJUSTMENT_COLUMNS} FROM stock_adjustments WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(adjustment)
    }

    /// Adjustments of one product, newest first.
    pub async fn list_for_product(&self, product_id: &str) -> DbResult<Vec<StockAdjustment>> {
        let adjustments = sqlx::query_as::<_, StockAdjustment>(&format!(
            "SELECT {ADJUSTMENT_COLUMNS} FROM stock_adjustments \
             WHERE product_id = ?1 ORDER BY date_adjusted DESC, id"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(adjustments)
    }

    /// Adjustments recorded by one user, newest first.
    pub async fn list_by_user(&self, user_id: &str) -> DbResult<Vec<StockAdjustment>> {
        let adjustments = sqlx::query_as::<_, StockAdjustment>(&format!(
            "SELECT {ADJUSTMENT_COLUMNS} FROM stock_adjustments \
             WHERE adjusted_by = ?1 ORDER BY date_adjusted DESC, id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(adjustments)
    }

    pub async fn update(&self, adjustment: &StockAdjustment) -> DbResult<()> {
        validate_adjustment(adjustment)?;

        debug!(id = %adjustment.id, "Updating stock adjustment");

        let result = sqlx::query(
            r#"
            UPDATE stock_adjustments SET
                product_id = ?2,
                quantity_adjusted = ?3,
                adjustment_reason = ?4,
                date_adjusted = ?5,
                adjusted_by = ?6,
                remarks = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&adjustment.id)
        .bind(&adjustment.product_id)
        .bind(adjustment.quantity_adjusted)
        .bind(&adjustment.adjustment_reason)
        .bind(adjustment.date_adjusted)
        .bind(&adjustment.adjusted_by)
        .bind(&adjustment.remarks)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("StockAdjustment", &adjustment.id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM stock_adjustments WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("StockAdjustment", id));
        }

        Ok(())
    }

    /// `"Stock adjustment for Widget on 2024-06-30"`
    pub async fn label(&self, id: &str) -> DbResult<String> {
        let adjustment = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("StockAdjustment", id))?;

        let name = product_name(&self.pool, &adjustment.product_id).await?;
        Ok(adjustment.label(&name))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use chrono::NaiveDate;
    use stockroom_core::Decimal;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn receipt(product_id: &str, user_id: Option<&str>, date: NaiveDate) -> NewStockReceipt {
        NewStockReceipt {
            product_id: product_id.to_string(),
            quantity_received: Decimal::from_whole(25),
            date_received: date,
            received_by: user_id.map(str::to_string),
            remarks: Some("Pallet 7".to_string()),
        }
    }

    #[tokio::test]
    async fn test_receipt_round_trip_and_label() {
        let db = fixtures::db().await;
        let (_, _, widget) = fixtures::catalog(&db).await;
        let clerk = fixtures::user(&db, "clerk").await;

        let created = db
            .receipts()
            .create(&receipt(&widget.id, Some(&clerk.id), day(30)))
            .await
            .unwrap();

        let stored = db.receipts().get_by_id(&created.id).await.unwrap();
        assert_eq!(stored, Some(created.clone()));
        assert_eq!(
            db.receipts().label(&created.id).await.unwrap(),
            "Stock receipt for Widget on 2024-06-30"
        );
    }

    #[tokio::test]
    async fn test_deleting_user_nulls_received_by() {
        let db = fixtures::db().await;
        let (_, _, widget) = fixtures::catalog(&db).await;
        let clerk = fixtures::user(&db, "clerk").await;

        let created = db
            .receipts()
            .create(&receipt(&widget.id, Some(&clerk.id), day(1)))
            .await
            .unwrap();
        assert_eq!(db.receipts().list_by_user(&clerk.id).await.unwrap().len(), 1);

        db.users().delete(&clerk.id).await.unwrap();

        let kept = db.receipts().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(kept.received_by, None);
        assert_eq!(kept.quantity_received, created.quantity_received);
        assert_eq!(kept.remarks, created.remarks);
    }

    #[tokio::test]
    async fn test_deleting_user_nulls_issue_and_adjustment_actors() {
        let db = fixtures::db().await;
        let (_, _, widget) = fixtures::catalog(&db).await;
        let clerk = fixtures::user(&db, "clerk").await;

        let issue = db
            .issues()
            .create(&NewStockIssue {
                product_id: widget.id.clone(),
                quantity_issued: Decimal::from_whole(3),
                date_issued: day(2),
                issued_by: Some(clerk.id.clone()),
                issued_to: "Workshop B".to_string(),
                remarks: None,
            })
            .await
            .unwrap();
        let adjustment = db
            .adjustments()
            .create(&NewStockAdjustment {
                product_id: widget.id.clone(),
                quantity_adjusted: Decimal::from_whole(-2),
                adjustment_reason: "Damaged".to_string(),
                date_adjusted: day(3),
                adjusted_by: Some(clerk.id.clone()),
                remarks: None,
            })
            .await
            .unwrap();

        db.users().delete(&clerk.id).await.unwrap();

        let issue = db.issues().get_by_id(&issue.id).await.unwrap().unwrap();
        assert_eq!(issue.issued_by, None);
        assert_eq!(issue.issued_to, "Workshop B");

        let adjustment = db
            .adjustments()
            .get_by_id(&adjustment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(adjustment.adjusted_by, None);
        assert!(adjustment.quantity_adjusted.is_negative());
    }

    #[tokio::test]
    async fn test_movements_do_not_touch_inventory() {
        let db = fixtures::db().await;
        let (_, _, widget) = fixtures::catalog(&db).await;
        let row = db
            .inventory()
            .create(&widget.id, Decimal::from_whole(10))
            .await
            .unwrap();

        db.receipts()
            .create(&receipt(&widget.id, None, day(4)))
            .await
            .unwrap();

        let stored = db.inventory().get_by_id(&row.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, Decimal::from_whole(10));
        assert_eq!(stored.last_updated, row.last_updated);
    }

    #[tokio::test]
    async fn test_list_for_product_newest_first() {
        let db = fixtures::db().await;
        let (_, _, widget) = fixtures::catalog(&db).await;
        let receipts = db.receipts();

        for d in [5, 20, 12] {
            receipts
                .create(&receipt(&widget.id, None, day(d)))
                .await
                .unwrap();
        }

        let dates: Vec<_> = receipts
            .list_for_product(&widget.id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.date_received)
            .collect();
        assert_eq!(dates, vec![day(20), day(12), day(5)]);
    }

    #[tokio::test]
    async fn test_issue_update_delete_and_label() {
        let db = fixtures::db().await;
        let (_, _, widget) = fixtures::catalog(&db).await;
        let issues = db.issues();

        let mut issue = issues
            .create(&NewStockIssue {
                product_id: widget.id.clone(),
                quantity_issued: Decimal::from_whole(1),
                date_issued: day(9),
                issued_by: None,
                issued_to: "Line 1".to_string(),
                remarks: None,
            })
            .await
            .unwrap();

        issue.issued_to = "Line 2".to_string();
        issue.remarks = Some("Re-routed".to_string());
        issues.update(&issue).await.unwrap();
        assert_eq!(issues.get_by_id(&issue.id).await.unwrap(), Some(issue.clone()));
        assert_eq!(
            issues.label(&issue.id).await.unwrap(),
            "Stock issue for Widget on 2024-06-09"
        );

        issue.issued_to = "   ".to_string();
        assert!(matches!(
            issues.update(&issue).await,
            Err(DbError::Validation(_))
        ));

        issues.delete(&issue.id).await.unwrap();
        assert!(matches!(
            issues.label(&issue.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_adjustment_update_and_lists() {
        let db = fixtures::db().await;
        let (_, _, widget) = fixtures::catalog(&db).await;
        let auditor = fixtures::user(&db, "auditor").await;
        let adjustments = db.adjustments();

        let mut adjustment = adjustments
            .create(&NewStockAdjustment {
                product_id: widget.id.clone(),
                quantity_adjusted: Decimal::from_hundredths(-150),
                adjustment_reason: "Stocktake".to_string(),
                date_adjusted: day(15),
                adjusted_by: Some(auditor.id.clone()),
                remarks: None,
            })
            .await
            .unwrap();

        adjustment.quantity_adjusted = Decimal::from_hundredths(75);
        adjustments.update(&adjustment).await.unwrap();

        let by_user = adjustments.list_by_user(&auditor.id).await.unwrap();
        assert_eq!(by_user, vec![adjustment.clone()]);
        assert_eq!(
            adjustments.list_for_product(&widget.id).await.unwrap()[0]
                .quantity_adjusted
                .to_string(),
            "0.75"
        );
        assert_eq!(
            adjustments.label(&adjustment.id).await.unwrap(),
            "Stock adjustment for Widget on 2024-06-15"
        );

        adjustments.delete(&adjustment.id).await.unwrap();
        assert!(adjustments.list_by_user(&auditor.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_references_rejected() {
        let db = fixtures::db().await;
        let (_, _, widget) = fixtures::catalog(&db).await;

        let err = db
            .receipts()
            .create(&receipt("no-such-product", None, day(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        let err = db
            .receipts()
            .create(&receipt(&widget.id, Some("no-such-user"), day(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_blank_required_text_is_constraint_violation() {
        let db = fixtures::db().await;
        let (_, _, widget) = fixtures::catalog(&db).await;

        let err = db
            .issues()
            .create(&NewStockIssue {
                product_id: widget.id.clone(),
                quantity_issued: Decimal::from_whole(1),
                date_issued: day(2),
                issued_by: None,
                issued_to: String::new(),
                remarks: None,
            })
            .await
            .unwrap_err();
        assert!(err.is_constraint_violation());

        let err = db
            .adjustments()
            .create(&NewStockAdjustment {
                product_id: widget.id.clone(),
                quantity_adjusted: Decimal::from_whole(-1),
                adjustment_reason: "   ".to_string(),
                date_adjusted: day(2),
                adjusted_by: None,
                remarks: None,
            })
            .await
            .unwrap_err();
        assert!(err.is_constraint_violation());

        assert!(db.issues().list_for_product(&widget.id).await.unwrap().is_empty());
    }
}
