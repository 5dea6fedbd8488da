//! # Role Repository
//!
//! Staff, customer and admin extensions of a user, and the typed
//! `user_types` links pointing at them.
//!
//! ## Storage of a Link
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  user_types                                                            │
//! │  ┌──────┬─────────┬──────────┬───────────────┬──────────────────┬─────┐│
//! │  │ id   │ user_id │ role     │ staff_user_id │ customer_user_id │ ... ││
//! │  ├──────┼─────────┼──────────┼───────────────┼──────────────────┼─────┤│
//! │  │ t1   │ u1      │ staff    │ s1            │ NULL             │NULL ││
//! │  │ t2   │ u1      │ customer │ NULL          │ c7               │NULL ││
//! │  └──────┴─────────┴──────────┴───────────────┴──────────────────┴─────┘│
//! │                                                                         │
//! │  CHECK: exactly one target column is set, the one `role` names.        │
//! │  Each target column is a real FK, so deleting the extension row        │
//! │  deletes its links.                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use stockroom_core::validation::{validate_address, validate_department};
use stockroom_core::{
    new_id, AdminUser, CustomerUser, RoleRef, StaffUser, UserRole, UserType,
};
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Raw `user_types` row.
#[derive(Debug, sqlx::FromRow)]
struct UserTypeRow {
    id: String,
    user_id: String,
    role: UserRole,
    staff_user_id: Option<String>,
    customer_user_id: Option<String>,
    admin_user_id: Option<String>,
}

impl TryFrom<UserTypeRow> for UserType {
    type Error = DbError;

    fn try_from(row: UserTypeRow) -> Result<Self, Self::Error> {
        let role = match row.role {
            UserRole::Staff => row.staff_user_id.map(RoleRef::Staff),
            UserRole::Customer => row.customer_user_id.map(RoleRef::Customer),
            UserRole::Admin => row.admin_user_id.map(RoleRef::Admin),
        };

        let role = role.ok_or_else(|| {
            DbError::Internal(format!(
                "user_types row {} has no target for role '{}'",
                row.id,
                row.role.as_str()
            ))
        })?;

        Ok(UserType {
            id: row.id,
            user_id: row.user_id,
            role,
        })
    }
}

/// Target column for each role.
fn target_column(role: UserRole) -> &'static str {
    match role {
        UserRole::Staff => "staff_user_id",
        UserRole::Customer => "customer_user_id",
        UserRole::Admin => "admin_user_id",
    }
}

/// Repository for role extensions and user-type links.
#[derive(Debug, Clone)]
pub struct RoleRepository {
    pool: SqlitePool,
}

impl RoleRepository {
    /// Creates a new RoleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RoleRepository { pool }
    }

    // =========================================================================
    // Extensions
    // =========================================================================

    /// Makes `user_id` a staff member.
    ///
    /// A user holds at most one staff extension; a second fails with
    /// `DbError::UniqueViolation`.
    pub async fn add_staff(&self, user_id: &str, department: &str) -> DbResult<StaffUser> {
        validate_department(department)?;

        let staff = StaffUser {
            id: new_id(),
            user_id: user_id.to_string(),
            department: department.to_string(),
        };

        debug!(user_id = %user_id, department = %department, "Adding staff extension");

        sqlx::query("INSERT INTO staff_users (id, user_id, department) VALUES (?1, ?2, ?3)")
            .bind(&staff.id)
            .bind(&staff.user_id)
            .bind(&staff.department)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from(e).with_value(user_id))?;

        Ok(staff)
    }

    pub async fn add_customer(&self, user_id: &str, address: &str) -> DbResult<CustomerUser> {
        validate_address(address)?;

        let customer = CustomerUser {
            id: new_id(),
            user_id: user_id.to_string(),
            address: address.to_string(),
        };

        debug!(user_id = %user_id, "Adding customer extension");

        sqlx::query("INSERT INTO customer_users (id, user_id, address) VALUES (?1, ?2, ?3)")
            .bind(&customer.id)
            .bind(&customer.user_id)
            .bind(&customer.address)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from(e).with_value(user_id))?;

        Ok(customer)
    }

    pub async fn add_admin(&self, user_id: &str) -> DbResult<AdminUser> {
        let admin = AdminUser {
            id: new_id(),
            user_id: user_id.to_string(),
        };

        debug!(user_id = %user_id, "Adding admin extension");

        sqlx::query("INSERT INTO admin_users (id, user_id) VALUES (?1, ?2)")
            .bind(&admin.id)
            .bind(&admin.user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from(e).with_value(user_id))?;

        Ok(admin)
    }

    pub async fn staff_for_user(&self, user_id: &str) -> DbResult<Option<StaffUser>> {
        let staff = sqlx::query_as::<_, StaffUser>(
            "SELECT id, user_id, department FROM staff_users WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(staff)
    }

    pub async fn customer_for_user(&self, user_id: &str) -> DbResult<Option<CustomerUser>> {
        let customer = sqlx::query_as::<_, CustomerUser>(
            "SELECT id, user_id, address FROM customer_users WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    pub async fn admin_for_user(&self, user_id: &str) -> DbResult<Option<AdminUser>> {
        let admin =
            sqlx::query_as::<_, AdminUser>("SELECT id, user_id FROM admin_users WHERE user_id = ?1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(admin)
    }

    /// Updates the department. The owning user cannot change.
    pub async fn update_staff(&self, staff: &StaffUser) -> DbResult<()> {
        validate_department(&staff.department)?;

        let result = sqlx::query("UPDATE staff_users SET department = ?2 WHERE id = ?1")
            .bind(&staff.id)
            .bind(&staff.department)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("StaffUser", &staff.id));
        }

        Ok(())
    }

    /// Updates the address. The owning user cannot change.
    pub async fn update_customer(&self, customer: &CustomerUser) -> DbResult<()> {
        validate_address(&customer.address)?;

        let result = sqlx::query("UPDATE customer_users SET address = ?2 WHERE id = ?1")
            .bind(&customer.id)
            .bind(&customer.address)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("CustomerUser", &customer.id));
        }

        Ok(())
    }

    /// Deletes a staff extension and every link to it.
    pub async fn remove_staff(&self, id: &str) -> DbResult<()> {
        self.remove("staff_users", "StaffUser", id).await
    }

    /// Deletes a customer extension and every link to it.
    pub async fn remove_customer(&self, id: &str) -> DbResult<()> {
        self.remove("customer_users", "CustomerUser", id).await
    }

    /// Deletes an admin extension and every link to it.
    pub async fn remove_admin(&self, id: &str) -> DbResult<()> {
        self.remove("admin_users", "AdminUser", id).await
    }

    async fn remove(&self, table: &'static str, entity: &str, id: &str) -> DbResult<()> {
        debug!(table = table, id = %id, "Removing role extension");

        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = ?1"))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(entity, id));
        }

        Ok(())
    }

    /// Roles `user_id` currently holds an extension for, in
    /// staff/customer/admin order.
    pub async fn roles_for_user(&self, user_id: &str) -> DbResult<Vec<UserRole>> {
        let roles: Vec<UserRole> = sqlx::query_scalar(
            r#"
            SELECT 'staff' FROM staff_users WHERE user_id = ?1
            UNION ALL
            SELECT 'customer' FROM customer_users WHERE user_id = ?1
            UNION ALL
            SELECT 'admin' FROM admin_users WHERE user_id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    // =========================================================================
    // User-type links
    // =========================================================================

    /// Links a user to one role record.
    ///
    /// ## Errors
    /// * `DbError::ForeignKeyViolation` - user or role record does not exist
    pub async fn link(&self, user_id: &str, role: &RoleRef) -> DbResult<UserType> {
        let link = UserType {
            id: new_id(),
            user_id: user_id.to_string(),
            role: role.clone(),
        };

        debug!(user_id = %user_id, role = %role.role(), target = %role.id(), "Linking user type");

        sqlx::query(&format!(
            "INSERT INTO user_types (id, user_id, role, {}) VALUES (?1, ?2, ?3, ?4)",
            target_column(role.role())
        ))
        .bind(&link.id)
        .bind(&link.user_id)
        .bind(role.role())
        .bind(role.id())
        .execute(&self.pool)
        .await?;

        Ok(link)
    }

    /// All links of a user.
    pub async fn links_for_user(&self, user_id: &str) -> DbResult<Vec<UserType>> {
        let rows = sqlx::query_as::<_, UserTypeRow>(
            r#"
            SELECT id, user_id, role, staff_user_id, customer_user_id, admin_user_id
            FROM user_types
            WHERE user_id = ?1
            ORDER BY role, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UserType::try_from).collect()
    }

    pub async fn unlink(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM user_types WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("UserType", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
