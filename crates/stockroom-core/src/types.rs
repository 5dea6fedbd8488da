//! # Domain Types
//!
//! Core domain records used throughout Stockroom.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         User Domain                                     │
//! │                                                                         │
//! │  ┌─────────────────┐    1:1   ┌─────────────────┐                      │
//! │  │      User       │─────────►│ StaffUser       │ department           │
//! │  │  ─────────────  │─────────►│ CustomerUser    │ address              │
//! │  │  username (uq)  │─────────►│ AdminUser       │                      │
//! │  │  email (uq)     │          └────────▲────────┘                      │
//! │  │  password_hash  │   1:N    ┌────────┴────────┐                      │
//! │  │  flags          │─────────►│ UserType        │ RoleRef (tagged)     │
//! │  └─────────────────┘          └─────────────────┘                      │
//! │                                                                         │
//! │                         Inventory Domain                                │
//! │                                                                         │
//! │  ProductCategory ──cascade──► Product ◄──protect── UnitOfMeasurement   │
//! │                                  │                                      │
//! │                   ┌──────────────┼──────────────┬──────────────┐       │
//! │                   ▼ cascade      ▼              ▼              ▼       │
//! │              Inventory     StockReceipt    StockIssue   StockAdjustment │
//! │                            (acting user: set-null on user delete)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every record has an `id`: UUID v4 string, immutable, used for relations.
//! `New*` structs are the insert payloads; the repository assigns the id.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::decimal::Decimal;
use crate::error::CoreError;

// =============================================================================
// User
// =============================================================================

/// A user account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Login name, unique across all users.
    pub username: String,

    /// Email address, unique across all users.
    pub email: String,

    /// Argon2 PHC string. Never serialized.
    #[serde(skip)]
    #[ts(skip)]
    pub password_hash: String,

    pub first_name: String,
    pub last_name: String,

    /// Whether the account may log in.
    pub is_active: bool,

    /// Whether the account may access the admin site.
    pub is_staff: bool,

    /// Whether the account has every permission.
    pub is_superuser: bool,

    #[ts(as = "String")]
    pub date_joined: DateTime<Utc>,

    #[ts(as = "Option<String>")]
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Returns "first last", trimmed; empty when neither is set.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}

/// Payload for creating a user. The plaintext password is hashed by the
/// repository and never stored.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

// =============================================================================
// User Roles
// =============================================================================

/// Discriminant of a role extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Staff,
    Customer,
    Admin,
}

impl UserRole {
    pub const ALL: [UserRole; 3] = [UserRole::Staff, UserRole::Customer, UserRole::Admin];

    /// Value stored in the `role` column.
    pub const fn as_str(&self) -> &'static str {
        match self {
            UserRole::Staff => "staff",
            UserRole::Customer => "customer",
            UserRole::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "staff" => Ok(UserRole::Staff),
            "customer" => Ok(UserRole::Customer),
            "admin" => Ok(UserRole::Admin),
            other => Err(CoreError::InvalidRole(other.to_string())),
        }
    }
}

/// Staff extension of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StaffUser {
    pub id: String,
    pub user_id: String,
    pub department: String,
}

/// Customer extension of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CustomerUser {
    pub id: String,
    pub user_id: String,
    pub address: String,
}

/// Admin extension of a user. Carries no fields of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct AdminUser {
    pub id: String,
    pub user_id: String,
}

/// Typed reference to one role-extension record.
///
/// Serialized as `{"role": "staff", "id": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "role", content = "id", rename_all = "snake_case")]
pub enum RoleRef {
    Staff(String),
    Customer(String),
    Admin(String),
}

impl RoleRef {
    pub fn role(&self) -> UserRole {
        match self {
            RoleRef::Staff(_) => UserRole::Staff,
            RoleRef::Customer(_) => UserRole::Customer,
            RoleRef::Admin(_) => UserRole::Admin,
        }
    }

    /// ID of the referenced extension record.
    pub fn id(&self) -> &str {
        match self {
            RoleRef::Staff(id) | RoleRef::Customer(id) | RoleRef::Admin(id) => id,
        }
    }
}

impl From<&StaffUser> for RoleRef {
    fn from(staff: &StaffUser) -> Self {
        RoleRef::Staff(staff.id.clone())
    }
}

impl From<&CustomerUser> for RoleRef {
    fn from(customer: &CustomerUser) -> Self {
        RoleRef::Customer(customer.id.clone())
    }
}

impl From<&AdminUser> for RoleRef {
    fn from(admin: &AdminUser) -> Self {
        RoleRef::Admin(admin.id.clone())
    }
}

/// Link between a user and one of its role records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserType {
    pub id: String,
    pub user_id: String,
    pub role: RoleRef,
}

// =============================================================================
// Reference Data
// =============================================================================

/// A category of products (electronics, furniture, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductCategory {
    pub id: String,
    /// Unique across categories.
    pub name: String,
    pub description: String,
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A unit of measurement (piece, box, kg, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct UnitOfMeasurement {
    pub id: String,
    /// Unique across units.
    pub name: String,
    /// Unique across units, at most 10 characters.
    pub abbreviation: String,
}

impl fmt::Display for UnitOfMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Deleting the category deletes this product.
    pub category_id: String,
    /// The unit cannot be deleted while this product exists.
    pub unit_of_measurement_id: String,
    pub unit_price: Decimal,
    pub reorder_level: Decimal,
    pub reorder_quantity: Decimal,
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Payload for creating a product.
///
/// Category and unit are optional here so that a payload missing either can
/// be represented; the `NOT NULL` columns reject it on insert.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category_id: Option<String>,
    pub unit_of_measurement_id: Option<String>,
    pub unit_price: Decimal,
    pub reorder_level: Decimal,
    pub reorder_quantity: Decimal,
}

// =============================================================================
// Inventory
// =============================================================================

/// Current stock of a product.
///
/// Nothing ties one row to one product: a product may have several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Inventory {
    pub id: String,
    pub product_id: String,
    pub quantity: Decimal,
    /// Rewritten by the repository on every insert and update.
    #[ts(as = "String")]
    pub last_updated: DateTime<Utc>,
}

impl Inventory {
    /// `"Widget - 12.50 kg"`
    pub fn label(&self, product: &Product, unit: &UnitOfMeasurement) -> String {
        format!("{} - {} {}", product.name, self.quantity, unit.abbreviation)
    }
}

// =============================================================================
// Stock Movements
// =============================================================================

/// Receipt of new stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockReceipt {
    pub id: String,
    pub product_id: String,
    pub quantity_received: Decimal,
    #[ts(as = "String")]
    pub date_received: NaiveDate,
    /// Nulled when the user is deleted.
    pub received_by: Option<String>,
    pub remarks: Option<String>,
}

impl StockReceipt {
    /// `"Stock receipt for Widget on 2024-06-30"`
    pub fn label(&self, product_name: &str) -> String {
        format!(
            "Stock receipt for {} on {}",
            product_name,
            self.date_received.format("%Y-%m-%d")
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewStockReceipt {
    pub product_id: String,
    pub quantity_received: Decimal,
    #[ts(as = "String")]
    pub date_received: NaiveDate,
    pub received_by: Option<String>,
    pub remarks: Option<String>,
}

/// Issue of stock out of the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockIssue {
    pub id: String,
    pub product_id: String,
    pub quantity_issued: Decimal,
    #[ts(as = "String")]
    pub date_issued: NaiveDate,
    /// Nulled when the user is deleted.
    pub issued_by: Option<String>,
    /// Free text: who or what received the stock.
    pub issued_to: String,
    pub remarks: Option<String>,
}

impl StockIssue {
    /// `"Stock issue for Widget on 2024-06-30"`
    pub fn label(&self, product_name: &str) -> String {
        format!(
            "Stock issue for {} on {}",
            product_name,
            self.date_issued.format("%Y-%m-%d")
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewStockIssue {
    pub product_id: String,
    pub quantity_issued: Decimal,
    #[ts(as = "String")]
    pub date_issued: NaiveDate,
    pub issued_by: Option<String>,
    pub issued_to: String,
    pub remarks: Option<String>,
}

/// Correction of stock (stocktake, damage, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockAdjustment {
    pub id: String,
    pub product_id: String,
    /// May be negative.
    pub quantity_adjusted: Decimal,
    pub adjustment_reason: String,
    #[ts(as = "String")]
    pub date_adjusted: NaiveDate,
    /// Nulled when the user is deleted.
    pub adjusted_by: Option<String>,
    pub remarks: Option<String>,
}

impl StockAdjustment {
    /// `"Stock adjustment for Widget on 2024-06-30"`
    pub fn label(&self, product_name: &str) -> String {
        format!(
            "Stock adjustment for {} on {}",
            product_name,
            self.date_adjusted.format("%Y-%m-%d")
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewStockAdjustment {
    pub product_id: String,
    pub quantity_adjusted: Decimal,
    pub adjustment_reason: String,
    #[ts(as = "String")]
    pub date_adjusted: NaiveDate,
    pub adjusted_by: Option<String>,
    pub remarks: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> Product {
        Product {
            id: "p1".to_string(),
            name: "Widget".to_string(),
            description: String::new(),
            category_id: "c1".to_string(),
            unit_of_measurement_id: "u1".to_string(),
            unit_price: Decimal::from_hundredths(1999),
            reorder_level: Decimal::from_whole(10),
            reorder_quantity: Decimal::from_whole(50),
        }
    }

    #[test]
    fn test_user_role_round_trips_through_str() {
        for role in UserRole::ALL {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
        assert!(matches!(
            "owner".parse::<UserRole>(),
            Err(CoreError::InvalidRole(r)) if r == "owner"
        ));
    }

    #[test]
    fn test_role_ref_accessors() {
        let staff = StaffUser {
            id: "s1".to_string(),
            user_id: "u1".to_string(),
            department: "Warehouse".to_string(),
        };
        let role = RoleRef::from(&staff);
        assert_eq!(role.role(), UserRole::Staff);
        assert_eq!(role.id(), "s1");
    }

    #[test]
    fn test_role_ref_json_shape() {
        let json = serde_json::to_value(RoleRef::Customer("c9".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({"role": "customer", "id": "c9"}));
    }

    #[test]
    fn test_user_json_omits_password_hash() {
        let user = User {
            id: "u1".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            first_name: "Alice".to_string(),
            last_name: String::new(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            date_joined: Utc::now(),
            last_login: None,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert_eq!(user.to_string(), "alice");
        assert_eq!(user.full_name(), "Alice");
    }

    #[test]
    fn test_inventory_label() {
        let unit = UnitOfMeasurement {
            id: "u1".to_string(),
            name: "Kilogram".to_string(),
            abbreviation: "kg".to_string(),
        };
        let inventory = Inventory {
            id: "i1".to_string(),
            product_id: "p1".to_string(),
            quantity: Decimal::from_hundredths(1250),
            last_updated: Utc::now(),
        };
        assert_eq!(inventory.label(&widget(), &unit), "Widget - 12.50 kg");
    }

    #[test]
    fn test_movement_labels() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let receipt = StockReceipt {
            id: "r1".to_string(),
            product_id: "p1".to_string(),
            quantity_received: Decimal::from_whole(5),
            date_received: date,
            received_by: None,
            remarks: None,
        };
        assert_eq!(
            receipt.label(&widget().name),
            "Stock receipt for Widget on 2024-06-30"
        );

        let adjustment = StockAdjustment {
            id: "a1".to_string(),
            product_id: "p1".to_string(),
            quantity_adjusted: Decimal::from_whole(-2),
            adjustment_reason: "Damaged".to_string(),
            date_adjusted: date,
            adjusted_by: None,
            remarks: Some("Dropped pallet".to_string()),
        };
        assert_eq!(
            adjustment.label("Widget"),
            "Stock adjustment for Widget on 2024-06-30"
        );
    }
}
