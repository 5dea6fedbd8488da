//! # Schema Description
//!
//! The persisted schema, described as data: every table and every foreign
//! key together with its delete action.
//!
//! The migrations in `migrations/sqlite` create this schema; the database
//! layer checks a live database against [`FOREIGN_KEYS`] at startup. Nothing
//! registers itself anywhere: this list is the whole description.
//!
//! ## Referential Actions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  parent                  child.column                     on delete    │
//! │  ─────────────────────   ──────────────────────────────   ──────────   │
//! │  product_categories      products.category_id             CASCADE      │
//! │  units_of_measurement    products.unit_of_measurement_id  RESTRICT     │
//! │  products                inventory / stock_* .product_id  CASCADE      │
//! │  users                   stock_*.received_by/issued_by/   SET NULL     │
//! │                          adjusted_by                                    │
//! │  users                   *_users.user_id, user_types      CASCADE      │
//! │  staff/customer/admin    user_types.*_user_id             CASCADE      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

/// Every persisted table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Users,
    UserTypes,
    StaffUsers,
    CustomerUsers,
    AdminUsers,
    ProductCategories,
    UnitsOfMeasurement,
    Products,
    Inventory,
    StockReceipts,
    StockIssues,
    StockAdjustments,
}

impl Table {
    pub const ALL: [Table; 12] = [
        Table::Users,
        Table::UserTypes,
        Table::StaffUsers,
        Table::CustomerUsers,
        Table::AdminUsers,
        Table::ProductCategories,
        Table::UnitsOfMeasurement,
        Table::Products,
        Table::Inventory,
        Table::StockReceipts,
        Table::StockIssues,
        Table::StockAdjustments,
    ];

    /// SQL table name.
    pub const fn name(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::UserTypes => "user_types",
            Table::StaffUsers => "staff_users",
            Table::CustomerUsers => "customer_users",
            Table::AdminUsers => "admin_users",
            Table::ProductCategories => "product_categories",
            Table::UnitsOfMeasurement => "units_of_measurement",
            Table::Products => "products",
            Table::Inventory => "inventory",
            Table::StockReceipts => "stock_receipts",
            Table::StockIssues => "stock_issues",
            Table::StockAdjustments => "stock_adjustments",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What happens to a child row when its parent is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OnDelete {
    /// Child rows are deleted with the parent.
    Cascade,
    /// Deleting the parent fails while children exist.
    Restrict,
    /// The child's reference column is set to NULL.
    SetNull,
}

impl OnDelete {
    /// Spelling used by SQLite in `PRAGMA foreign_key_list`.
    pub const fn sql(&self) -> &'static str {
        match self {
            OnDelete::Cascade => "CASCADE",
            OnDelete::Restrict => "RESTRICT",
            OnDelete::SetNull => "SET NULL",
        }
    }
}

/// One foreign key: `table.column → references.id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForeignKey {
    pub table: Table,
    pub column: &'static str,
    pub references: Table,
    pub on_delete: OnDelete,
}

const fn fk(table: Table, column: &'static str, references: Table, on_delete: OnDelete) -> ForeignKey {
    ForeignKey {
        table,
        column,
        references,
        on_delete,
    }
}

/// Every foreign key in the schema. All of them reference the parent's `id`.
pub const FOREIGN_KEYS: [ForeignKey; 16] = [
    // User domain
    fk(Table::StaffUsers, "user_id", Table::Users, OnDelete::Cascade),
    fk(Table::CustomerUsers, "user_id", Table::Users, OnDelete::Cascade),
    fk(Table::AdminUsers, "user_id", Table::Users, OnDelete::Cascade),
    fk(Table::UserTypes, "user_id", Table::Users, OnDelete::Cascade),
    fk(Table::UserTypes, "staff_user_id", Table::StaffUsers, OnDelete::Cascade),
    fk(Table::UserTypes, "customer_user_id", Table::CustomerUsers, OnDelete::Cascade),
    fk(Table::UserTypes, "admin_user_id", Table::AdminUsers, OnDelete::Cascade),
    // Inventory domain
    fk(Table::Products, "category_id", Table::ProductCategories, OnDelete::Cascade),
    fk(Table::Products, "unit_of_measurement_id", Table::UnitsOfMeasurement, OnDelete::Restrict),
    fk(Table::Inventory, "product_id", Table::Products, OnDelete::Cascade),
    fk(Table::StockReceipts, "product_id", Table::Products, OnDelete::Cascade),
    fk(Table::StockReceipts, "received_by", Table::Users, OnDelete::SetNull),
    fk(Table::StockIssues, "product_id", Table::Products, OnDelete::Cascade),
    fk(Table::StockIssues, "issued_by", Table::Users, OnDelete::SetNull),
    fk(Table::StockAdjustments, "product_id", Table::Products, OnDelete::Cascade),
    fk(Table::StockAdjustments, "adjusted_by", Table::Users, OnDelete::SetNull),
];

/// Foreign keys declared on `table`.
pub fn foreign_keys_of(table: Table) -> impl Iterator<Item = &'static ForeignKey> {
    FOREIGN_KEYS.iter().filter(move |fk| fk.table == table)
}

/// Foreign keys pointing at `table`.
pub fn referencing(table: Table) -> impl Iterator<Item = &'static ForeignKey> {
    FOREIGN_KEYS.iter().filter(move |fk| fk.references == table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_names_are_unique() {
        let names: HashSet<_> = Table::ALL.iter().map(Table::name).collect();
        assert_eq!(names.len(), Table::ALL.len());
    }

    #[test]
    fn test_unit_of_measurement_is_only_restricted_parent() {
        let restricted: Vec<_> = FOREIGN_KEYS
            .iter()
            .filter(|fk| fk.on_delete == OnDelete::Restrict)
            .collect();
        assert_eq!(restricted.len(), 1);
        assert_eq!(restricted[0].references, Table::UnitsOfMeasurement);
    }

    #[test]
    fn test_user_references_on_movements_set_null() {
        let movement_tables = [
            Table::StockReceipts,
            Table::StockIssues,
            Table::StockAdjustments,
        ];
        let set_null: Vec<_> = referencing(Table::Users)
            .filter(|fk| movement_tables.contains(&fk.table))
            .collect();
        assert_eq!(set_null.len(), 3);
        assert!(set_null.iter().all(|fk| fk.on_delete == OnDelete::SetNull));
    }

    #[test]
    fn test_product_children_cascade() {
        let children: Vec<_> = referencing(Table::Products).collect();
        assert_eq!(children.len(), 4);
        assert!(children.iter().all(|fk| fk.on_delete == OnDelete::Cascade));
        assert_eq!(foreign_keys_of(Table::Products).count(), 2);
    }
}
