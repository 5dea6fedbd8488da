//! # Repository Module
//!
//! Database repository implementations for Stockroom.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Caller                                                                 │
//! │       │  db.inventory().save(&row)                                      │
//! │       ▼                                                                 │
//! │  InventoryRepository                                                   │
//! │  ├── validates with stockroom_core::validation                         │
//! │  ├── assigns ids and timestamps                                        │
//! │  └── runs SQL; SQLite enforces UNIQUE / FK / NOT NULL / CHECK          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`UserRepository`](user::UserRepository) - Accounts and passwords
//! - [`RoleRepository`](role::RoleRepository) - Staff/customer/admin extensions and user-type links
//! - [`CategoryRepository`](category::CategoryRepository) - Product categories
//! - [`UnitRepository`](unit::UnitRepository) - Units of measurement
//! - [`ProductRepository`](product::ProductRepository) - Catalog CRUD and search
//! - [`InventoryRepository`](inventory::InventoryRepository) - Stock levels
//! - [`movement`] - Receipt, issue and adjustment logs

pub mod category;
pub mod inventory;
pub mod movement;
pub mod product;
pub mod role;
pub mod unit;
pub mod user;
