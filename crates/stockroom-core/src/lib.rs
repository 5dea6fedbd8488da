//! # stockroom-core: Domain Model for Stockroom
//!
//! This crate holds the inventory-tracking domain model as plain types
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Web layer (out of tree)                            │   │
//! │  │    request handling, sessions, admin screens                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockroom-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  decimal  │  │  schema   │  │ validation│  │   │
//! │  │   │  User     │  │  Decimal  │  │  Table    │  │   rules   │  │   │
//! │  │   │  Product  │  │  10 / 2   │  │  FKs      │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 stockroom-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (User, Product, Inventory, stock movements, ...)
//! - [`decimal`] - Fixed-point decimal (10 digits, 2 fractional)
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation
//! - [`password`] - Password hashing for user accounts
//! - [`schema`] - Explicit description of tables and referential actions
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::Decimal;
//!
//! let price: Decimal = "10.99".parse().unwrap();
//! assert_eq!(price.hundredths(), 1099);
//! assert_eq!(price.to_string(), "10.99");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod decimal;
pub mod error;
pub mod password;
pub mod schema;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use decimal::Decimal;
pub use error::{CoreError, CoreResult, ValidationError};
pub use types::*;

// =============================================================================
// Field Limits
// =============================================================================

/// Maximum length of a username.
pub const MAX_USERNAME_LEN: usize = 150;

/// Maximum length of an email address.
pub const MAX_EMAIL_LEN: usize = 254;

/// Maximum length of first/last name.
pub const MAX_PERSON_NAME_LEN: usize = 150;

/// Maximum length of catalog names (category, unit, product) and free-text
/// single-line fields such as `issued_to` and `adjustment_reason`.
pub const MAX_NAME_LEN: usize = 255;

/// Maximum length of a unit abbreviation ("kg", "pcs", ...).
pub const MAX_ABBREVIATION_LEN: usize = 10;

/// Maximum length of a staff department.
pub const MAX_DEPARTMENT_LEN: usize = 50;

/// Maximum length of a customer address.
pub const MAX_ADDRESS_LEN: usize = 100;

/// Generates a new record ID (UUID v4).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
