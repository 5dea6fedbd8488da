//! # Validation Module
//!
//! Field validation for Stockroom records.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE (called by repositories before each write)       │
//! │  ├── Required fields, maximum lengths                                  │
//! │  ├── Email shape                                                        │
//! │  └── NUMERIC(10, 2) range                                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints (email, username, category/unit names)         │
//! │  └── Foreign keys with CASCADE / RESTRICT / SET NULL                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Uniqueness and referential integrity are left to the database.

use crate::decimal::Decimal;
use crate::error::ValidationError;
use crate::types::{
    NewProduct, NewStockAdjustment, NewStockIssue, NewStockReceipt, NewUser, Product,
    StockAdjustment, StockIssue, StockReceipt, User,
};
use crate::{
    MAX_ABBREVIATION_LEN, MAX_ADDRESS_LEN, MAX_DEPARTMENT_LEN, MAX_EMAIL_LEN, MAX_NAME_LEN,
    MAX_PERSON_NAME_LEN, MAX_USERNAME_LEN,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required single-line field: non-blank and at most `max`
/// characters.
///
/// ```rust
/// use stockroom_core::validation::validate_required;
///
/// assert!(validate_required("name", "Kilogram", 255).is_ok());
/// assert!(validate_required("name", "   ", 255).is_err());
/// assert!(validate_required("abbreviation", "kilograms!!", 10).is_err());
/// ```
pub fn validate_required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    validate_max_len(field, value, max)
}

/// Validates only the length of a field that may be empty.
pub fn validate_max_len(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a username.
///
/// ## Rules
/// - Required, at most 150 characters
/// - Letters, digits and `@ . + - _` only
pub fn validate_username(username: &str) -> ValidationResult<()> {
    validate_required("username", username, MAX_USERNAME_LEN)?;

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "may contain only letters, numbers, and @/./+/-/_".to_string(),
        });
    }

    Ok(())
}

/// Validates an email address.
///
/// ## Rules
/// - Required, at most 254 characters
/// - Exactly one `@` and a non-empty local part
/// - A domain containing a dot that does not start or end with one, or the
///   bare host `localhost`
///
/// ```rust
/// use stockroom_core::validation::validate_email;
///
/// assert!(validate_email("alice@example.com").is_ok());
/// assert!(validate_email("alice@localhost").is_ok());
/// assert!(validate_email("alice@intranet").is_err());
/// assert!(validate_email("alice.example.com").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    validate_required("email", email, MAX_EMAIL_LEN)?;

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain whitespace"));
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| invalid("missing '@'"))?;

    if local.is_empty() {
        return Err(invalid("missing local part"));
    }
    if domain.contains('@') {
        return Err(invalid("more than one '@'"));
    }
    if domain.eq_ignore_ascii_case("localhost") {
        return Ok(());
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid("domain must contain a dot"));
    }

    Ok(())
}

/// Validates a plaintext password before hashing.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates that a decimal fits NUMERIC(10, 2).
#[inline]
pub fn validate_decimal(field: &str, value: Decimal) -> ValidationResult<()> {
    value.check_precision(field)
}

// =============================================================================
// Record Validators
// =============================================================================

pub fn validate_new_user(user: &NewUser) -> ValidationResult<()> {
    validate_username(&user.username)?;
    validate_email(&user.email)?;
    validate_password(&user.password)?;
    validate_max_len("first_name", &user.first_name, MAX_PERSON_NAME_LEN)?;
    validate_max_len("last_name", &user.last_name, MAX_PERSON_NAME_LEN)
}

pub fn validate_user(user: &User) -> ValidationResult<()> {
    validate_username(&user.username)?;
    validate_email(&user.email)?;
    validate_max_len("first_name", &user.first_name, MAX_PERSON_NAME_LEN)?;
    validate_max_len("last_name", &user.last_name, MAX_PERSON_NAME_LEN)
}

pub fn validate_department(department: &str) -> ValidationResult<()> {
    validate_required("department", department, MAX_DEPARTMENT_LEN)
}

pub fn validate_address(address: &str) -> ValidationResult<()> {
    validate_required("address", address, MAX_ADDRESS_LEN)
}

pub fn validate_category(name: &str) -> ValidationResult<()> {
    validate_required("name", name, MAX_NAME_LEN)
}

pub fn validate_unit(name: &str, abbreviation: &str) -> ValidationResult<()> {
    validate_required("name", name, MAX_NAME_LEN)?;
    validate_required("abbreviation", abbreviation, MAX_ABBREVIATION_LEN)
}

/// Validates the scalar fields of a product payload.
///
/// Missing category or unit is not checked here; the `NOT NULL` foreign-key
/// columns reject it.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_product_fields(
        &product.name,
        product.unit_price,
        product.reorder_level,
        product.reorder_quantity,
    )
}

pub fn validate_product(product: &Product) -> ValidationResult<()> {
    validate_product_fields(
        &product.name,
        product.unit_price,
        product.reorder_level,
        product.reorder_quantity,
    )
}

fn validate_product_fields(
    name: &str,
    unit_price: Decimal,
    reorder_level: Decimal,
    reorder_quantity: Decimal,
) -> ValidationResult<()> {
    validate_required("name", name, MAX_NAME_LEN)?;
    validate_decimal("unit_price", unit_price)?;
    validate_decimal("reorder_level", reorder_level)?;
    validate_decimal("reorder_quantity", reorder_quantity)
}

pub fn validate_quantity(quantity: Decimal) -> ValidationResult<()> {
    validate_decimal("quantity", quantity)
}

pub fn validate_new_receipt(receipt: &NewStockReceipt) -> ValidationResult<()> {
    validate_decimal("quantity_received", receipt.quantity_received)
}

pub fn validate_receipt(receipt: &StockReceipt) -> ValidationResult<()> {
    validate_decimal("quantity_received", receipt.quantity_received)
}

pub fn validate_new_issue(issue: &NewStockIssue) -> ValidationResult<()> {
    validate_decimal("quantity_issued", issue.quantity_issued)?;
    validate_required("issued_to", &issue.issued_to, MAX_NAME_LEN)
}

pub fn validate_issue(issue: &StockIssue) -> ValidationResult<()> {
    validate_decimal("quantity_issued", issue.quantity_issued)?;
    validate_required("issued_to", &issue.issued_to, MAX_NAME_LEN)
}

pub fn validate_new_adjustment(adjustment: &NewStockAdjustment) -> ValidationResult<()> {
    validate_decimal("quantity_adjusted", adjustment.quantity_adjusted)?;
    validate_required(
        "adjustment_reason",
        &adjustment.adjustment_reason,
        MAX_NAME_LEN,
    )
}

pub fn validate_adjustment(adjustment: &StockAdjustment) -> ValidationResult<()> {
    validate_decimal("quantity_adjusted", adjustment.quantity_adjusted)?;
    validate_required(
        "adjustment_reason",
        &adjustment.adjustment_reason,
        MAX_NAME_LEN,
    )
}

// =============================================================================
// Unit Tests
// =============================================================================
