//! # Validation Module
//!
//! Field validators used by entity drafts and patches.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Command DTO (panel)                                           │
//! │  └── Parsing: price strings → Money, ids present                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Entity (THIS MODULE)                                          │
//! │  └── Every record is validated after a draft or a merged patch          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Store                                                         │
//! │  ├── Reference checks (customer/sale/product exist)                     │
//! │  └── CHECK constraints (quantity >= 0, price >= 0)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::MAX_NAME_LENGTH;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (customer, category, product).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most `MAX_NAME_LENGTH` characters
///
/// ## Example
/// ```rust
/// use emporium_core::validation::validate_name;
///
/// assert!(validate_name("name", "Café 500g").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required(field));
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Validates an email address.
///
/// Deliberately shallow: one `@`, a non-empty local part, a domain with a
/// dot that neither starts nor ends the domain, and no whitespace.
///
/// ## Example
/// ```rust
/// use emporium_core::validation::validate_email;
///
/// assert!(validate_email("ana@example.com").is_ok());
/// assert!(validate_email("ana@example").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let invalid = || ValidationError::invalid("email", "must look like name@domain.tld");

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    let dot_inside = domain
        .find('.')
        .is_some_and(|i| i > 0 && !domain.ends_with('.'));
    if !dot_inside {
        return Err(invalid());
    }

    Ok(())
}

/// Validates a category colour as `#RGB` or `#RRGGBB`.
pub fn validate_color(color: &str) -> ValidationResult<()> {
    let hex = color
        .strip_prefix('#')
        .ok_or_else(|| ValidationError::invalid("color", "must start with '#'"))?;

    if !matches!(hex.len(), 3 | 6) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::invalid("color", "must be #RGB or #RRGGBB"));
    }

    Ok(())
}

/// Trims a free-text search query. Empty means "no filter".
pub fn normalize_search(query: &str) -> Option<String> {
    let query = query.trim();
    if query.is_empty() {
        None
    } else {
        Some(query.to_lowercase())
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Largest accepted amount: 10 billion in major units.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_000;

/// Largest accepted quantity on one sale line.
///
/// `MAX_AMOUNT_CENTS * MAX_LINE_QUANTITY` still fits in an `i64`.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;

/// Validates a monetary amount in cents (price, total, unit price).
///
/// Zero is allowed (free items, empty sales).
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    if cents > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        });
    }

    Ok(())
}

/// Validates a stock quantity. Zero is a valid "out of stock" state.
///
/// ## Example
/// ```rust
/// use emporium_core::validation::validate_stock_quantity;
///
/// assert!(validate_stock_quantity(0).is_ok());
/// assert!(validate_stock_quantity(-1).is_err());
/// ```
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::Negative {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a quantity on a sale line. Must be strictly positive.
pub fn validate_line_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates that a reference field holds a UUID.
///
/// ## Example
/// ```rust
/// use emporium_core::validation::validate_uuid;
///
/// assert!(validate_uuid("customer_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("customer_id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::required(field));
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::invalid(field, "must be a valid UUID"))?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
