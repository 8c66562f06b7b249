//! Validation utilities for ledger requests
//!
//! Every write request is checked here before a transaction is opened. A
//! failing line rejects the whole request.

use std::borrow::Cow;

use rust_decimal::Decimal;
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::ledger::{MAX_AMOUNT, MAX_QUANTITY, MONEY_SCALE, QUANTITY_SCALE};

/// First validation failure of a request, addressed by field path
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Request-level validation run before any database work
pub trait ValidateRequest {
    fn validate_request(&self) -> Result<(), FieldError>;
}

// ============================================================================
// Quantity and amount rules
// ============================================================================

fn fits_scale(value: Decimal, scale: u32) -> bool {
    value.normalize().scale() <= scale
}

fn quantity_fits_column(quantity: Decimal) -> Result<(), &'static str> {
    if !fits_scale(quantity, QUANTITY_SCALE) {
        return Err("Quantity allows at most 4 decimal places");
    }
    if quantity > MAX_QUANTITY {
        return Err("Quantity is too large");
    }
    Ok(())
}

/// Quantities moved by a ledger event must be strictly positive
pub fn validate_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be greater than zero");
    }
    quantity_fits_column(quantity)
}

/// Produced amounts may be zero but never negative
pub fn validate_produced_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Amount cannot be negative");
    }
    quantity_fits_column(amount)
}

/// Monetary amounts may be zero but never negative
pub fn validate_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Amount cannot be negative");
    }
    if !fits_scale(amount, MONEY_SCALE) {
        return Err("Amount allows at most 2 decimal places");
    }
    if amount > MAX_AMOUNT {
        return Err("Amount is too large");
    }
    Ok(())
}

/// Document numbers (stock-out and return numbers)
pub fn validate_document_number(number: &str) -> Result<(), &'static str> {
    let trimmed = number.trim();
    if trimmed.is_empty() {
        return Err("Document number cannot be blank");
    }
    if trimmed.len() > 100 {
        return Err("Document number must be at most 100 characters");
    }
    Ok(())
}

fn into_validation_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// `validator` hook for [`validate_quantity`]
pub fn positive_quantity(quantity: &Decimal) -> Result<(), ValidationError> {
    validate_quantity(*quantity).map_err(|m| into_validation_error("positive_quantity", m))
}

/// `validator` hook for [`validate_produced_amount`]
pub fn non_negative_quantity(amount: &Decimal) -> Result<(), ValidationError> {
    validate_produced_amount(*amount)
        .map_err(|m| into_validation_error("non_negative_quantity", m))
}

/// `validator` hook for [`validate_amount`]
pub fn non_negative_amount(amount: &Decimal) -> Result<(), ValidationError> {
    validate_amount(*amount).map_err(|m| into_validation_error("non_negative_amount", m))
}

/// `validator` hook for [`validate_document_number`]
pub fn document_number(number: &str) -> Result<(), ValidationError> {
    validate_document_number(number).map_err(|m| into_validation_error("document_number", m))
}

// ============================================================================
// Mapping `validator` output
// ============================================================================

fn first_field_error(errors: &ValidationErrors) -> Option<(String, String)> {
    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.keys().copied().collect();
    fields.sort_unstable();

    let field = fields.first()?;
    let error = field_errors.get(field)?.first()?;
    let message = error
        .message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| format!("invalid value ({})", error.code));

    Some((field.to_string(), message))
}

/// Run the derived rules of `value`, prefixing the field path with `prefix`
pub fn check<T: Validate>(prefix: Option<&str>, value: &T) -> Result<(), FieldError> {
    let Err(errors) = value.validate() else {
        return Ok(());
    };

    let (field, message) =
        first_field_error(&errors).unwrap_or_else(|| ("request".to_string(), errors.to_string()));
    let field = match prefix {
        Some(prefix) => format!("{}.{}", prefix, field),
        None => field,
    };

    Err(FieldError { field, message })
}

/// Require at least one line and validate every line in order
pub fn check_lines<T: Validate>(field: &str, lines: &[T]) -> Result<(), FieldError> {
    if lines.is_empty() {
        return Err(FieldError::new(field, "At least one line is required"));
    }
    for (index, line) in lines.iter().enumerate() {
        check(Some(&format!("{}[{}]", field, index)), line)?;
    }
    Ok(())
}
