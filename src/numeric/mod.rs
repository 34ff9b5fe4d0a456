// ============================================================================
// Numeric Module
// Fixed-point arithmetic for quantities and money
// ============================================================================
//
// This module provides:
// - FixedDecimal<D>: Fixed-point decimal with compile-time precision
// - NumericError: Error types for arithmetic operations
// - Quantity/Money type aliases (two decimal places)
//
// Design principles:
// - No floating-point operations
// - All arithmetic returns Result (no panics)
// - Division and multiplication truncate toward zero, never round up

mod errors;
mod fixed_decimal;

pub use errors::{NumericError, NumericResult};
pub use fixed_decimal::{FixedDecimal, Money, Quantity};
