//! Field validation library.
//!
//! # Data Flow
//! ```text
//! handler reads raw field (serde_json::Value)
//!     → rules.rs / pagination.rs (check, coerce)
//!     → Ok(coerced value) used by the handler
//!     → Err(ValidationFailure) → ShieldError::Validation → 400 response
//! ```
//!
//! # Design Decisions
//! - Validators are pure functions; the only effect is the returned error
//! - Numeric validators coerce-then-validate since transport values arrive as text
//! - Every failure has the same shape: field, received, rule, extra context

pub mod failure;
pub mod pagination;
pub mod rules;

pub use failure::{FieldResult, ValidationFailure};
pub use pagination::{validate_pagination, Pagination};
pub use rules::*;
