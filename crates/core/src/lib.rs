//! `countops-core` — shared domain building blocks.
//!
//! Identifiers, the domain error model and the value-object marker. No
//! infrastructure concerns live here.

pub mod error;
pub mod id;
pub mod value_object;

pub use error::DomainError;
pub use id::{LocationId, RunId};
pub use value_object::ValueObject;
