//! Schema and state types shared by the Stripeform crates.
//!
//! - [`schema`] describes resource attributes and validates values against them
//! - [`data`] holds resource values with explicit presence and change detection
//! - [`diagnostics`] carries validation findings

pub mod data;
pub mod diagnostics;
pub mod schema;

pub use data::{ResourceData, ResourceState};
pub use diagnostics::{Diagnostic, DiagnosticSeverity, ValidationError, ValidationResult};
pub use schema::{Attribute, AttributeType, ProviderSchema, Schema};
