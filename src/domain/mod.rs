//! Domain layer: models, errors, and port traits.
//!
//! Pure types and contracts with no transport dependencies beyond serde.

pub mod errors;
pub mod models;
pub mod ports;
