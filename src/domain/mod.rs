//! Domain layer - Pure business abstractions
//!
//! No framework dependencies beyond the SeaORM error conversion.

pub mod errors;

pub use errors::DomainError;
