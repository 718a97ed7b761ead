//! Managers: each binds one validated form to the rows it writes.
//!
//! Handlers resolve the acting account and pass its id in explicitly.

pub mod account_service;
pub mod book_service;
pub mod review_service;
pub mod shelf_service;

pub use shelf_service::Shelf;
