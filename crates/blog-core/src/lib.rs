//! # Blog Core
//!
//! The domain layer of the blog: entities, the visibility filter, the
//! ownership guard, pagination and form validation. No infrastructure
//! dependencies live here.

pub mod domain;
pub mod error;
pub mod forms;
pub mod guard;
pub mod pagination;
pub mod ports;
pub mod visibility;

pub use error::DomainError;
