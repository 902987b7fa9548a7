//! # Blog Shared
//!
//! Wire types shared by the server and any client: the render contexts the
//! handlers answer with, and the problem-details error body.

pub mod dto;
pub mod response;

pub use response::{ErrorResponse, FieldErrors};
