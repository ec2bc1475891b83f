//! Database module for the authentication gateway
//!
//! This module holds the user record model and the data access layer
//! the authentication services read and write through.

pub mod models;
pub mod operations;

pub use models::User;
pub use operations::DbOperations;
