//! HTTP request handlers for the Bucketgate web server
//!
//! This module contains all the HTTP request handlers organized by functionality.

pub mod error;
pub mod files;
pub mod health;
pub mod pages;
pub mod types;

pub use error::ApiError;
pub use files::*;
pub use health::*;
pub use pages::*;

// Re-export all types for convenience
pub use types::*;
