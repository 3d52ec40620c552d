//! Data models for Pustaka

pub mod book;
pub mod category;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookPayload, BookQuery, SortDirection, Thickness};
pub use category::{Category, CategoryPayload};
pub use user::{TokenClaims, User};
