//! Pustaka Library Catalog
//!
//! A small library-catalog system: a REST JSON API for managing books and
//! categories with username/password authentication, plus an embeddable
//! client-side state store that mirrors the server collections.

use std::sync::Arc;

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
