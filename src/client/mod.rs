//! Client-side catalog store and HTTP API client
//!
//! Mirrors the browser single-page app: an observable in-memory cache of the
//! catalog with fetch/create/update/delete operations over the REST API,
//! plus session persistence and user-facing notifications.

pub mod api;
pub mod notify;
pub mod session;
pub mod store;

pub use api::{ApiError, ApiResult, CatalogApi, HttpCatalogApi};
pub use notify::{Notification, Notifier, Severity};
pub use session::{Session, SessionStore};
pub use store::{CatalogStore, StoreState};
