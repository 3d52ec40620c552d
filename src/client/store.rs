//! Observable client-side catalog store
//!
//! Holds the cached book and category lists, the selected entities for the
//! edit views, and a loading flag. Views subscribe through a watch channel
//! and re-render on every change. All cache mutations funnel through a
//! single `apply` entry point, and fetches carry sequence numbers so a slow
//! response can never overwrite a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio_stream::wrappers::WatchStream;

use crate::models::{Book, BookPayload, BookQuery, Category, CategoryPayload};

use super::api::CatalogApi;
use super::notify::{Notification, Notifier};
use super::session::{Session, SessionStore};

/// Snapshot of everything the views render from
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub books: Vec<Book>,
    pub categories: Vec<Category>,
    pub selected_book: Option<Book>,
    pub selected_category: Option<Category>,
    pub loading: bool,
}

/// Every cache change is one of these, applied in [`CatalogStore::apply`]
#[derive(Debug)]
enum Mutation {
    FetchStarted,
    BooksLoaded { seq: u64, books: Vec<Book> },
    BooksFetchFailed { seq: u64 },
    CategoriesLoaded { seq: u64, categories: Vec<Category> },
    CategoriesFetchFailed { seq: u64 },
    BookSelectionCleared,
    BookSelected { book: Book },
    CategorySelectionCleared,
    CategorySelected { category: Category },
    BookRemoved { id: i32 },
    CategoryRemoved { id: i32 },
}

/// Client-side cache of the catalog.
///
/// Constructed once at startup and shared by reference; there is no global
/// instance. The store never lets an API failure escape: every error is
/// logged or turned into a notification.
pub struct CatalogStore {
    api: Arc<dyn CatalogApi>,
    state: watch::Sender<StoreState>,
    session: SessionStore,
    notifier: Notifier,
    books_seq: AtomicU64,
    categories_seq: AtomicU64,
}

impl CatalogStore {
    pub fn new(api: Arc<dyn CatalogApi>, session: SessionStore) -> Self {
        let (state, _) = watch::channel(StoreState {
            loading: true,
            ..StoreState::default()
        });

        Self {
            api,
            state,
            session,
            notifier: Notifier::default(),
            books_seq: AtomicU64::new(0),
            categories_seq: AtomicU64::new(0),
        }
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    /// State changes as an async stream; yields the current state first
    pub fn watch(&self) -> WatchStream<StoreState> {
        WatchStream::new(self.state.subscribe())
    }

    /// Current state snapshot
    pub fn state(&self) -> StoreState {
        self.state.borrow().clone()
    }

    /// Subscribe to user-facing notifications
    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }

    /// Current session, if logged in
    pub fn session(&self) -> Option<Session> {
        self.session.current()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Single entry point for cache mutations.
    ///
    /// Loaded results are applied only when their sequence number is still
    /// the latest issued for that collection; stale responses are dropped,
    /// and the loading flag stays set until the newest fetch resolves.
    fn apply(&self, mutation: Mutation) {
        self.state.send_modify(|state| match mutation {
            Mutation::FetchStarted => state.loading = true,
            Mutation::BooksLoaded { seq, books } => {
                if seq == self.books_seq.load(Ordering::SeqCst) {
                    state.books = books;
                    state.loading = false;
                }
            }
            Mutation::BooksFetchFailed { seq } => {
                if seq == self.books_seq.load(Ordering::SeqCst) {
                    state.loading = false;
                }
            }
            Mutation::CategoriesLoaded { seq, categories } => {
                if seq == self.categories_seq.load(Ordering::SeqCst) {
                    state.categories = categories;
                    state.loading = false;
                }
            }
            Mutation::CategoriesFetchFailed { seq } => {
                if seq == self.categories_seq.load(Ordering::SeqCst) {
                    state.loading = false;
                }
            }
            Mutation::BookSelectionCleared => state.selected_book = None,
            Mutation::BookSelected { book } => state.selected_book = Some(book),
            Mutation::CategorySelectionCleared => state.selected_category = None,
            Mutation::CategorySelected { category } => {
                state.selected_category = Some(category)
            }
            Mutation::BookRemoved { id } => state.books.retain(|book| book.id != id),
            Mutation::CategoryRemoved { id } => {
                state.categories.retain(|category| category.id != id)
            }
        });
    }

    /// Replace the cached book list with the server's filtered result.
    /// Failures are logged and the previous list is kept.
    pub async fn fetch_books(&self, query: &BookQuery) {
        let seq = self.books_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.apply(Mutation::FetchStarted);

        match self.api.list_books(query).await {
            Ok(books) => self.apply(Mutation::BooksLoaded { seq, books }),
            Err(error) => {
                tracing::warn!("Failed to fetch books: {}", error);
                self.apply(Mutation::BooksFetchFailed { seq });
            }
        }
    }

    /// Replace the cached category list
    pub async fn fetch_categories(&self) {
        let seq = self.categories_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.apply(Mutation::FetchStarted);

        match self.api.list_categories().await {
            Ok(categories) => self.apply(Mutation::CategoriesLoaded { seq, categories }),
            Err(error) => {
                tracing::warn!("Failed to fetch categories: {}", error);
                self.apply(Mutation::CategoriesFetchFailed { seq });
            }
        }
    }

    /// Load one book into the selected slot. The slot is cleared first; on
    /// failure it stays empty.
    pub async fn fetch_book_by_id(&self, id: i32) -> Option<Book> {
        self.apply(Mutation::BookSelectionCleared);

        match self.api.get_book(id).await {
            Ok(book) => {
                self.apply(Mutation::BookSelected { book: book.clone() });
                Some(book)
            }
            Err(error) => {
                tracing::warn!("Failed to fetch book {}: {}", id, error);
                None
            }
        }
    }

    /// Load one category into the selected slot
    pub async fn fetch_category_by_id(&self, id: i32) -> Option<Category> {
        self.apply(Mutation::CategorySelectionCleared);

        match self.api.get_category(id).await {
            Ok(category) => {
                self.apply(Mutation::CategorySelected {
                    category: category.clone(),
                });
                Some(category)
            }
            Err(error) => {
                tracing::warn!("Failed to fetch category {}: {}", id, error);
                None
            }
        }
    }

    /// Load a category together with its (optionally filtered) books into
    /// the selected slot
    pub async fn fetch_category_books(&self, id: i32, query: &BookQuery) -> Option<Category> {
        self.apply(Mutation::CategorySelectionCleared);

        match self.api.category_books(id, query).await {
            Ok(category) => {
                self.apply(Mutation::CategorySelected {
                    category: category.clone(),
                });
                Some(category)
            }
            Err(error) => {
                tracing::warn!("Failed to fetch books for category {}: {}", id, error);
                None
            }
        }
    }

    /// Delete a book. On success the cached row is removed by id and a
    /// success notification is emitted; on failure the cache is untouched.
    pub async fn delete_book(&self, id: i32) -> bool {
        match self.api.delete_book(id).await {
            Ok(_) => {
                self.apply(Mutation::BookRemoved { id });
                self.notifier.emit(Notification::success(
                    "Delete book",
                    "Book deleted successfully.",
                ));
                true
            }
            Err(error) => {
                self.notifier
                    .emit(Notification::error("Delete book", error.message()));
                false
            }
        }
    }

    /// Delete a category, with the same cache contract as [`delete_book`]
    ///
    /// [`delete_book`]: CatalogStore::delete_book
    pub async fn delete_category(&self, id: i32) -> bool {
        match self.api.delete_category(id).await {
            Ok(_) => {
                self.apply(Mutation::CategoryRemoved { id });
                self.notifier.emit(Notification::success(
                    "Delete category",
                    "Category deleted successfully.",
                ));
                true
            }
            Err(error) => {
                self.notifier
                    .emit(Notification::error("Delete category", error.message()));
                false
            }
        }
    }

    /// Create a book; on success the book list is re-fetched unfiltered
    pub async fn add_book(&self, payload: &BookPayload) -> bool {
        match self.api.create_book(payload).await {
            Ok(_) => {
                self.fetch_books(&BookQuery::default()).await;
                true
            }
            Err(error) => {
                self.notifier
                    .emit(Notification::error("Add book", error.message()));
                false
            }
        }
    }

    /// Create a category; on success the category list is re-fetched
    pub async fn add_category(&self, payload: &CategoryPayload) -> bool {
        match self.api.create_category(payload).await {
            Ok(_) => {
                self.fetch_categories().await;
                true
            }
            Err(error) => {
                self.notifier
                    .emit(Notification::error("Add category", error.message()));
                false
            }
        }
    }

    /// Update a book. The cache is left alone; callers re-fetch or navigate.
    pub async fn edit_book(&self, id: i32, payload: &BookPayload) -> bool {
        match self.api.update_book(id, payload).await {
            Ok(_) => true,
            Err(error) => {
                self.notifier
                    .emit(Notification::error("Edit book", error.message()));
                false
            }
        }
    }

    /// Update a category without touching the cache
    pub async fn edit_category(&self, id: i32, payload: &CategoryPayload) -> bool {
        match self.api.update_category(id, payload).await {
            Ok(_) => true,
            Err(error) => {
                self.notifier
                    .emit(Notification::error("Edit category", error.message()));
                false
            }
        }
    }

    /// Register a new account
    pub async fn register(&self, username: &str, password: &str) -> bool {
        match self.api.register(username, password).await {
            Ok(_) => true,
            Err(error) => {
                self.notifier
                    .emit(Notification::error("Register", error.message()));
                false
            }
        }
    }

    /// Log in. The returned token and user id are persisted before this
    /// returns, so navigation guards see the session immediately.
    pub async fn login(&self, username: &str, password: &str) -> bool {
        match self.api.login(username, password).await {
            Ok(response) => {
                self.session.save(Session {
                    access_token: response.access_token,
                    user_id: response.user_id,
                });
                true
            }
            Err(error) => {
                self.notifier
                    .emit(Notification::error("Login", error.message()));
                false
            }
        }
    }

    /// Log out and clear the persisted session
    pub fn logout(&self) {
        self.session.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;
    use mockall::predicate::eq;
    use reqwest::StatusCode;
    use tokio_stream::StreamExt;

    use crate::api::auth::{LoginResponse, RegisterResponse};
    use crate::client::api::{ApiError, MockCatalogApi};
    use crate::client::notify::Severity;
    use crate::models::Thickness;

    fn sample_book(id: i32, title: &str) -> Book {
        let now = Utc::now();
        Book {
            id,
            title: title.to_string(),
            description: "A book".to_string(),
            image_url: "https://example.com/cover.jpg".to_string(),
            release_year: 2000,
            price: "Rp 100.000".to_string(),
            total_page: 250,
            thickness: Thickness::Thick,
            category_id: 1,
            created_at: now,
            updated_at: now,
            category: None,
        }
    }

    fn sample_category(id: i32, name: &str) -> Category {
        let now = Utc::now();
        Category {
            id,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
            books: None,
        }
    }

    fn sample_payload() -> BookPayload {
        BookPayload {
            title: "Dune".to_string(),
            description: "Desert planet".to_string(),
            image: "https://example.com/dune.jpg".to_string(),
            release_year: 1990,
            price: "Rp 120.000".to_string(),
            total_page: 412,
            category: 1,
        }
    }

    fn not_found(message: &str) -> ApiError {
        ApiError::Server {
            status: StatusCode::NOT_FOUND,
            message: message.to_string(),
        }
    }

    fn store_with(api: MockCatalogApi) -> CatalogStore {
        CatalogStore::new(Arc::new(api), SessionStore::in_memory())
    }

    #[tokio::test]
    async fn fetch_books_replaces_the_cached_list() {
        let mut api = MockCatalogApi::new();
        api.expect_list_books()
            .returning(|_| Ok(vec![sample_book(1, "Dune")]));

        let store = store_with(api);
        assert!(store.state().loading);

        store.fetch_books(&BookQuery::default()).await;

        let state = store.state();
        assert!(!state.loading);
        assert_eq!(state.books.len(), 1);
        assert_eq!(state.books[0].title, "Dune");
    }

    #[tokio::test]
    async fn failed_fetch_keeps_the_previous_list_and_clears_loading() {
        let mut api = MockCatalogApi::new();
        api.expect_list_books()
            .times(1)
            .returning(|_| Ok(vec![sample_book(1, "Dune")]));
        api.expect_list_books().times(1).returning(|_| {
            Err(ApiError::Server {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Internal server error".to_string(),
            })
        });

        let store = store_with(api);
        store.fetch_books(&BookQuery::default()).await;
        store.fetch_books(&BookQuery::default()).await;

        let state = store.state();
        assert!(!state.loading);
        assert_eq!(state.books.len(), 1);
    }

    #[test]
    fn stale_fetch_responses_are_discarded() {
        let store = store_with(MockCatalogApi::new());

        // Two overlapping fetches; the newer one resolves first.
        let first = store.books_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let second = store.books_seq.fetch_add(1, Ordering::SeqCst) + 1;

        store.apply(Mutation::BooksLoaded {
            seq: second,
            books: vec![sample_book(2, "Newer")],
        });
        store.apply(Mutation::BooksLoaded {
            seq: first,
            books: vec![sample_book(1, "Stale")],
        });

        let state = store.state();
        assert_eq!(state.books.len(), 1);
        assert_eq!(state.books[0].title, "Newer");
        assert!(!state.loading);
    }

    #[test]
    fn stale_completion_keeps_loading_while_a_newer_fetch_is_in_flight() {
        let store = store_with(MockCatalogApi::new());

        let first = store.books_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let _second = store.books_seq.fetch_add(1, Ordering::SeqCst) + 1;
        store.apply(Mutation::FetchStarted);

        store.apply(Mutation::BooksLoaded {
            seq: first,
            books: vec![sample_book(1, "Stale")],
        });

        let state = store.state();
        assert!(state.loading);
        assert!(state.books.is_empty());
    }

    #[tokio::test]
    async fn delete_book_removes_the_cached_entry_and_notifies() {
        let mut api = MockCatalogApi::new();
        api.expect_list_books().returning(|_| {
            Ok(vec![sample_book(1, "Dune"), sample_book(2, "Neuromancer")])
        });
        api.expect_delete_book()
            .with(eq(1))
            .returning(|_| Ok(sample_book(1, "Dune")));

        let store = store_with(api);
        store.fetch_books(&BookQuery::default()).await;
        let mut notifications = store.notifications();

        assert!(store.delete_book(1).await);

        let state = store.state();
        assert_eq!(state.books.len(), 1);
        assert_eq!(state.books[0].id, 2);

        let notification = notifications.try_recv().unwrap();
        assert_eq!(notification.severity, Severity::Success);
        assert_eq!(notification.title, "Delete book");
    }

    #[tokio::test]
    async fn failed_delete_leaves_the_cache_untouched() {
        let mut api = MockCatalogApi::new();
        api.expect_list_books()
            .returning(|_| Ok(vec![sample_book(1, "Dune")]));
        api.expect_delete_book()
            .returning(|_| Err(not_found("Book with id 9 not found")));

        let store = store_with(api);
        store.fetch_books(&BookQuery::default()).await;
        let mut notifications = store.notifications();

        assert!(!store.delete_book(9).await);
        assert_eq!(store.state().books.len(), 1);

        let notification = notifications.try_recv().unwrap();
        assert_eq!(notification.severity, Severity::Error);
        assert!(notification.message.contains("not found"));
    }

    #[tokio::test]
    async fn add_book_refetches_the_collection() {
        let mut api = MockCatalogApi::new();
        api.expect_create_book()
            .returning(|_| Ok(sample_book(3, "Foundation")));
        api.expect_list_books()
            .times(1)
            .returning(|_| Ok(vec![sample_book(3, "Foundation")]));

        let store = store_with(api);
        assert!(store.add_book(&sample_payload()).await);

        let state = store.state();
        assert_eq!(state.books.len(), 1);
        assert_eq!(state.books[0].id, 3);
    }

    #[tokio::test]
    async fn edit_book_leaves_the_cache_alone() {
        let mut api = MockCatalogApi::new();
        api.expect_update_book()
            .returning(|_, _| Ok(sample_book(1, "Dune (revised)")));

        let store = store_with(api);
        assert!(store.edit_book(1, &sample_payload()).await);
        assert!(store.state().books.is_empty());
    }

    #[tokio::test]
    async fn fetch_book_by_id_fills_the_selected_slot() {
        let mut api = MockCatalogApi::new();
        api.expect_get_book()
            .with(eq(1))
            .returning(|_| Ok(sample_book(1, "Dune")));

        let store = store_with(api);
        let book = store.fetch_book_by_id(1).await;

        assert_eq!(book.map(|b| b.id), Some(1));
        assert_eq!(store.state().selected_book.map(|b| b.id), Some(1));
    }

    #[tokio::test]
    async fn failed_selection_leaves_the_slot_empty() {
        let mut api = MockCatalogApi::new();
        api.expect_get_book()
            .times(1)
            .returning(|_| Ok(sample_book(1, "Dune")));
        api.expect_get_book()
            .times(1)
            .returning(|_| Err(not_found("Book with id 99 not found")));

        let store = store_with(api);
        store.fetch_book_by_id(1).await;
        assert!(store.state().selected_book.is_some());

        let missing = store.fetch_book_by_id(99).await;
        assert!(missing.is_none());
        assert!(store.state().selected_book.is_none());
    }

    #[tokio::test]
    async fn fetch_category_books_selects_the_category_with_its_books() {
        let mut api = MockCatalogApi::new();
        api.expect_category_books()
            .withf(|id, _query| *id == 5)
            .returning(|id, _| {
                let mut category = sample_category(id, "Fiction");
                category.books = Some(vec![sample_book(1, "Dune")]);
                Ok(category)
            });

        let store = store_with(api);
        let category = store.fetch_category_books(5, &BookQuery::default()).await;

        assert!(category.is_some());
        let selected = store.state().selected_category.unwrap();
        assert_eq!(selected.id, 5);
        assert_eq!(selected.books.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_category_removes_the_cached_entry() {
        let mut api = MockCatalogApi::new();
        api.expect_list_categories().returning(|| {
            Ok(vec![sample_category(1, "Fiction"), sample_category(2, "History")])
        });
        api.expect_delete_category()
            .with(eq(2))
            .returning(|id| Ok(sample_category(id, "History")));

        let store = store_with(api);
        store.fetch_categories().await;

        assert!(store.delete_category(2).await);

        let state = store.state();
        assert_eq!(state.categories.len(), 1);
        assert_eq!(state.categories[0].id, 1);
    }

    #[tokio::test]
    async fn add_category_refetches_the_collection() {
        let mut api = MockCatalogApi::new();
        api.expect_create_category()
            .returning(|payload| Ok(sample_category(1, &payload.name)));
        api.expect_list_categories()
            .times(1)
            .returning(|| Ok(vec![sample_category(1, "Fiction")]));

        let store = store_with(api);
        let payload = CategoryPayload {
            name: "Fiction".to_string(),
        };

        assert!(store.add_category(&payload).await);
        assert_eq!(store.state().categories.len(), 1);
    }

    #[tokio::test]
    async fn login_persists_the_session_before_returning() {
        let mut api = MockCatalogApi::new();
        api.expect_login().returning(|_, _| {
            Ok(LoginResponse {
                message: "Logged in successfully.".to_string(),
                access_token: "signed-token".to_string(),
                user_id: 42,
            })
        });

        let store = store_with(api);
        assert!(!store.is_authenticated());

        assert!(store.login("admin", "admin").await);

        assert!(store.is_authenticated());
        let session = store.session().unwrap();
        assert_eq!(session.access_token, "signed-token");
        assert_eq!(session.user_id, 42);
    }

    #[tokio::test]
    async fn failed_login_notifies_and_keeps_no_session() {
        let mut api = MockCatalogApi::new();
        api.expect_login().returning(|_, _| {
            Err(ApiError::Server {
                status: StatusCode::FORBIDDEN,
                message: "Invalid credentials.".to_string(),
            })
        });

        let store = store_with(api);
        let mut notifications = store.notifications();

        assert!(!store.login("admin", "wrong").await);
        assert!(!store.is_authenticated());

        let notification = notifications.try_recv().unwrap();
        assert_eq!(notification.severity, Severity::Error);
        assert_eq!(notification.message, "Invalid credentials.");
    }

    #[tokio::test]
    async fn register_reports_conflicts_through_notifications() {
        let mut api = MockCatalogApi::new();
        api.expect_register()
            .times(1)
            .returning(|_, _| {
                Ok(RegisterResponse {
                    message: "User created successfully.".to_string(),
                })
            });
        api.expect_register().times(1).returning(|_, _| {
            Err(ApiError::Server {
                status: StatusCode::FORBIDDEN,
                message: "Username already exists.".to_string(),
            })
        });

        let store = store_with(api);
        let mut notifications = store.notifications();

        assert!(store.register("reader", "pw").await);
        assert!(!store.register("reader", "pw").await);

        let notification = notifications.try_recv().unwrap();
        assert!(notification.message.contains("already exists"));
    }

    #[tokio::test]
    async fn logout_clears_the_session() {
        let mut api = MockCatalogApi::new();
        api.expect_login().returning(|_, _| {
            Ok(LoginResponse {
                message: "Logged in successfully.".to_string(),
                access_token: "signed-token".to_string(),
                user_id: 42,
            })
        });

        let store = store_with(api);
        store.login("admin", "admin").await;
        assert!(store.is_authenticated());

        store.logout();
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn watch_streams_state_updates() {
        let mut api = MockCatalogApi::new();
        api.expect_list_categories()
            .returning(|| Ok(vec![sample_category(1, "Fiction")]));

        let store = store_with(api);
        let mut stream = store.watch();

        let initial = stream.next().await.unwrap();
        assert!(initial.loading);
        assert!(initial.categories.is_empty());

        store.fetch_categories().await;

        let updated = stream.next().await.unwrap();
        assert!(!updated.loading);
        assert_eq!(updated.categories.len(), 1);
    }
}
