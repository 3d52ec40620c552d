//! Catalog management service

use crate::{
    error::AppResult,
    models::{Book, BookPayload, BookQuery, Category, CategoryPayload, Thickness},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Verify database connectivity
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.repository.pool).await?;
        Ok(())
    }

    /// List books with filters
    pub async fn list_books(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        self.repository.books.list(query).await
    }

    /// Get book by ID with its category
    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Create a new book. Thickness is derived from the page count, never
    /// taken from the client.
    pub async fn create_book(&self, payload: &BookPayload) -> AppResult<Book> {
        let thickness = Thickness::from_total_page(payload.total_page);
        self.repository.books.create(payload, thickness).await
    }

    /// Update an existing book, recomputing its thickness
    pub async fn update_book(&self, id: i32, payload: &BookPayload) -> AppResult<Book> {
        let thickness = Thickness::from_total_page(payload.total_page);
        self.repository.books.update(id, payload, thickness).await
    }

    /// Delete a book and return the deleted record
    pub async fn delete_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.delete(id).await
    }

    /// List all categories
    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        self.repository.categories.list().await
    }

    /// Get category by ID
    pub async fn get_category(&self, id: i32) -> AppResult<Category> {
        self.repository.categories.get_by_id(id).await
    }

    /// Get a category together with its books, applying book filters
    pub async fn get_category_with_books(
        &self,
        id: i32,
        query: &BookQuery,
    ) -> AppResult<Category> {
        let mut category = self.repository.categories.get_by_id(id).await?;
        let books = self.repository.books.list_by_category(id, query).await?;
        category.books = Some(books);
        Ok(category)
    }

    /// Create a new category
    pub async fn create_category(&self, payload: &CategoryPayload) -> AppResult<Category> {
        self.repository.categories.create(&payload.name).await
    }

    /// Update a category
    pub async fn update_category(&self, id: i32, payload: &CategoryPayload) -> AppResult<Category> {
        self.repository.categories.update(id, &payload.name).await
    }

    /// Delete a category and return the deleted record
    pub async fn delete_category(&self, id: i32) -> AppResult<Category> {
        self.repository.categories.delete(id).await
    }
}
