//! Books repository

use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};

use crate::error::{AppError, AppResult};
use crate::models::{Book, BookPayload, BookQuery, Category, SortDirection, Thickness};

/// Columns selected for a book joined with its category
const BOOK_WITH_CATEGORY_COLUMNS: &str = r#"
    b.id, b.title, b.description, b.image_url, b.release_year, b.price,
    b.total_page, b.thickness, b.category_id, b.created_at, b.updated_at,
    c.id AS c_id, c.name AS c_name, c.created_at AS c_created_at, c.updated_at AS c_updated_at
"#;

/// Repository for book operations
#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List books matching the given filters, each joined with its category
    pub async fn list(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<String> = Vec::new();
        filter_conditions(query, &mut conditions, &mut params);

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let select_query = format!(
            r#"
            SELECT {}
            FROM books b
            JOIN categories c ON c.id = b.category_id
            {}
            {}
            "#,
            BOOK_WITH_CATEGORY_COLUMNS,
            where_clause,
            order_clause(query.sort_by_title),
        );

        let mut query_builder = sqlx::query(&select_query);
        for param in &params {
            query_builder = query_builder.bind(param);
        }

        let rows = query_builder.fetch_all(&self.pool).await?;
        rows.iter().map(book_from_joined_row).collect()
    }

    /// Get a single book by id, joined with its category
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        let select_query = format!(
            r#"
            SELECT {}
            FROM books b
            JOIN categories c ON c.id = b.category_id
            WHERE b.id = $1
            "#,
            BOOK_WITH_CATEGORY_COLUMNS,
        );

        let row = sqlx::query(&select_query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        book_from_joined_row(&row)
    }

    /// List books belonging to a category, with the same filters as `list`
    pub async fn list_by_category(
        &self,
        category_id: i32,
        query: &BookQuery,
    ) -> AppResult<Vec<Book>> {
        let mut conditions = vec![format!("b.category_id = {}", category_id)];
        let mut params: Vec<String> = Vec::new();
        filter_conditions(query, &mut conditions, &mut params);

        let select_query = format!(
            r#"
            SELECT b.id, b.title, b.description, b.image_url, b.release_year, b.price,
                   b.total_page, b.thickness, b.category_id, b.created_at, b.updated_at
            FROM books b
            WHERE {}
            {}
            "#,
            conditions.join(" AND "),
            order_clause(query.sort_by_title),
        );

        let mut query_builder = sqlx::query_as::<_, Book>(&select_query);
        for param in &params {
            query_builder = query_builder.bind(param);
        }

        Ok(query_builder.fetch_all(&self.pool).await?)
    }

    /// Create a new book and return it joined with its category
    pub async fn create(&self, payload: &BookPayload, thickness: Thickness) -> AppResult<Book> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO books (title, description, image_url, release_year, price,
                               total_page, thickness, category_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(&payload.image)
        .bind(payload.release_year)
        .bind(&payload.price)
        .bind(payload.total_page)
        .bind(thickness)
        .bind(payload.category)
        .fetch_one(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    /// Update an existing book and return it joined with its category
    pub async fn update(
        &self,
        id: i32,
        payload: &BookPayload,
        thickness: Thickness,
    ) -> AppResult<Book> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = $1, description = $2, image_url = $3, release_year = $4,
                price = $5, total_page = $6, thickness = $7, category_id = $8,
                updated_at = NOW()
            WHERE id = $9
            "#,
        )
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(&payload.image)
        .bind(payload.release_year)
        .bind(&payload.price)
        .bind(payload.total_page)
        .bind(thickness)
        .bind(payload.category)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        self.get_by_id(id).await
    }

    /// Delete a book and return the deleted record
    pub async fn delete(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            DELETE FROM books
            WHERE id = $1
            RETURNING id, title, description, image_url, release_year, price,
                      total_page, thickness, category_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }
}

/// Append WHERE conditions for the optional book filters.
///
/// String filters are bound as numbered parameters; numeric bounds come from
/// already-typed integers and are rendered inline.
fn filter_conditions(query: &BookQuery, conditions: &mut Vec<String>, params: &mut Vec<String>) {
    if let Some(ref title) = query.title {
        params.push(format!("%{}%", title.to_lowercase()));
        conditions.push(format!("LOWER(b.title) LIKE ${}", params.len()));
    }
    if let Some(min_year) = query.min_year {
        conditions.push(format!("b.release_year >= {}", min_year));
    }
    if let Some(max_year) = query.max_year {
        conditions.push(format!("b.release_year <= {}", max_year));
    }
    if let Some(min_page) = query.min_page {
        conditions.push(format!("b.total_page >= {}", min_page));
    }
    if let Some(max_page) = query.max_page {
        conditions.push(format!("b.total_page <= {}", max_page));
    }
}

fn order_clause(sort: Option<SortDirection>) -> &'static str {
    match sort {
        Some(SortDirection::Asc) => "ORDER BY b.title ASC",
        Some(SortDirection::Desc) => "ORDER BY b.title DESC",
        None => "",
    }
}

/// Build a book from a row that joins books with categories
fn book_from_joined_row(row: &PgRow) -> AppResult<Book> {
    Ok(Book {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        image_url: row.try_get("image_url")?,
        release_year: row.try_get("release_year")?,
        price: row.try_get("price")?,
        total_page: row.try_get("total_page")?,
        thickness: row.try_get("thickness")?,
        category_id: row.try_get("category_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        category: Some(Category {
            id: row.try_get("c_id")?,
            name: row.try_get("c_name")?,
            created_at: row.try_get("c_created_at")?,
            updated_at: row.try_get("c_updated_at")?,
            books: None,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_produce_numbered_placeholders() {
        let query = BookQuery {
            title: Some("Rust".to_string()),
            min_year: Some(1990),
            max_year: Some(2000),
            ..Default::default()
        };

        let mut conditions = Vec::new();
        let mut params = Vec::new();
        filter_conditions(&query, &mut conditions, &mut params);

        assert_eq!(params, vec!["%rust%".to_string()]);
        assert_eq!(
            conditions,
            vec![
                "LOWER(b.title) LIKE $1".to_string(),
                "b.release_year >= 1990".to_string(),
                "b.release_year <= 2000".to_string(),
            ]
        );
    }

    #[test]
    fn empty_query_produces_no_conditions() {
        let mut conditions = Vec::new();
        let mut params = Vec::new();
        filter_conditions(&BookQuery::default(), &mut conditions, &mut params);

        assert!(conditions.is_empty());
        assert!(params.is_empty());
    }

    #[test]
    fn sort_direction_maps_to_order_clause() {
        assert_eq!(order_clause(Some(SortDirection::Asc)), "ORDER BY b.title ASC");
        assert_eq!(order_clause(Some(SortDirection::Desc)), "ORDER BY b.title DESC");
        assert_eq!(order_clause(None), "");
    }
}
