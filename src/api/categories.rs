//! Category endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{BookQuery, Category, CategoryPayload},
    AppState,
};

use super::ValidatedJson;

/// List all categories
#[utoipa::path(
    get,
    path = "/categories",
    tag = "categories",
    responses(
        (status = 200, description = "List of categories", body = Vec<Category>)
    )
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Category>>> {
    let categories = state.services.catalog.list_categories().await?;
    Ok(Json(categories))
}

/// Create a new category
#[utoipa::path(
    post,
    path = "/categories",
    tag = "categories",
    request_body = CategoryPayload,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_category(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CategoryPayload>,
) -> AppResult<(StatusCode, Json<Category>)> {
    let created = state.services.catalog.create_category(&payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Get category details by ID
#[utoipa::path(
    get,
    path = "/category/{id}",
    tag = "categories",
    params(
        ("id" = i32, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category details", body = Category),
        (status = 404, description = "Category not found")
    )
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Category>> {
    let category = state.services.catalog.get_category(id).await?;
    Ok(Json(category))
}

/// Update a category
#[utoipa::path(
    patch,
    path = "/category/{id}",
    tag = "categories",
    params(
        ("id" = i32, Path, description = "Category ID")
    ),
    request_body = CategoryPayload,
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Category not found")
    )
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<CategoryPayload>,
) -> AppResult<Json<Category>> {
    let updated = state.services.catalog.update_category(id, &payload).await?;
    Ok(Json(updated))
}

/// Delete a category
#[utoipa::path(
    delete,
    path = "/category/{id}",
    tag = "categories",
    params(
        ("id" = i32, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category deleted; body is the deleted record", body = Category),
        (status = 404, description = "Category not found")
    )
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Category>> {
    let deleted = state.services.catalog.delete_category(id).await?;
    Ok(Json(deleted))
}

/// Get a category together with its books
#[utoipa::path(
    get,
    path = "/categories/{id}/books",
    tag = "categories",
    params(
        ("id" = i32, Path, description = "Category ID"),
        BookQuery
    ),
    responses(
        (status = 200, description = "Category with its books", body = Category),
        (status = 404, description = "Category not found")
    )
)]
pub async fn category_books(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<Category>> {
    let category = state
        .services
        .catalog
        .get_category_with_books(id, &query)
        .await?;
    Ok(Json(category))
}
