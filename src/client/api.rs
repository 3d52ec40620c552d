//! HTTP client for the Pustaka REST API

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

#[cfg(test)]
use mockall::automock;

use crate::api::auth::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use crate::models::{Book, BookPayload, BookQuery, Category, CategoryPayload};

/// Errors surfaced by API calls
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, DNS, ...)
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The server answered with a non-success status
    #[error("server returned {status}: {message}")]
    Server { status: StatusCode, message: String },
}

impl ApiError {
    /// Server-provided message where available, transport error text otherwise
    pub fn message(&self) -> String {
        match self {
            ApiError::Transport(error) => error.to_string(),
            ApiError::Server { message, .. } => message.clone(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// The full REST surface the client store talks to
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list_books(&self, query: &BookQuery) -> ApiResult<Vec<Book>>;
    async fn get_book(&self, id: i32) -> ApiResult<Book>;
    async fn create_book(&self, payload: &BookPayload) -> ApiResult<Book>;
    async fn update_book(&self, id: i32, payload: &BookPayload) -> ApiResult<Book>;
    async fn delete_book(&self, id: i32) -> ApiResult<Book>;

    async fn list_categories(&self) -> ApiResult<Vec<Category>>;
    async fn get_category(&self, id: i32) -> ApiResult<Category>;
    async fn category_books(&self, id: i32, query: &BookQuery) -> ApiResult<Category>;
    async fn create_category(&self, payload: &CategoryPayload) -> ApiResult<Category>;
    async fn update_category(&self, id: i32, payload: &CategoryPayload) -> ApiResult<Category>;
    async fn delete_category(&self, id: i32) -> ApiResult<Category>;

    async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse>;
    async fn register(&self, username: &str, password: &str) -> ApiResult<RegisterResponse>;
}

/// reqwest-backed implementation of [`CatalogApi`]
pub struct HttpCatalogApi {
    base_url: String,
    http: reqwest::Client,
}

impl HttpCatalogApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogApi {
    async fn list_books(&self, query: &BookQuery) -> ApiResult<Vec<Book>> {
        let response = self
            .http
            .get(self.url("/api/books"))
            .query(query)
            .send()
            .await?;
        read_response(response).await
    }

    async fn get_book(&self, id: i32) -> ApiResult<Book> {
        let response = self.http.get(self.url(&format!("/api/book/{}", id))).send().await?;
        read_response(response).await
    }

    async fn create_book(&self, payload: &BookPayload) -> ApiResult<Book> {
        let response = self
            .http
            .post(self.url("/api/books"))
            .json(payload)
            .send()
            .await?;
        read_response(response).await
    }

    async fn update_book(&self, id: i32, payload: &BookPayload) -> ApiResult<Book> {
        let response = self
            .http
            .patch(self.url(&format!("/api/book/{}", id)))
            .json(payload)
            .send()
            .await?;
        read_response(response).await
    }

    async fn delete_book(&self, id: i32) -> ApiResult<Book> {
        let response = self
            .http
            .delete(self.url(&format!("/api/book/{}", id)))
            .send()
            .await?;
        read_response(response).await
    }

    async fn list_categories(&self) -> ApiResult<Vec<Category>> {
        let response = self.http.get(self.url("/api/categories")).send().await?;
        read_response(response).await
    }

    async fn get_category(&self, id: i32) -> ApiResult<Category> {
        let response = self
            .http
            .get(self.url(&format!("/api/category/{}", id)))
            .send()
            .await?;
        read_response(response).await
    }

    async fn category_books(&self, id: i32, query: &BookQuery) -> ApiResult<Category> {
        let response = self
            .http
            .get(self.url(&format!("/api/categories/{}/books", id)))
            .query(query)
            .send()
            .await?;
        read_response(response).await
    }

    async fn create_category(&self, payload: &CategoryPayload) -> ApiResult<Category> {
        let response = self
            .http
            .post(self.url("/api/categories"))
            .json(payload)
            .send()
            .await?;
        read_response(response).await
    }

    async fn update_category(&self, id: i32, payload: &CategoryPayload) -> ApiResult<Category> {
        let response = self
            .http
            .patch(self.url(&format!("/api/category/{}", id)))
            .json(payload)
            .send()
            .await?;
        read_response(response).await
    }

    async fn delete_category(&self, id: i32) -> ApiResult<Category> {
        let response = self
            .http
            .delete(self.url(&format!("/api/category/{}", id)))
            .send()
            .await?;
        read_response(response).await
    }

    async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse> {
        let body = LoginRequest {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        };
        let response = self
            .http
            .post(self.url("/api/login"))
            .json(&body)
            .send()
            .await?;
        read_response(response).await
    }

    async fn register(&self, username: &str, password: &str) -> ApiResult<RegisterResponse> {
        let body = RegisterRequest {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        };
        let response = self
            .http
            .post(self.url("/api/register"))
            .json(&body)
            .send()
            .await?;
        read_response(response).await
    }
}

/// Decode a success body, or turn an error status into [`ApiError::Server`]
async fn read_response<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
    let status = response.status();
    if status.is_success() {
        Ok(response.json::<T>().await?)
    } else {
        let message = error_message(response).await;
        Err(ApiError::Server { status, message })
    }
}

/// Error bodies carry `{ error, message }`; either key may be missing
async fn error_message(response: reqwest::Response) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        error: Option<String>,
    }

    match response.json::<ErrorBody>().await {
        Ok(body) => body
            .message
            .or(body.error)
            .unwrap_or_else(|| "Unknown server error".to_string()),
        Err(_) => "Unknown server error".to_string(),
    }
}
