//! Book model and related types.
//!
//! The catalog stores one row per book; `thickness` is derived from
//! `total_page` whenever a book is written and is never recomputed on read,
//! so the stored value always reflects the page count at the last write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::category::Category;

/// Thickness category derived from the total page count at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Thickness {
    Thin,
    Medium,
    Thick,
}

impl Thickness {
    /// Derive the thickness class for a page count:
    /// up to 100 pages is thin, up to 200 medium, beyond that thick.
    pub fn from_total_page(total_page: i32) -> Self {
        if total_page <= 100 {
            Thickness::Thin
        } else if total_page <= 200 {
            Thickness::Medium
        } else {
            Thickness::Thick
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Thickness::Thin => "thin",
            Thickness::Medium => "medium",
            Thickness::Thick => "thick",
        }
    }
}

impl std::fmt::Display for Thickness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Thickness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "thin" => Ok(Thickness::Thin),
            "medium" => Ok(Thickness::Medium),
            "thick" => Ok(Thickness::Thick),
            _ => Err(format!("Invalid thickness: {}", s)),
        }
    }
}

// SQLx conversion: thickness is stored as TEXT
impl sqlx::Type<Postgres> for Thickness {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for Thickness {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Thickness {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Full book model (DB + API). The `category` relation is loaded by the
/// joined list/get queries and omitted from plain row reads.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub release_year: i32,
    /// Price kept as a string-typed decimal, exactly as entered
    pub price: String,
    pub total_page: i32,
    pub thickness: Thickness,
    pub category_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

/// Request body for creating or fully replacing a book.
/// POST and PATCH share this shape; every field is required.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct BookPayload {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: String,
    /// Image reference (URL); stored as `image_url`
    #[validate(length(min = 1, message = "image must not be empty"))]
    pub image: String,
    #[validate(range(
        min = 1980,
        max = 2021,
        message = "release_year must be between 1980 and 2021"
    ))]
    pub release_year: i32,
    #[validate(length(min = 1, message = "price must not be empty"))]
    pub price: String,
    #[validate(range(min = 1, message = "total_page must be a positive number"))]
    pub total_page: i32,
    /// Identifier of the owning category
    #[validate(range(min = 1, message = "category must be a valid category id"))]
    pub category: i32,
}

/// Sort direction for title ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Book list filters. The same struct serializes on the client and
/// deserializes on the server, so the two sides cannot drift apart.
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookQuery {
    /// Case-insensitive substring match on the title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Inclusive lower bound on release year
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_year: Option<i32>,
    /// Inclusive upper bound on release year
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_year: Option<i32>,
    /// Inclusive lower bound on total pages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_page: Option<i32>,
    /// Inclusive upper bound on total pages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_page: Option<i32>,
    /// Title sort direction; absent means database order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by_title: Option<SortDirection>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thickness_boundaries() {
        assert_eq!(Thickness::from_total_page(1), Thickness::Thin);
        assert_eq!(Thickness::from_total_page(100), Thickness::Thin);
        assert_eq!(Thickness::from_total_page(101), Thickness::Medium);
        assert_eq!(Thickness::from_total_page(150), Thickness::Medium);
        assert_eq!(Thickness::from_total_page(200), Thickness::Medium);
        assert_eq!(Thickness::from_total_page(201), Thickness::Thick);
        assert_eq!(Thickness::from_total_page(1000), Thickness::Thick);
    }

    #[test]
    fn thickness_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Thickness::Medium).unwrap(),
            "\"medium\""
        );
        assert_eq!(
            serde_json::from_str::<Thickness>("\"thick\"").unwrap(),
            Thickness::Thick
        );
    }

    #[test]
    fn payload_validation_rejects_out_of_range_year() {
        let payload = BookPayload {
            title: "Laskar Pelangi".to_string(),
            description: "A novel".to_string(),
            image: "https://example.org/cover.jpg".to_string(),
            release_year: 1979,
            price: "95000".to_string(),
            total_page: 529,
            category: 1,
        };
        assert!(validator::Validate::validate(&payload).is_err());

        let payload = BookPayload {
            release_year: 2022,
            ..payload
        };
        assert!(validator::Validate::validate(&payload).is_err());

        let payload = BookPayload {
            release_year: 2005,
            ..payload
        };
        assert!(validator::Validate::validate(&payload).is_ok());
    }

    #[test]
    fn payload_validation_rejects_empty_fields() {
        let payload = BookPayload {
            title: String::new(),
            description: "A novel".to_string(),
            image: "https://example.org/cover.jpg".to_string(),
            release_year: 2005,
            price: "95000".to_string(),
            total_page: 300,
            category: 1,
        };
        assert!(validator::Validate::validate(&payload).is_err());
    }

    #[test]
    fn query_uses_camel_case_on_the_wire() {
        let query = BookQuery {
            title: Some("laskar".to_string()),
            min_year: Some(1990),
            max_year: None,
            min_page: None,
            max_page: Some(600),
            sort_by_title: Some(SortDirection::Desc),
        };
        let encoded = serde_json::to_value(&query).unwrap();
        assert_eq!(encoded["minYear"], 1990);
        assert_eq!(encoded["maxPage"], 600);
        assert_eq!(encoded["sortByTitle"], "desc");
        assert!(encoded.get("maxYear").is_none());
    }
}
