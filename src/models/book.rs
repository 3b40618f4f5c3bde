//! Book (catalog entry) model and related types

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Book model from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: Option<String>,
    pub year: Option<i32>,
    /// Unique across books when present
    pub isbn: Option<String>,
    /// Copies currently on the shelf, never negative
    pub qty: i64,
}

/// Validated input for a new catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct NewBook {
    #[validate(length(min = 1, message = "Title is required."))]
    pub title: String,
    pub author: Option<String>,
    pub year: Option<i32>,
    pub isbn: Option<String>,
    /// Copies to shelve; anything below 1 is stored as 1
    pub qty: i64,
}

impl NewBook {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: None,
            year: None,
            isbn: None,
            qty: 1,
        }
    }
}

/// Add book form, every field as typed by the librarian
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BookForm {
    #[serde(default)]
    pub title: String,
    pub author: Option<String>,
    /// Publication year, e.g. "2020"
    #[serde(default, deserialize_with = "text_or_number")]
    #[schema(value_type = Option<String>)]
    pub year: Option<String>,
    pub isbn: Option<String>,
    /// Number of copies (defaults to 1)
    #[serde(default, deserialize_with = "text_or_number")]
    #[schema(value_type = Option<String>)]
    pub qty: Option<String>,
}

/// Numeric form fields arrive as text from HTML forms and as numbers from
/// JSON clients; both are kept as text until normalization.
fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Number(n) => n.to_string(),
    }))
}

impl TryFrom<BookForm> for NewBook {
    type Error = AppError;

    /// Trim everything, drop blanks, and fall back to safe defaults for
    /// numbers that do not parse. Only a missing title is rejected.
    fn try_from(form: BookForm) -> AppResult<Self> {
        let book = NewBook {
            title: form.title.trim().to_string(),
            author: non_blank(form.author),
            year: non_blank(form.year).and_then(|y| y.parse().ok()),
            isbn: non_blank(form.isbn),
            qty: non_blank(form.qty)
                .and_then(|q| q.parse::<i64>().ok())
                .filter(|q| *q > 0)
                .unwrap_or(1),
        };

        book.validate()?;
        Ok(book)
    }
}

/// Query parameters for listing books
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Substring matched against title, author and ISBN
    pub q: Option<String>,
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(title: &str) -> BookForm {
        BookForm {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_form_trims_and_drops_blank_fields() {
        let book = NewBook::try_from(BookForm {
            title: "  Dune ".to_string(),
            author: Some(" Herbert ".to_string()),
            year: Some("1965".to_string()),
            isbn: Some("   ".to_string()),
            qty: Some("3".to_string()),
        })
        .unwrap();

        assert_eq!(book.title, "Dune");
        assert_eq!(book.author.as_deref(), Some("Herbert"));
        assert_eq!(book.year, Some(1965));
        assert_eq!(book.isbn, None);
        assert_eq!(book.qty, 3);
    }

    #[test]
    fn test_unparseable_numbers_fall_back() {
        let book = NewBook::try_from(BookForm {
            year: Some("nineteen".to_string()),
            qty: Some("many".to_string()),
            ..form("Dune")
        })
        .unwrap();
        assert_eq!(book.year, None);
        assert_eq!(book.qty, 1);

        for qty in ["0", "-4", ""] {
            let book = NewBook::try_from(BookForm {
                qty: Some(qty.to_string()),
                ..form("Dune")
            })
            .unwrap();
            assert_eq!(book.qty, 1, "qty {:?}", qty);
        }
    }

    #[test]
    fn test_form_accepts_numbers_or_text() {
        let form: BookForm =
            serde_json::from_str(r#"{"title": "Dune", "year": 1965, "qty": "2"}"#).unwrap();
        assert_eq!(form.year.as_deref(), Some("1965"));
        assert_eq!(form.qty.as_deref(), Some("2"));

        let form: BookForm = serde_json::from_str(r#"{"title": "Dune"}"#).unwrap();
        assert_eq!(form.year, None);
    }

    #[test]
    fn test_blank_title_is_rejected() {
        let err = NewBook::try_from(form("   ")).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
