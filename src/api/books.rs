//! Book (catalog) endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookForm, BookQuery},
        Outcome,
    },
    AppState,
};

use super::reply;

/// List books, or search them when `q` is given
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "Books ordered by title", body = Vec<Book>)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.browse(query.q.as_deref()).await?;
    Ok(Json(books))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Add a book to the catalog
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = BookForm,
    responses(
        (status = 201, description = "Book added", body = Outcome),
        (status = 400, description = "Title missing", body = Outcome),
        (status = 409, description = "ISBN already in the catalog", body = Outcome)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    Json(form): Json<BookForm>,
) -> AppResult<(StatusCode, Json<Outcome>)> {
    let outcome = state.services.catalog.add_book_form(form).await?;
    Ok(reply(outcome, StatusCode::CREATED))
}

/// Delete a book (unknown ids are ignored)
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book deleted", body = Outcome)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<(StatusCode, Json<Outcome>)> {
    let outcome = state.services.catalog.delete_book(id).await?;
    Ok(reply(outcome, StatusCode::OK))
}
