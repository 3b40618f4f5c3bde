//! OpenAPI documentation

use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

use crate::{
    api::{books, health, loans},
    error::ErrorResponse,
    models::{
        book::{Book, BookForm},
        loan::{IssueForm, Loan, LoanDetails, LoanStatus, ReturnForm},
        Outcome,
    },
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library Desk API",
        version = "0.1.0",
        description = "Book catalog and student loan ledger"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        health::health_check,
        health::readiness_check,
        books::list_books,
        books::get_book,
        books::create_book,
        books::delete_book,
        loans::issue_book,
        loans::list_loans,
        loans::get_loan,
        loans::return_loan,
    ),
    components(schemas(
        health::HealthResponse,
        ErrorResponse,
        Outcome,
        Book,
        BookForm,
        Loan,
        LoanDetails,
        LoanStatus,
        IssueForm,
        ReturnForm,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "books", description = "Catalog of books and copy counts"),
        (name = "loans", description = "Issue and return of copies")
    )
)]
pub struct ApiDoc;

/// Serve the generated document as JSON
pub fn create_openapi_router() -> Router {
    Router::new().route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
}
