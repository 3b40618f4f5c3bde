//! API handlers for the library desk JSON endpoints

pub mod books;
pub mod health;
pub mod loans;
pub mod openapi;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{models::Outcome, AppState};

/// Answer a mutation with its outcome. Business failures keep the outcome
/// body and take the status of their error code.
pub(crate) fn reply(outcome: Outcome, on_success: StatusCode) -> (StatusCode, Json<Outcome>) {
    let status = if outcome.success {
        on_success
    } else {
        outcome.code.status()
    };
    (status, Json(outcome))
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Catalog
        .route("/books", get(books::list_books).post(books::create_book))
        .route("/books/:id", get(books::get_book).delete(books::delete_book))
        .route("/books/:id/issue", post(loans::issue_book))
        // Loans
        .route("/loans", get(loans::list_loans))
        .route("/loans/:id", get(loans::get_loan))
        .route("/loans/:id/return", post(loans::return_loan))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
