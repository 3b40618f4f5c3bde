//! Loan management endpoints

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::{IssueForm, Loan, LoanDetails, ReturnForm},
        Outcome,
    },
    AppState,
};

use super::reply;

/// Issue one copy of a book to a student
#[utoipa::path(
    post,
    path = "/books/{id}/issue",
    tag = "loans",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    request_body = IssueForm,
    responses(
        (status = 201, description = "Book issued", body = Outcome),
        (status = 400, description = "Student details missing", body = Outcome),
        (status = 404, description = "Book not found", body = Outcome),
        (status = 422, description = "No copies available", body = Outcome)
    )
)]
pub async fn issue_book(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
    Json(form): Json<IssueForm>,
) -> AppResult<(StatusCode, Json<Outcome>)> {
    let outcome = state.services.loans.issue_book_form(book_id, form).await?;
    Ok(reply(outcome, StatusCode::CREATED))
}

/// List every loan, most recently issued first
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    responses(
        (status = 200, description = "Loans with book titles", body = Vec<LoanDetails>)
    )
)]
pub async fn list_loans(State(state): State<AppState>) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state.services.loans.list_issued().await?;
    Ok(Json(loans))
}

/// Get a loan by ID
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    params(
        ("id" = i64, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan", body = Loan),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.get_loan(id).await?;
    Ok(Json(loan))
}

/// Record the return of a loan
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    params(
        ("id" = i64, Path, description = "Loan ID")
    ),
    request_body = ReturnForm,
    responses(
        (status = 200, description = "Return recorded", body = Outcome),
        (status = 400, description = "Invalid date format", body = Outcome),
        (status = 404, description = "Loan not found", body = Outcome),
        (status = 409, description = "Already returned", body = Outcome)
    )
)]
pub async fn return_loan(
    State(state): State<AppState>,
    Path(loan_id): Path<i64>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<Outcome>)> {
    // An empty body means "returned today"; anything else must parse.
    let form = if body.iter().all(u8::is_ascii_whitespace) {
        ReturnForm::default()
    } else {
        match serde_json::from_slice::<ReturnForm>(&body) {
            Ok(form) => form,
            Err(err) => {
                let err = AppError::InvalidInput(format!("Invalid request body: {}", err));
                return Ok(reply(Outcome::from_result(Err(err))?, StatusCode::OK));
            }
        }
    };
    let outcome = state.services.loans.return_book_form(loan_id, form).await?;
    Ok(reply(outcome, StatusCode::OK))
}
