//! Loan (issue record) model and related types

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::book::non_blank;
use crate::error::{AppError, AppResult};

/// Date format used for issue and return dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Lifecycle of a loan. `Returned` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Outstanding,
    Returned,
}

impl LoanStatus {
    /// A blank or whitespace-only return date still counts as outstanding.
    pub fn from_return_date(return_date: Option<&str>) -> Self {
        match return_date {
            Some(date) if !date.trim().is_empty() => LoanStatus::Returned,
            _ => LoanStatus::Outstanding,
        }
    }
}

/// Loan model from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i64,
    pub book_id: i64,
    pub student_name: String,
    pub student_roll: String,
    pub issue_date: String,
    pub return_date: Option<String>,
}

impl Loan {
    pub fn status(&self) -> LoanStatus {
        LoanStatus::from_return_date(self.return_date.as_deref())
    }
}

/// Loan joined with the title of the book it refers to
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanDetails {
    pub id: i64,
    pub book_id: i64,
    /// `None` when the book has been deleted since the loan was issued
    pub book_title: Option<String>,
    pub student_name: String,
    pub student_roll: String,
    pub issue_date: String,
    pub return_date: Option<String>,
}

impl LoanDetails {
    pub fn status(&self) -> LoanStatus {
        LoanStatus::from_return_date(self.return_date.as_deref())
    }
}

/// Validated input for issuing one copy of a book
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct CreateLoan {
    pub book_id: i64,
    #[validate(length(min = 1, message = "Student name is required."))]
    pub student_name: String,
    #[validate(length(min = 1, message = "Student roll is required."))]
    pub student_roll: String,
    #[validate(length(min = 1, message = "Issue date is required."))]
    pub issue_date: String,
}

/// Issue form as submitted
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct IssueForm {
    pub student_name: String,
    pub student_roll: String,
    /// Defaults to today (YYYY-MM-DD)
    pub issue_date: Option<String>,
}

impl IssueForm {
    pub fn into_loan(self, book_id: i64) -> AppResult<CreateLoan> {
        let loan = CreateLoan {
            book_id,
            student_name: self.student_name.trim().to_string(),
            student_roll: self.student_roll.trim().to_string(),
            issue_date: non_blank(self.issue_date).unwrap_or_else(today),
        };

        loan.validate()?;
        Ok(loan)
    }
}

/// Return form as submitted
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ReturnForm {
    /// Defaults to today; must be YYYY-MM-DD
    pub return_date: Option<String>,
}

impl ReturnForm {
    /// The return date to record, checked against `YYYY-MM-DD`
    pub fn return_date(self) -> AppResult<String> {
        match non_blank(self.return_date) {
            None => Ok(today()),
            Some(date) => check_date(&date).map(|_| date),
        }
    }
}

/// Reject anything that is not a `YYYY-MM-DD` calendar date. A blank date
/// would leave the loan outstanding after its copy was restored.
pub fn check_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
        .map_err(|_| AppError::InvalidInput("Invalid date format. Use YYYY-MM-DD.".to_string()))
}

pub fn today() -> String {
    Local::now().date_naive().format(DATE_FORMAT).to_string()
}
