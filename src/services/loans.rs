//! Loan ledger service

use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        loan::{check_date, CreateLoan, IssueForm, Loan, LoanDetails, ReturnForm},
        Outcome,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Issue one copy of a book to a student
    pub async fn issue_book(&self, loan: CreateLoan) -> AppResult<Outcome> {
        Outcome::from_result(self.issue(loan).await)
    }

    async fn issue(&self, loan: CreateLoan) -> AppResult<Outcome> {
        loan.validate()?;
        let created = self.repository.loans.issue(&loan).await?;
        tracing::info!(
            "Ledger: issued book id={} to {} ({}) as loan id={}",
            created.book_id,
            created.student_name,
            created.student_roll,
            created.id
        );
        Ok(Outcome::created(created.id, "Issued"))
    }

    /// Normalize a raw issue form, then issue the book
    pub async fn issue_book_form(&self, book_id: i64, form: IssueForm) -> AppResult<Outcome> {
        match form.into_loan(book_id) {
            Ok(loan) => self.issue_book(loan).await,
            Err(err) => Outcome::from_result(Err(err)),
        }
    }

    /// All loans, most recently issued first
    pub async fn list_issued(&self) -> AppResult<Vec<LoanDetails>> {
        self.repository.loans.list_issued().await
    }

    /// Get a single loan
    pub async fn get_loan(&self, id: i64) -> AppResult<Loan> {
        self.repository.loans.get_by_id(id).await
    }

    /// Record the return of an outstanding loan
    pub async fn return_book(&self, loan_id: i64, return_date: &str) -> AppResult<Outcome> {
        Outcome::from_result(self.close(loan_id, return_date).await)
    }

    async fn close(&self, loan_id: i64, return_date: &str) -> AppResult<Outcome> {
        check_date(return_date)?;
        let loan = self
            .repository
            .loans
            .return_loan(loan_id, return_date.trim())
            .await?;
        tracing::info!("Ledger: loan id={} returned on {}", loan.id, return_date.trim());
        Ok(Outcome::ok("Return recorded."))
    }

    /// Return with the date from a raw form (today when left blank)
    pub async fn return_book_form(&self, loan_id: i64, form: ReturnForm) -> AppResult<Outcome> {
        match form.return_date() {
            Ok(date) => self.return_book(loan_id, &date).await,
            Err(err) => Outcome::from_result(Err(err)),
        }
    }
}
