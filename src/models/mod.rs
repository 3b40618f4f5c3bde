//! Data models for the library desk

pub mod book;
pub mod loan;
pub mod outcome;

// Re-export commonly used types
pub use book::{Book, BookForm, NewBook};
pub use loan::{CreateLoan, IssueForm, Loan, LoanDetails, LoanStatus, ReturnForm};
pub use outcome::Outcome;
