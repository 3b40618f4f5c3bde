//! Loans repository for database operations

use sqlx::{Pool, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::loan::{CreateLoan, Loan, LoanDetails},
};

use super::books::BooksRepository;

const LOAN_COLUMNS: &str = "id, book_id, student_name, student_roll, issue_date, return_date";

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Sqlite>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>(&format!("SELECT {} FROM loans WHERE id = ?", LOAN_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Issued record not found.".to_string()))
    }

    /// Every loan with its book title, most recent issue first
    pub async fn list_issued(&self) -> AppResult<Vec<LoanDetails>> {
        let loans = sqlx::query_as::<_, LoanDetails>(
            r#"
            SELECT l.id, l.book_id, b.title AS book_title,
                   l.student_name, l.student_roll, l.issue_date, l.return_date
            FROM loans l
            LEFT JOIN books b ON b.id = l.book_id
            ORDER BY l.issue_date DESC, l.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    /// Issue one copy of a book.
    ///
    /// The copy count is taken with a conditional decrement rather than a
    /// read followed by a write, so two issues racing for the last copy
    /// cannot both succeed. The decrement and the new loan row commit
    /// together or not at all.
    pub async fn issue(&self, loan: &CreateLoan) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        if !BooksRepository::adjust_qty(&mut tx, loan.book_id, -1).await? {
            return if BooksRepository::exists(&mut tx, loan.book_id).await? {
                Err(AppError::NoCopiesAvailable)
            } else {
                Err(AppError::NotFound("Book not found".to_string()))
            };
        }

        let id = sqlx::query(
            "INSERT INTO loans (book_id, student_name, student_roll, issue_date) VALUES (?, ?, ?, ?)",
        )
        .bind(loan.book_id)
        .bind(&loan.student_name)
        .bind(&loan.student_roll)
        .bind(&loan.issue_date)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let created = sqlx::query_as::<_, Loan>(&format!("SELECT {} FROM loans WHERE id = ?", LOAN_COLUMNS))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    /// Close an outstanding loan and put its copy back on the shelf.
    ///
    /// Only the update guarded on an empty `return_date` may close the loan;
    /// when it touches nothing, the loan is either unknown or already closed,
    /// and the copy count is left alone.
    pub async fn return_loan(&self, loan_id: i64, return_date: &str) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        let closed = sqlx::query_as::<_, Loan>(&format!(
            r#"
            UPDATE loans SET return_date = ?
            WHERE id = ? AND (return_date IS NULL OR trim(return_date) = '')
            RETURNING {}
            "#,
            LOAN_COLUMNS
        ))
        .bind(return_date)
        .bind(loan_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(loan) = closed else {
            let existing: Option<Option<String>> =
                sqlx::query_scalar("SELECT return_date FROM loans WHERE id = ?")
                    .bind(loan_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            return Err(match existing {
                None => AppError::NotFound("Issued record not found.".to_string()),
                Some(previous) => AppError::AlreadyReturned {
                    return_date: previous.unwrap_or_default(),
                },
            });
        };

        if !BooksRepository::adjust_qty(&mut tx, loan.book_id, 1).await? {
            tracing::warn!(
                "Loan {} returned for deleted book {}; copy count not restored",
                loan.id,
                loan.book_id
            );
        }

        tx.commit().await?;
        Ok(loan)
    }

    /// Count loans without a return date
    pub async fn count_outstanding(&self, book_id: i64) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE book_id = ? AND (return_date IS NULL OR trim(return_date) = '')",
        )
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::testing,
        models::{book::NewBook, loan::LoanStatus},
    };

    async fn setup(qty: i64) -> (BooksRepository, LoansRepository, i64) {
        let pool = testing::pool().await;
        let books = BooksRepository::new(pool.clone());
        let loans = LoansRepository::new(pool);
        let book = books
            .create(&NewBook {
                qty,
                ..NewBook::new("Dune")
            })
            .await
            .unwrap();
        (books, loans, book.id)
    }

    fn request(book_id: i64, date: &str) -> CreateLoan {
        CreateLoan {
            book_id,
            student_name: "Alice".to_string(),
            student_roll: "R1".to_string(),
            issue_date: date.to_string(),
        }
    }

    #[tokio::test]
    async fn test_issue_decrements_and_records_outstanding_loan() {
        let (books, loans, book_id) = setup(2).await;

        let loan = loans.issue(&request(book_id, "2024-01-01")).await.unwrap();

        assert_eq!(loan.status(), LoanStatus::Outstanding);
        assert_eq!(loan.return_date, None);
        assert_eq!(books.get_by_id(book_id).await.unwrap().qty, 1);
        assert_eq!(loans.count_outstanding(book_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_issue_without_copies_changes_nothing() {
        let (books, loans, book_id) = setup(1).await;
        loans.issue(&request(book_id, "2024-01-01")).await.unwrap();

        let err = loans.issue(&request(book_id, "2024-01-02")).await.unwrap_err();

        assert!(matches!(err, AppError::NoCopiesAvailable));
        assert_eq!(books.get_by_id(book_id).await.unwrap().qty, 0);
        assert_eq!(loans.list_issued().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_issue_unknown_book() {
        let (_, loans, _) = setup(1).await;
        let err = loans.issue(&request(424242, "2024-01-01")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(loans.list_issued().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_return_once_then_already_returned() {
        let (books, loans, book_id) = setup(1).await;
        let loan = loans.issue(&request(book_id, "2024-01-01")).await.unwrap();

        let returned = loans.return_loan(loan.id, "2024-02-01").await.unwrap();
        assert_eq!(returned.return_date.as_deref(), Some("2024-02-01"));
        assert_eq!(books.get_by_id(book_id).await.unwrap().qty, 1);

        let err = loans.return_loan(loan.id, "2024-03-01").await.unwrap_err();
        match err {
            AppError::AlreadyReturned { return_date } => assert_eq!(return_date, "2024-02-01"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(books.get_by_id(book_id).await.unwrap().qty, 1);
        assert_eq!(
            loans.get_by_id(loan.id).await.unwrap().return_date.as_deref(),
            Some("2024-02-01")
        );
    }

    #[tokio::test]
    async fn test_blank_return_date_counts_as_outstanding() {
        let (books, loans, book_id) = setup(1).await;
        let loan = loans.issue(&request(book_id, "2024-01-01")).await.unwrap();
        sqlx::query("UPDATE loans SET return_date = '  ' WHERE id = ?")
            .bind(loan.id)
            .execute(&loans.pool)
            .await
            .unwrap();

        loans.return_loan(loan.id, "2024-02-01").await.unwrap();
        assert_eq!(books.get_by_id(book_id).await.unwrap().qty, 1);
    }

    #[tokio::test]
    async fn test_return_unknown_loan() {
        let (_, loans, _) = setup(1).await;
        let err = loans.return_loan(77, "2024-02-01").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_issued_newest_first_with_orphans() {
        let (books, loans, book_id) = setup(3).await;
        let older = loans.issue(&request(book_id, "2024-01-01")).await.unwrap();
        let newer = loans.issue(&request(book_id, "2024-03-01")).await.unwrap();
        let same_day = loans.issue(&request(book_id, "2024-03-01")).await.unwrap();

        let listed = loans.list_issued().await.unwrap();
        let ids: Vec<i64> = listed.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![same_day.id, newer.id, older.id]);
        assert!(listed.iter().all(|l| l.book_title.as_deref() == Some("Dune")));

        books.delete(book_id).await.unwrap();
        let listed = loans.list_issued().await.unwrap();
        assert_eq!(listed.len(), 3);
        assert!(listed.iter().all(|l| l.book_title.is_none()));
    }

    #[tokio::test]
    async fn test_return_after_book_deleted_closes_loan() {
        let (books, loans, book_id) = setup(1).await;
        let loan = loans.issue(&request(book_id, "2024-01-01")).await.unwrap();
        books.delete(book_id).await.unwrap();

        let returned = loans.return_loan(loan.id, "2024-02-01").await.unwrap();
        assert_eq!(returned.status(), LoanStatus::Returned);
        assert!(matches!(books.get_by_id(book_id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_concurrent_issues_for_last_copy() {
        let (books, loans, book_id) = setup(1).await;

        let first = request(book_id, "2024-01-01");
        let second = CreateLoan {
            student_name: "Bob".to_string(),
            student_roll: "R2".to_string(),
            ..request(book_id, "2024-01-01")
        };
        let (a, b) = tokio::join!(loans.issue(&first), loans.issue(&second));

        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(AppError::NoCopiesAvailable))));
        assert_eq!(books.get_by_id(book_id).await.unwrap().qty, 0);
    }

    #[tokio::test]
    async fn test_concurrent_returns_increment_once() {
        let (books, loans, book_id) = setup(1).await;
        let loan = loans.issue(&request(book_id, "2024-01-01")).await.unwrap();

        let (a, b) = tokio::join!(
            loans.return_loan(loan.id, "2024-02-01"),
            loans.return_loan(loan.id, "2024-02-02"),
        );

        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(AppError::AlreadyReturned { .. }))));
        assert_eq!(books.get_by_id(book_id).await.unwrap().qty, 1);
    }

    #[tokio::test]
    async fn test_qty_accounting_over_a_sequence() {
        let (books, loans, book_id) = setup(3).await;

        let mut issued = Vec::new();
        for day in 1..=3 {
            issued.push(loans.issue(&request(book_id, &format!("2024-01-0{}", day))).await.unwrap());
        }
        assert!(matches!(
            loans.issue(&request(book_id, "2024-01-04")).await,
            Err(AppError::NoCopiesAvailable)
        ));

        loans.return_loan(issued[0].id, "2024-02-01").await.unwrap();
        loans.return_loan(issued[2].id, "2024-02-01").await.unwrap();
        let _ = loans.return_loan(issued[2].id, "2024-02-02").await;

        // Q - N + M = 3 - 3 + 2
        assert_eq!(books.get_by_id(book_id).await.unwrap().qty, 2);
        assert_eq!(loans.count_outstanding(book_id).await.unwrap(), 1);
    }
}
