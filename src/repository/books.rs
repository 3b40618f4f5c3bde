//! Books repository for database operations

use sqlx::{Pool, Sqlite, SqliteConnection};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, NewBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Sqlite>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT id, title, author, year, isbn, qty FROM books WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    /// Insert a new book. The unique index on `isbn` is the duplicate check.
    pub async fn create(&self, book: &NewBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query("INSERT INTO books (title, author, year, isbn, qty) VALUES (?, ?, ?, ?, ?)")
            .bind(&book.title)
            .bind(&book.author)
            .bind(book.year)
            .bind(&book.isbn)
            .bind(book.qty)
            .execute(&mut *tx)
            .await
            .map_err(|err| match err {
                sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                    AppError::DuplicateKey("Book with same ISBN already exists.".to_string())
                }
                other => other.into(),
            })?
            .last_insert_rowid();

        let created = sqlx::query_as::<_, Book>("SELECT id, title, author, year, isbn, qty FROM books WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    /// All books by title; equal titles keep insertion order
    pub async fn list(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT id, title, author, year, isbn, qty FROM books ORDER BY title, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// Books whose title, author or ISBN contains `term`
    pub async fn search(&self, term: &str) -> AppResult<Vec<Book>> {
        let like = format!("%{}%", term);

        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, author, year, isbn, qty
            FROM books
            WHERE title LIKE ? OR author LIKE ? OR isbn LIKE ?
            ORDER BY title, id
            "#,
        )
        .bind(&like)
        .bind(&like)
        .bind(&like)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// Delete a book, returning whether a row was removed. Loans that
    /// reference it are left in place.
    pub async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Apply `delta` to a book's copy count inside the caller's unit of work.
    ///
    /// The write only happens when the result stays non-negative, so a
    /// `false` return means either the book is gone or it has too few copies.
    pub(crate) async fn adjust_qty(conn: &mut SqliteConnection, id: i64, delta: i64) -> AppResult<bool> {
        let result = sqlx::query("UPDATE books SET qty = qty + ? WHERE id = ? AND qty + ? >= 0")
            .bind(delta)
            .bind(id)
            .bind(delta)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    pub(crate) async fn exists(conn: &mut SqliteConnection, id: i64) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = ?)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(exists)
    }
}
