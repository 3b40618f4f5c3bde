//! Catalog management service

use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookForm, NewBook},
        Outcome,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Add a book. A clashing ISBN yields a failed outcome and leaves the
    /// existing book untouched.
    pub async fn add_book(&self, book: NewBook) -> AppResult<Outcome> {
        Outcome::from_result(self.insert(book).await)
    }

    async fn insert(&self, mut book: NewBook) -> AppResult<Outcome> {
        book.validate()?;
        if book.qty < 1 {
            book.qty = 1;
        }
        let created = self.repository.books.create(&book).await?;
        tracing::info!(
            "Catalog: added book id={} \"{}\" qty={}",
            created.id,
            created.title,
            created.qty
        );
        Ok(Outcome::created(created.id, "Book added."))
    }

    /// Normalize a raw add form, then add the book
    pub async fn add_book_form(&self, form: BookForm) -> AppResult<Outcome> {
        match NewBook::try_from(form) {
            Ok(book) => self.add_book(book).await,
            Err(err) => Outcome::from_result(Err(err)),
        }
    }

    /// Get a single book
    pub async fn get_book(&self, id: i64) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// All books ordered by title
    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    /// Books matching `term` in title, author or ISBN
    pub async fn search_books(&self, term: &str) -> AppResult<Vec<Book>> {
        tracing::debug!("Catalog search: {:?}", term);
        self.repository.books.search(term).await
    }

    /// Search when a non-blank term is given, otherwise list everything
    pub async fn browse(&self, term: Option<&str>) -> AppResult<Vec<Book>> {
        match term.map(str::trim).filter(|t| !t.is_empty()) {
            Some(term) => self.search_books(term).await,
            None => self.list_books().await,
        }
    }

    /// Delete a book. Unknown ids are a no-op; loans pointing at the book
    /// are kept and show up without a title afterwards.
    pub async fn delete_book(&self, id: i64) -> AppResult<Outcome> {
        let outstanding = self.repository.loans.count_outstanding(id).await?;
        if self.repository.books.delete(id).await? {
            if outstanding > 0 {
                tracing::warn!("Catalog: deleted book id={} with {} outstanding loan(s)", id, outstanding);
            } else {
                tracing::info!("Catalog: deleted book id={}", id);
            }
        }
        Ok(Outcome::ok("Book deleted."))
    }
}
