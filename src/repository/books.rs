//! Books repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookForm, BookRow, BookStatus, Page},
};

const SELECT_BOOKS: &str = r#"
    SELECT b.id, b.book_id, b.title, b.url, b.status, b.onboard_date, b.borrow_date,
           o.id AS owner_id, o.email AS owner_email, o.name AS owner_name,
           br.id AS borrower_id, br.email AS borrower_email, br.name AS borrower_name
    FROM books b
    JOIN accounts o ON o.id = b.owner_id
    LEFT JOIN accounts br ON br.id = b.borrower_id
"#;

/// Status change applied only while the book is still in `from` and still
/// held by `expected_borrower`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    pub from: BookStatus,
    pub to: BookStatus,
    pub expected_borrower: Option<i64>,
    pub borrower_id: Option<i64>,
    pub borrow_date: Option<DateTime<Utc>>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BooksRepository: Send + Sync {
    /// Get book by ID
    async fn get_by_id(&self, id: i64) -> AppResult<Book>;

    async fn list(&self, page: &Page) -> AppResult<Vec<Book>>;

    async fn list_by_owner(&self, owner_id: i64, page: &Page) -> AppResult<Vec<Book>>;

    async fn list_by_borrower(&self, borrower_id: i64, page: &Page) -> AppResult<Vec<Book>>;

    /// Insert an available book owned by `owner_id`
    async fn create(&self, owner_id: i64, form: &BookForm) -> AppResult<Book>;

    /// Overwrite the descriptive fields of a book
    async fn update_details(&self, id: i64, form: &BookForm) -> AppResult<Book>;

    /// Returns false when no row was deleted
    async fn delete(&self, id: i64) -> AppResult<bool>;

    /// Returns false when the book left `transition.from` or changed borrower
    async fn transition(&self, id: i64, transition: &StatusTransition) -> AppResult<bool>;
}

#[derive(Clone)]
pub struct PgBooksRepository {
    pool: Pool<Postgres>,
}

impl PgBooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// `filter` pairs an account column with the account it must match
    async fn fetch_page(
        &self,
        filter: Option<(&'static str, i64)>,
        page: &Page,
    ) -> AppResult<Vec<Book>> {
        let rows = match filter {
            Some((column, account_id)) => {
                let sql = format!(
                    "{} WHERE {} = $1 ORDER BY {} LIMIT $2 OFFSET $3",
                    SELECT_BOOKS,
                    column,
                    page.order_by()
                );
                sqlx::query_as::<_, BookRow>(&sql)
                    .bind(account_id)
                    .bind(page.limit)
                    .bind(page.offset)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "{} ORDER BY {} LIMIT $1 OFFSET $2",
                    SELECT_BOOKS,
                    page.order_by()
                );
                sqlx::query_as::<_, BookRow>(&sql)
                    .bind(page.limit)
                    .bind(page.offset)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter().map(Book::try_from).collect()
    }
}

#[async_trait]
impl BooksRepository for PgBooksRepository {
    async fn get_by_id(&self, id: i64) -> AppResult<Book> {
        let sql = format!("{} WHERE b.id = $1", SELECT_BOOKS);
        let row = sqlx::query_as::<_, BookRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Book with id {} not found", id)))?;

        Book::try_from(row)
    }

    async fn list(&self, page: &Page) -> AppResult<Vec<Book>> {
        self.fetch_page(None, page).await
    }

    async fn list_by_owner(&self, owner_id: i64, page: &Page) -> AppResult<Vec<Book>> {
        self.fetch_page(Some(("b.owner_id", owner_id)), page).await
    }

    async fn list_by_borrower(&self, borrower_id: i64, page: &Page) -> AppResult<Vec<Book>> {
        self.fetch_page(Some(("b.borrower_id", borrower_id)), page).await
    }

    async fn create(&self, owner_id: i64, form: &BookForm) -> AppResult<Book> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO books (book_id, title, url, status, owner_id, onboard_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&form.book_id)
        .bind(&form.title)
        .bind(&form.url)
        .bind(BookStatus::Available.as_str())
        .bind(owner_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    async fn update_details(&self, id: i64, form: &BookForm) -> AppResult<Book> {
        let result = sqlx::query("UPDATE books SET book_id = $2, title = $3, url = $4 WHERE id = $1")
            .bind(id)
            .bind(&form.book_id)
            .bind(&form.title)
            .bind(&form.url)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Book with id {} not found", id)));
        }

        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn transition(&self, id: i64, transition: &StatusTransition) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET status = $2, borrower_id = $3, borrow_date = $4
            WHERE id = $1 AND status = $5 AND borrower_id IS NOT DISTINCT FROM $6
            "#,
        )
        .bind(id)
        .bind(transition.to.as_str())
        .bind(transition.borrower_id)
        .bind(transition.borrow_date)
        .bind(transition.from.as_str())
        .bind(transition.expected_borrower)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
