//! Book administration done by book owners

use validator::Validate;

use crate::{
    error::{AppError, AppResult, ErrorCode},
    models::{
        account::Account,
        book::{Book, BookForm, PageRequest},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

/// Validate a create/modify body and trim its text fields
fn normalize(form: BookForm) -> AppResult<BookForm> {
    let blank_to_none = |v: Option<String>| {
        v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
    };
    let form = BookForm {
        book_id: blank_to_none(form.book_id),
        title: form.title.trim().to_string(),
        url: blank_to_none(form.url),
    };
    form.validate()?;
    Ok(form)
}

fn ensure_owner(book: &Book, account: &Account, action: &str) -> AppResult<()> {
    if book.is_owned_by(account.id) {
        return Ok(());
    }
    Err(AppError::service(
        ErrorCode::BookOwnershipWrong,
        format!("User can't {} others book", action),
    ))
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_books(&self, page: &PageRequest) -> AppResult<Vec<Book>> {
        let page = page.resolve()?;
        let books = self.repository.books.list(&page).await?;
        tracing::debug!("Listed {} books", books.len());
        Ok(books)
    }

    pub async fn get_book(&self, id: i64) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Onboard a new book owned by `owner`
    pub async fn create_book(&self, form: BookForm, owner: &Account) -> AppResult<Book> {
        let form = normalize(form)?;
        let book = self.repository.books.create(owner.id, &form).await?;
        tracing::info!(book = book.id, owner = owner.id, "Book onboarded");
        Ok(book)
    }

    /// Update title, external id and url of a book owned by `current`
    pub async fn modify_book(&self, id: i64, form: BookForm, current: &Account) -> AppResult<Book> {
        let form = normalize(form)?;
        let book = self.repository.books.get_by_id(id).await?;
        ensure_owner(&book, current, "modify")?;

        self.repository.books.update_details(id, &form).await
    }

    pub async fn delete_book(&self, id: i64, current: &Account) -> AppResult<()> {
        let book = self.repository.books.get_by_id(id).await?;
        ensure_owner(&book, current, "delete")?;

        if !self.repository.books.delete(id).await? {
            return Err(AppError::not_found(format!("Book with id {} not found", id)));
        }
        tracing::info!(book = id, owner = current.id, "Book deleted");
        Ok(())
    }

    /// Books owned by `owner_id`
    pub async fn list_my_books(&self, owner_id: i64, page: &PageRequest) -> AppResult<Vec<Book>> {
        let page = page.resolve()?;
        self.repository.books.list_by_owner(owner_id, &page).await
    }
}
