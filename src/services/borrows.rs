//! Borrow workflow: request, cancel, confirm, reject and return

use chrono::Utc;

use crate::{
    error::{AppError, AppResult, ErrorCode},
    models::{
        account::Account,
        book::{Book, BookStatus, PageRequest},
    },
    repository::{Repository, StatusTransition},
};

#[derive(Clone)]
pub struct BorrowService {
    repository: Repository,
}

fn status_wrong(message: &str) -> AppError {
    AppError::service(ErrorCode::BookStatusWrong, message)
}

fn ownership_wrong(message: &str) -> AppError {
    AppError::service(ErrorCode::BookOwnershipWrong, message)
}

impl BorrowService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// `borrower` asks the owner for an available book
    pub async fn apply_borrow_request(&self, id: i64, borrower: &Account) -> AppResult<Book> {
        let book = self.repository.books.get_by_id(id).await?;

        if book.status != BookStatus::Available {
            return Err(status_wrong("The book is not available"));
        }
        if book.is_owned_by(borrower.id) {
            return Err(ownership_wrong("User shouldn't borrow the book which is himself"));
        }

        self.apply(
            id,
            StatusTransition {
                from: BookStatus::Available,
                to: BookStatus::Requested,
                expected_borrower: None,
                borrower_id: Some(borrower.id),
                borrow_date: None,
            },
        )
        .await
    }

    /// `borrower` withdraws a pending request
    pub async fn cancel_borrow_request(&self, id: i64, borrower: &Account) -> AppResult<Book> {
        let book = self.repository.books.get_by_id(id).await?;

        if !book.is_borrowed_by(borrower.id) {
            return Err(ownership_wrong("User can't cancel other's borrowing request"));
        }
        if book.status != BookStatus::Requested {
            return Err(status_wrong("The book is not requested"));
        }

        self.apply(id, release(&book)).await
    }

    /// Owner hands the book over to the requester
    pub async fn mark_book_borrowed(&self, id: i64, owner: &Account) -> AppResult<Book> {
        let book = self.repository.books.get_by_id(id).await?;

        if !book.is_owned_by(owner.id) {
            return Err(ownership_wrong("User can't confirm others book"));
        }
        if book.status != BookStatus::Requested {
            return Err(status_wrong("The book is not requested"));
        }

        self.apply(
            id,
            StatusTransition {
                from: BookStatus::Requested,
                to: BookStatus::Borrowed,
                expected_borrower: current_borrower(&book),
                borrower_id: current_borrower(&book),
                borrow_date: Some(Utc::now()),
            },
        )
        .await
    }

    /// Owner turns down a pending request
    pub async fn reject_borrow_request(&self, id: i64, owner: &Account) -> AppResult<Book> {
        let book = self.repository.books.get_by_id(id).await?;

        if !book.is_owned_by(owner.id) {
            return Err(ownership_wrong("User can't reject others book"));
        }
        if book.status != BookStatus::Requested {
            return Err(status_wrong("The book is not requested"));
        }

        self.apply(id, release(&book)).await
    }

    /// Owner takes the book back
    pub async fn mark_book_returned(&self, id: i64, owner: &Account) -> AppResult<Book> {
        let book = self.repository.books.get_by_id(id).await?;

        if !book.is_owned_by(owner.id) {
            return Err(ownership_wrong("User can't make others book returned"));
        }
        if book.status != BookStatus::Borrowed {
            return Err(status_wrong("The book is not borrowed"));
        }

        self.apply(id, release(&book)).await
    }

    /// Books requested or borrowed by `borrower_id`
    pub async fn list_my_borrowed_books(
        &self,
        borrower_id: i64,
        page: &PageRequest,
    ) -> AppResult<Vec<Book>> {
        let page = page.resolve()?;
        self.repository.books.list_by_borrower(borrower_id, &page).await
    }

    async fn apply(&self, id: i64, transition: StatusTransition) -> AppResult<Book> {
        if !self.repository.books.transition(id, &transition).await? {
            // someone else moved the book, or swapped its borrower, since our read
            return Err(status_wrong("The book status has changed"));
        }

        tracing::info!(
            book = id,
            from = %transition.from,
            to = %transition.to,
            "Book status changed"
        );
        self.repository.books.get_by_id(id).await
    }
}

fn current_borrower(book: &Book) -> Option<i64> {
    book.borrower.as_ref().map(|b| b.id)
}

/// Back to the shelf: no borrower, no borrow date
fn release(book: &Book) -> StatusTransition {
    StatusTransition {
        from: book.status,
        to: BookStatus::Available,
        expected_borrower: current_borrower(book),
        borrower_id: None,
        borrow_date: None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        models::account::AccountDto,
        repository::{accounts::MockAccountsRepository, books::MockBooksRepository},
    };

    const OWNER: i64 = 1;
    const READER: i64 = 2;
    const STRANGER: i64 = 3;

    fn account(id: i64) -> Account {
        Account {
            id,
            email: format!("user{}@example.com", id),
            name: None,
            hash_password: String::new(),
        }
    }

    fn book(status: BookStatus, borrower: Option<i64>) -> Book {
        Book {
            id: 100,
            book_id: Some("B-100".to_string()),
            title: "Programming Rust".to_string(),
            url: None,
            status,
            owner: AccountDto::from(&account(OWNER)),
            borrower: borrower.map(|id| AccountDto::from(&account(id))),
            onboard_date: Utc::now(),
            borrow_date: if status == BookStatus::Borrowed {
                Some(Utc::now())
            } else {
                None
            },
        }
    }

    fn service(books: MockBooksRepository) -> BorrowService {
        BorrowService::new(Repository::from_parts(
            Arc::new(MockAccountsRepository::new()),
            Arc::new(books),
        ))
    }

    /// Mock that serves `before`, expects one matching transition, then serves `after`
    fn successful_flow(
        before: Book,
        after: Book,
        expected: impl Fn(&StatusTransition) -> bool + Send + 'static,
    ) -> MockBooksRepository {
        let mut books = MockBooksRepository::new();
        let mut reads = 0;
        books.expect_get_by_id().times(2).returning(move |_| {
            reads += 1;
            if reads == 1 {
                Ok(before.clone())
            } else {
                Ok(after.clone())
            }
        });
        books
            .expect_transition()
            .withf(move |id, t| *id == 100 && expected(t))
            .times(1)
            .returning(|_, _| Ok(true));
        books
    }

    /// Mock that serves `current` and must never be updated
    fn rejected_flow(current: Book) -> MockBooksRepository {
        let mut books = MockBooksRepository::new();
        books
            .expect_get_by_id()
            .returning(move |_| Ok(current.clone()));
        books.expect_transition().never();
        books
    }

    /// Mock that serves `current` once and whose update finds the row changed
    fn lost_race(current: Book) -> MockBooksRepository {
        let mut books = MockBooksRepository::new();
        books
            .expect_get_by_id()
            .times(1)
            .returning(move |_| Ok(current.clone()));
        books.expect_transition().times(1).returning(|_, _| Ok(false));
        books
    }

    #[tokio::test]
    async fn test_apply_borrow_request() {
        let books = successful_flow(
            book(BookStatus::Available, None),
            book(BookStatus::Requested, Some(READER)),
            |t| {
                t.from == BookStatus::Available
                    && t.to == BookStatus::Requested
                    && t.expected_borrower.is_none()
                    && t.borrower_id == Some(READER)
                    && t.borrow_date.is_none()
            },
        );

        let updated = service(books)
            .apply_borrow_request(100, &account(READER))
            .await
            .unwrap();
        assert_eq!(updated.status, BookStatus::Requested);
        assert!(updated.is_borrowed_by(READER));
    }

    #[tokio::test]
    async fn test_apply_for_unavailable_book() {
        let books = rejected_flow(book(BookStatus::Requested, Some(READER)));

        let err = service(books)
            .apply_borrow_request(100, &account(STRANGER))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BookStatusWrong);
    }

    #[tokio::test]
    async fn test_owner_cannot_borrow_own_book() {
        let books = rejected_flow(book(BookStatus::Available, None));

        let err = service(books)
            .apply_borrow_request(100, &account(OWNER))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BookOwnershipWrong);
    }

    #[tokio::test]
    async fn test_lost_race_reports_status_wrong() {
        let err = service(lost_race(book(BookStatus::Available, None)))
            .apply_borrow_request(100, &account(READER))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BookStatusWrong);
    }

    #[tokio::test]
    async fn test_cancel_borrow_request() {
        let books = successful_flow(
            book(BookStatus::Requested, Some(READER)),
            book(BookStatus::Available, None),
            |t| {
                t.from == BookStatus::Requested
                    && t.to == BookStatus::Available
                    && t.expected_borrower == Some(READER)
                    && t.borrower_id.is_none()
            },
        );

        let updated = service(books)
            .cancel_borrow_request(100, &account(READER))
            .await
            .unwrap();
        assert_eq!(updated.status, BookStatus::Available);
        assert!(updated.borrower.is_none());
    }

    #[tokio::test]
    async fn test_cancel_someone_elses_request() {
        let books = rejected_flow(book(BookStatus::Requested, Some(READER)));

        let err = service(books)
            .cancel_borrow_request(100, &account(STRANGER))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BookOwnershipWrong);
    }

    #[tokio::test]
    async fn test_cancel_after_confirmation() {
        let books = rejected_flow(book(BookStatus::Borrowed, Some(READER)));

        let err = service(books)
            .cancel_borrow_request(100, &account(READER))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BookStatusWrong);
    }

    #[tokio::test]
    async fn test_confirm_sets_borrow_date() {
        let books = successful_flow(
            book(BookStatus::Requested, Some(READER)),
            book(BookStatus::Borrowed, Some(READER)),
            |t| {
                t.from == BookStatus::Requested
                    && t.to == BookStatus::Borrowed
                    && t.expected_borrower == Some(READER)
                    && t.borrower_id == Some(READER)
                    && t.borrow_date.is_some()
            },
        );

        let updated = service(books)
            .mark_book_borrowed(100, &account(OWNER))
            .await
            .unwrap();
        assert_eq!(updated.status, BookStatus::Borrowed);
        assert!(updated.borrow_date.is_some());
    }

    #[tokio::test]
    async fn test_only_owner_confirms() {
        let books = rejected_flow(book(BookStatus::Requested, Some(READER)));

        let err = service(books)
            .mark_book_borrowed(100, &account(READER))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BookOwnershipWrong);
    }

    #[tokio::test]
    async fn test_confirm_without_request() {
        let books = rejected_flow(book(BookStatus::Available, None));

        let err = service(books)
            .mark_book_borrowed(100, &account(OWNER))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BookStatusWrong);
    }

    #[tokio::test]
    async fn test_reject_borrow_request() {
        let books = successful_flow(
            book(BookStatus::Requested, Some(READER)),
            book(BookStatus::Available, None),
            |t| {
                t.from == BookStatus::Requested
                    && t.to == BookStatus::Available
                    && t.expected_borrower == Some(READER)
                    && t.borrower_id.is_none()
            },
        );

        let updated = service(books)
            .reject_borrow_request(100, &account(OWNER))
            .await
            .unwrap();
        assert_eq!(updated.status, BookStatus::Available);
    }

    #[tokio::test]
    async fn test_reject_by_requester() {
        let books = rejected_flow(book(BookStatus::Requested, Some(READER)));

        let err = service(books)
            .reject_borrow_request(100, &account(READER))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BookOwnershipWrong);
    }

    #[tokio::test]
    async fn test_return_clears_borrower_and_date() {
        let books = successful_flow(
            book(BookStatus::Borrowed, Some(READER)),
            book(BookStatus::Available, None),
            |t| {
                t.from == BookStatus::Borrowed
                    && t.to == BookStatus::Available
                    && t.expected_borrower == Some(READER)
                    && t.borrower_id.is_none()
                    && t.borrow_date.is_none()
            },
        );

        let updated = service(books)
            .mark_book_returned(100, &account(OWNER))
            .await
            .unwrap();
        assert_eq!(updated.status, BookStatus::Available);
        assert!(updated.borrow_date.is_none());
    }

    #[tokio::test]
    async fn test_return_of_book_not_lent() {
        let books = rejected_flow(book(BookStatus::Requested, Some(READER)));

        let err = service(books)
            .mark_book_returned(100, &account(OWNER))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BookStatusWrong);
    }

    #[tokio::test]
    async fn test_missing_book() {
        let mut books = MockBooksRepository::new();
        books
            .expect_get_by_id()
            .returning(|id| Err(AppError::not_found(format!("Book with id {} not found", id))));
        books.expect_transition().never();

        let err = service(books)
            .apply_borrow_request(100, &account(READER))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_list_my_borrowed_books() {
        let mut books = MockBooksRepository::new();
        books
            .expect_list_by_borrower()
            .withf(|borrower, page| *borrower == READER && page.offset == 0)
            .returning(|_, _| {
                Ok(vec![
                    book(BookStatus::Requested, Some(READER)),
                    book(BookStatus::Borrowed, Some(READER)),
                ])
            });

        let borrowed = service(books)
            .list_my_borrowed_books(READER, &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(borrowed.len(), 2);
        assert!(borrowed.iter().all(|b| b.is_borrowed_by(READER)));
    }

    #[tokio::test]
    async fn test_every_action_reports_lost_race() {
        let requested = || book(BookStatus::Requested, Some(READER));

        let err = service(lost_race(requested()))
            .cancel_borrow_request(100, &account(READER))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BookStatusWrong);

        let err = service(lost_race(requested()))
            .mark_book_borrowed(100, &account(OWNER))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BookStatusWrong);

        let err = service(lost_race(requested()))
            .reject_borrow_request(100, &account(OWNER))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BookStatusWrong);

        let err = service(lost_race(book(BookStatus::Borrowed, Some(READER))))
            .mark_book_returned(100, &account(OWNER))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BookStatusWrong);
    }

    /// The read shows READER as requester, but by update time READER has
    /// cancelled and STRANGER has requested: same status, different borrower.
    fn requester_swapped() -> MockBooksRepository {
        let mut books = MockBooksRepository::new();
        books
            .expect_get_by_id()
            .times(1)
            .returning(|_| Ok(book(BookStatus::Requested, Some(READER))));
        books
            .expect_transition()
            .times(1)
            .returning(|_, t| {
                Ok(t.from == BookStatus::Requested && t.expected_borrower == Some(STRANGER))
            });
        books
    }

    #[tokio::test]
    async fn test_confirm_does_not_lend_to_withdrawn_requester() {
        let err = service(requester_swapped())
            .mark_book_borrowed(100, &account(OWNER))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BookStatusWrong);
    }

    #[tokio::test]
    async fn test_stale_cancel_and_reject_keep_new_request() {
        let err = service(requester_swapped())
            .cancel_borrow_request(100, &account(READER))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BookStatusWrong);

        let err = service(requester_swapped())
            .reject_borrow_request(100, &account(OWNER))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BookStatusWrong);
    }
}
