//! Book endpoints: catalogue, administration and the borrow workflow

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        account::TokenQuery,
        book::{Book, BookDto, BookForm, PageRequest},
    },
    AppState,
};

use super::AuthenticatedAccount;

fn to_dtos(books: Vec<Book>) -> Vec<BookDto> {
    books.into_iter().map(BookDto::from).collect()
}

/// List all books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(PageRequest),
    responses(
        (status = 200, description = "Page of books", body = Vec<BookDto>),
        (status = 400, description = "Invalid sort", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> AppResult<Json<Vec<BookDto>>> {
    let books = state.services.catalog.list_books(&page).await?;
    Ok(Json(to_dtos(books)))
}

/// Get one book
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookDto),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<BookDto>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book.into()))
}

/// Onboard a new book owned by the current account
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    params(TokenQuery),
    request_body = BookForm,
    responses(
        (status = 201, description = "Book created", body = BookDto),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 401, description = "Not logged in", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    Json(form): Json<BookForm>,
) -> AppResult<(StatusCode, Json<BookDto>)> {
    let book = state.services.catalog.create_book(form, &account).await?;
    Ok((StatusCode::CREATED, Json(book.into())))
}

/// Modify a book owned by the current account
#[utoipa::path(
    post,
    path = "/books/{id}/modify",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID"),
        TokenQuery
    ),
    request_body = BookForm,
    responses(
        (status = 200, description = "Book updated", body = BookDto),
        (status = 403, description = "Not the owner", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn modify_book(
    State(state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    Path(id): Path<i64>,
    Json(form): Json<BookForm>,
) -> AppResult<Json<BookDto>> {
    let book = state.services.catalog.modify_book(id, form, &account).await?;
    Ok(Json(book.into()))
}

/// Delete a book owned by the current account (GET or POST)
#[utoipa::path(
    post,
    path = "/books/{id}/delete",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID"),
        TokenQuery
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 403, description = "Not the owner", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete_book(id, &account).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Ask to borrow a book (GET or POST)
#[utoipa::path(
    post,
    path = "/books/{id}/request",
    tag = "borrows",
    params(
        ("id" = i64, Path, description = "Book ID"),
        TokenQuery
    ),
    responses(
        (status = 200, description = "Book requested", body = BookDto),
        (status = 403, description = "Book not available or owned by requester", body = crate::error::ErrorResponse)
    )
)]
pub async fn apply_borrow_request(
    State(state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    Path(id): Path<i64>,
) -> AppResult<Json<BookDto>> {
    let book = state.services.borrows.apply_borrow_request(id, &account).await?;
    Ok(Json(book.into()))
}

/// Withdraw a pending borrow request (GET or POST)
#[utoipa::path(
    post,
    path = "/books/{id}/cancel",
    tag = "borrows",
    params(
        ("id" = i64, Path, description = "Book ID"),
        TokenQuery
    ),
    responses(
        (status = 200, description = "Request cancelled", body = BookDto),
        (status = 403, description = "Not the requester or not requested", body = crate::error::ErrorResponse)
    )
)]
pub async fn cancel_borrow_request(
    State(state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    Path(id): Path<i64>,
) -> AppResult<Json<BookDto>> {
    let book = state.services.borrows.cancel_borrow_request(id, &account).await?;
    Ok(Json(book.into()))
}

/// Confirm a borrow request as the owner (GET or POST)
#[utoipa::path(
    post,
    path = "/books/{id}/confirm",
    tag = "borrows",
    params(
        ("id" = i64, Path, description = "Book ID"),
        TokenQuery
    ),
    responses(
        (status = 200, description = "Book lent", body = BookDto),
        (status = 403, description = "Not the owner or not requested", body = crate::error::ErrorResponse)
    )
)]
pub async fn mark_book_borrowed(
    State(state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    Path(id): Path<i64>,
) -> AppResult<Json<BookDto>> {
    let book = state.services.borrows.mark_book_borrowed(id, &account).await?;
    Ok(Json(book.into()))
}

/// Reject a borrow request as the owner (GET or POST)
#[utoipa::path(
    post,
    path = "/books/{id}/reject",
    tag = "borrows",
    params(
        ("id" = i64, Path, description = "Book ID"),
        TokenQuery
    ),
    responses(
        (status = 200, description = "Request rejected", body = BookDto),
        (status = 403, description = "Not the owner or not requested", body = crate::error::ErrorResponse)
    )
)]
pub async fn reject_borrow_request(
    State(state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    Path(id): Path<i64>,
) -> AppResult<Json<BookDto>> {
    let book = state.services.borrows.reject_borrow_request(id, &account).await?;
    Ok(Json(book.into()))
}

/// Mark a lent book as returned, as the owner (GET or POST)
#[utoipa::path(
    post,
    path = "/books/{id}/return",
    tag = "borrows",
    params(
        ("id" = i64, Path, description = "Book ID"),
        TokenQuery
    ),
    responses(
        (status = 200, description = "Book returned", body = BookDto),
        (status = 403, description = "Not the owner or not borrowed", body = crate::error::ErrorResponse)
    )
)]
pub async fn mark_book_returned(
    State(state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    Path(id): Path<i64>,
) -> AppResult<Json<BookDto>> {
    let book = state.services.borrows.mark_book_returned(id, &account).await?;
    Ok(Json(book.into()))
}

/// Books owned by the current account
#[utoipa::path(
    get,
    path = "/mybook",
    tag = "books",
    params(TokenQuery, PageRequest),
    responses(
        (status = 200, description = "Owned books", body = Vec<BookDto>),
        (status = 401, description = "Not logged in", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_my_books(
    State(state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    Query(page): Query<PageRequest>,
) -> AppResult<Json<Vec<BookDto>>> {
    let books = state.services.catalog.list_my_books(account.id, &page).await?;
    Ok(Json(to_dtos(books)))
}

/// Books requested or borrowed by the current account
#[utoipa::path(
    get,
    path = "/myborrowedbook",
    tag = "borrows",
    params(TokenQuery, PageRequest),
    responses(
        (status = 200, description = "Borrowed books", body = Vec<BookDto>),
        (status = 401, description = "Not logged in", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_my_borrowed_books(
    State(state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    Query(page): Query<PageRequest>,
) -> AppResult<Json<Vec<BookDto>>> {
    let books = state
        .services
        .borrows
        .list_my_borrowed_books(account.id, &page)
        .await?;
    Ok(Json(to_dtos(books)))
}
