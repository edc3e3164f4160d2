//! API handlers for the lending REST endpoints

pub mod accounts;
pub mod books;
pub mod health;
pub mod openapi;

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    error::{AppError, ErrorCode},
    models::account::{Account, TokenQuery},
    AppState,
};

/// Extractor for the account behind the `token` query parameter
pub struct AuthenticatedAccount(pub Account);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedAccount {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<TokenQuery>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

        let token = query
            .token
            .ok_or_else(|| AppError::service(ErrorCode::NoToken, "No token in request"))?;

        let account = state.services.accounts.login_user(&token)?;
        Ok(AuthenticatedAccount(account))
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Accounts
        .route("/accounts/register", post(accounts::register))
        .route("/accounts/login", get(accounts::login).post(accounts::login))
        .route("/accounts/logout", get(accounts::logout).post(accounts::logout))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route("/books/:id", get(books::get_book))
        .route("/books/:id/modify", post(books::modify_book))
        .route("/books/:id/delete", get(books::delete_book).post(books::delete_book))
        .route("/mybook", get(books::list_my_books))
        // Borrow workflow
        .route(
            "/books/:id/request",
            get(books::apply_borrow_request).post(books::apply_borrow_request),
        )
        .route(
            "/books/:id/cancel",
            get(books::cancel_borrow_request).post(books::cancel_borrow_request),
        )
        .route(
            "/books/:id/confirm",
            get(books::mark_book_borrowed).post(books::mark_book_borrowed),
        )
        .route(
            "/books/:id/reject",
            get(books::reject_borrow_request).post(books::reject_borrow_request),
        )
        .route(
            "/books/:id/return",
            get(books::mark_book_returned).post(books::mark_book_returned),
        )
        .route("/myborrowedbook", get(books::list_my_borrowed_books))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
