//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{accounts, books, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Book Lending API",
        version = "0.1.0",
        description = "Lend books to other readers: accounts, book administration and borrowing",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Accounts
        accounts::register,
        accounts::login,
        accounts::logout,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::modify_book,
        books::delete_book,
        books::list_my_books,
        // Borrows
        books::apply_borrow_request,
        books::cancel_borrow_request,
        books::mark_book_borrowed,
        books::reject_borrow_request,
        books::mark_book_returned,
        books::list_my_borrowed_books,
    ),
    components(
        schemas(
            crate::models::account::AccountDto,
            crate::models::account::LoginResponse,
            crate::models::book::BookDto,
            crate::models::book::BookForm,
            crate::models::book::BookStatus,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "accounts", description = "Registration and sessions"),
        (name = "books", description = "Book administration"),
        (name = "borrows", description = "Borrow workflow")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
