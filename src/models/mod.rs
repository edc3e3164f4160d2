//! Data models for the lending server

pub mod account;
pub mod book;

// Re-export commonly used types
pub use account::{Account, AccountDto, NewAccount};
pub use book::{Book, BookDto, BookForm, BookStatus, Page, PageRequest};
