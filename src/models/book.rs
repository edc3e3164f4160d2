//! Book model, API shapes and paging parameters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::account::AccountDto;
use crate::error::{AppError, AppResult};

/// Lending status of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    Available,
    Requested,
    Borrowed,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "available",
            BookStatus::Requested => "requested",
            BookStatus::Borrowed => "borrowed",
        }
    }
}

impl std::str::FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(BookStatus::Available),
            "requested" => Ok(BookStatus::Requested),
            "borrowed" => Ok(BookStatus::Borrowed),
            other => Err(format!("Unknown book status: {}", other)),
        }
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Book with its owner and current borrower resolved
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub id: i64,
    pub book_id: Option<String>,
    pub title: String,
    pub url: Option<String>,
    pub status: BookStatus,
    pub owner: AccountDto,
    pub borrower: Option<AccountDto>,
    pub onboard_date: DateTime<Utc>,
    pub borrow_date: Option<DateTime<Utc>>,
}

impl Book {
    pub fn is_owned_by(&self, account_id: i64) -> bool {
        self.owner.id == account_id
    }

    pub fn is_borrowed_by(&self, account_id: i64) -> bool {
        self.borrower.as_ref().map(|b| b.id == account_id).unwrap_or(false)
    }
}

/// Flat row produced by the books/accounts join
#[derive(Debug, Clone, FromRow)]
pub struct BookRow {
    pub id: i64,
    pub book_id: Option<String>,
    pub title: String,
    pub url: Option<String>,
    pub status: String,
    pub onboard_date: DateTime<Utc>,
    pub borrow_date: Option<DateTime<Utc>>,
    pub owner_id: i64,
    pub owner_email: String,
    pub owner_name: Option<String>,
    pub borrower_id: Option<i64>,
    pub borrower_email: Option<String>,
    pub borrower_name: Option<String>,
}

impl TryFrom<BookRow> for Book {
    type Error = AppError;

    fn try_from(row: BookRow) -> AppResult<Self> {
        let status = row.status.parse::<BookStatus>().map_err(AppError::Internal)?;

        let borrower = match (row.borrower_id, row.borrower_email) {
            (Some(id), Some(email)) => Some(AccountDto {
                id,
                email,
                name: row.borrower_name,
            }),
            _ => None,
        };

        Ok(Book {
            id: row.id,
            book_id: row.book_id,
            title: row.title,
            url: row.url,
            status,
            owner: AccountDto {
                id: row.owner_id,
                email: row.owner_email,
                name: row.owner_name,
            },
            borrower,
            onboard_date: row.onboard_date,
            borrow_date: row.borrow_date,
        })
    }
}

/// Book as exchanged with API clients
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookDto {
    pub id: i64,
    pub book_id: Option<String>,
    pub title: String,
    pub url: Option<String>,
    pub status: BookStatus,
    pub owner: AccountDto,
    #[serde(default, with = "display_date")]
    #[schema(value_type = Option<String>, example = "2024-05-01")]
    pub onboard_date: Option<DateTime<Utc>>,
    pub borrower: Option<AccountDto>,
    #[serde(default, with = "display_date")]
    #[schema(value_type = Option<String>, example = "2024-05-01")]
    pub borrow_date: Option<DateTime<Utc>>,
}

impl From<Book> for BookDto {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            book_id: book.book_id,
            title: book.title,
            url: book.url,
            status: book.status,
            owner: book.owner,
            onboard_date: Some(book.onboard_date),
            borrower: book.borrower,
            borrow_date: book.borrow_date,
        }
    }
}

/// Body of book create/modify requests.
///
/// Clients may post a whole `BookDto`; everything except the fields below is
/// ignored since ownership, status and dates are managed by the server.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookForm {
    pub book_id: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub url: Option<String>,
}

/// Dates are shown as plain days in the +08:00 zone the API has always used
mod display_date {
    use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
    use serde::{de, ser, Deserialize, Deserializer, Serializer};

    const OFFSET_SECS: i32 = 8 * 3600;
    const FORMAT: &str = "%Y-%m-%d";

    fn offset() -> Option<FixedOffset> {
        FixedOffset::east_opt(OFFSET_SECS)
    }

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => {
                let offset = offset()
                    .ok_or_else(|| <S::Error as ser::Error>::custom("invalid display offset"))?;
                let text = date.with_timezone(&offset).format(FORMAT).to_string();
                serializer.serialize_some(&text)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(text) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let offset =
            offset().ok_or_else(|| <D::Error as de::Error>::custom("invalid display offset"))?;
        let day = NaiveDate::parse_from_str(&text, FORMAT).map_err(<D::Error as de::Error>::custom)?;
        day.and_hms_opt(0, 0, 0)
            .and_then(|midnight| midnight.and_local_timezone(offset).single())
            .map(|local| Some(local.with_timezone(&Utc)))
            .ok_or_else(|| <D::Error as de::Error>::custom(format!("invalid date: {}", text)))
    }
}

// ---------------------------------------------------------------------------
// Paging
// ---------------------------------------------------------------------------

/// Paging query parameters (`page` is zero-based)
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageRequest {
    /// Page number, starting at 0
    pub page: Option<i64>,
    /// Page size (default 20, at most 2000)
    pub size: Option<i64>,
    /// `property[,asc|desc]`, e.g. `title,desc`
    pub sort: Option<String>,
}

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 2000;

/// Sortable book columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSortKey {
    Id,
    BookId,
    Title,
    Status,
    OnboardDate,
    BorrowDate,
}

impl BookSortKey {
    fn from_property(property: &str) -> Option<Self> {
        match property {
            "id" => Some(BookSortKey::Id),
            "bookId" => Some(BookSortKey::BookId),
            "title" => Some(BookSortKey::Title),
            "status" => Some(BookSortKey::Status),
            "onboardDate" => Some(BookSortKey::OnboardDate),
            "borrowDate" => Some(BookSortKey::BorrowDate),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            BookSortKey::Id => "b.id",
            BookSortKey::BookId => "b.book_id",
            BookSortKey::Title => "b.title",
            BookSortKey::Status => "b.status",
            BookSortKey::OnboardDate => "b.onboard_date",
            BookSortKey::BorrowDate => "b.borrow_date",
        }
    }
}

/// Validated page window and ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
    pub sort: BookSortKey,
    pub descending: bool,
}

impl Page {
    /// `ORDER BY` clause; `b.id` breaks ties so pages are stable
    pub fn order_by(&self) -> String {
        let direction = if self.descending { "DESC" } else { "ASC" };
        if self.sort == BookSortKey::Id {
            format!("b.id {}", direction)
        } else {
            format!("{} {} NULLS LAST, b.id ASC", self.sort.column(), direction)
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
            sort: BookSortKey::Id,
            descending: false,
        }
    }
}

impl PageRequest {
    pub fn resolve(&self) -> AppResult<Page> {
        let page = self.page.unwrap_or(0).max(0);
        let size = self.size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

        let (sort, descending) = match self.sort.as_deref().map(str::trim) {
            None | Some("") => (BookSortKey::Id, false),
            Some(sort) => {
                let mut parts = sort.split(',').map(str::trim);
                let property = parts.next().unwrap_or_default();
                let key = BookSortKey::from_property(property).ok_or_else(|| {
                    AppError::bad_request(format!("Unknown sort property: {}", property))
                })?;
                let descending = match parts.next() {
                    None => false,
                    Some(dir) if dir.eq_ignore_ascii_case("asc") => false,
                    Some(dir) if dir.eq_ignore_ascii_case("desc") => true,
                    Some(dir) => {
                        return Err(AppError::bad_request(format!(
                            "Unknown sort direction: {}",
                            dir
                        )))
                    }
                };
                (key, descending)
            }
        };

        Ok(Page {
            limit: size,
            offset: page.saturating_mul(size),
            sort,
            descending,
        })
    }
}
