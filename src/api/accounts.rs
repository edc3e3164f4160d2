//! Account endpoints: registration, login and logout

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult, ErrorCode},
    models::account::{AccountDto, LoginRequest, LoginResponse, RegisterRequest, TokenQuery},
    AppState,
};

/// Register a new account
#[utoipa::path(
    post,
    path = "/accounts/register",
    tag = "accounts",
    params(RegisterRequest),
    responses(
        (status = 201, description = "Account created", body = AccountDto),
        (status = 400, description = "Missing or invalid parameter", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Query(request): Query<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AccountDto>)> {
    let account = state.services.accounts.register(&request).await?;
    Ok((StatusCode::CREATED, Json(AccountDto::from(&account))))
}

/// Log in and obtain a session token (GET or POST)
#[utoipa::path(
    post,
    path = "/accounts/login",
    tag = "accounts",
    params(LoginRequest),
    responses(
        (status = 200, description = "Session token", body = LoginResponse),
        (status = 400, description = "Missing parameter", body = crate::error::ErrorResponse),
        (status = 401, description = "Unknown user or wrong password", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Query(request): Query<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let token = state.services.accounts.login(&request).await?;
    Ok(Json(LoginResponse { token }))
}

/// End a session (GET or POST)
#[utoipa::path(
    post,
    path = "/accounts/logout",
    tag = "accounts",
    params(TokenQuery),
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "No token in request", body = crate::error::ErrorResponse)
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> AppResult<StatusCode> {
    let token = query
        .token
        .ok_or_else(|| AppError::service(ErrorCode::NoToken, "No token in request"))?;

    state.services.accounts.logout(&token);
    Ok(StatusCode::NO_CONTENT)
}
