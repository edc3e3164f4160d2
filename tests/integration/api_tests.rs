//! API integration tests against a running server

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api";

/// Register a fresh account and log it in, returning its token
async fn new_session(client: &Client, label: &str) -> String {
    let email = format!(
        "{}-{}@example.com",
        label,
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    );

    let response = client
        .post(format!("{}/accounts/register", BASE_URL))
        .query(&[("email", email.as_str()), ("name", label), ("password", "secret")])
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .post(format!("{}/accounts/login", BASE_URL))
        .query(&[("email", email.as_str()), ("password", "secret")])
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

async fn create_book(client: &Client, token: &str, title: &str) -> i64 {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .query(&[("token", token)])
        .json(&json!({
            "bookId": "978-1-59327-828-1",
            "title": title,
            "url": "https://nostarch.com/rust-programming-language-2nd-edition"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No book ID")
}

async fn action(client: &Client, token: &str, id: i64, name: &str) -> reqwest::Response {
    client
        .post(format!("{}/books/{}/{}", BASE_URL, id, name))
        .query(&[("token", token)])
        .send()
        .await
        .expect("Failed to send request")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .get(format!("{}/accounts/login", BASE_URL))
        .query(&[("email", "nobody@example.com"), ("password", "wrong")])
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[tokio::test]
#[ignore]
async fn test_create_requires_token() {
    let client = Client::new();

    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({ "title": "No token" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "NO_TOKEN");
}

#[tokio::test]
#[ignore]
async fn test_full_borrow_cycle() {
    let client = Client::new();
    let owner = new_session(&client, "owner").await;
    let reader = new_session(&client, "reader").await;
    let book_id = create_book(&client, &owner, "The Rust Programming Language").await;

    // owner cannot borrow their own book
    let response = action(&client, &owner, book_id, "request").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = action(&client, &reader, book_id, "request").await;
    assert!(response.status().is_success());

    // only the owner confirms
    let response = action(&client, &reader, book_id, "confirm").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = action(&client, &owner, book_id, "confirm").await;
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "borrowed");
    assert!(body["borrowDate"].is_string());

    let response = client
        .get(format!("{}/myborrowedbook", BASE_URL))
        .query(&[("token", reader.as_str())])
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body
        .as_array()
        .expect("Expected a list")
        .iter()
        .any(|b| b["id"] == book_id));

    let response = action(&client, &owner, book_id, "return").await;
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "available");
    assert!(body["borrower"].is_null());

    let response = action(&client, &owner, book_id, "delete").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore]
async fn test_request_then_reject_and_cancel() {
    let client = Client::new();
    let owner = new_session(&client, "owner").await;
    let reader = new_session(&client, "reader").await;
    let book_id = create_book(&client, &owner, "Rust for Rustaceans").await;

    action(&client, &reader, book_id, "request").await;
    let response = action(&client, &owner, book_id, "reject").await;
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "available");

    action(&client, &reader, book_id, "request").await;
    let response = action(&client, &reader, book_id, "cancel").await;
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "available");

    // nothing left to cancel
    let response = action(&client, &reader, book_id, "cancel").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_logout_invalidates_token() {
    let client = Client::new();
    let token = new_session(&client, "leaver").await;

    let response = client
        .get(format!("{}/accounts/logout", BASE_URL))
        .query(&[("token", token.as_str())])
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(format!("{}/mybook", BASE_URL))
        .query(&[("token", token.as_str())])
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
