//! API integration tests
//!
//! Run against a live server with a fresh database:
//! `cargo test -- --ignored`

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Log in and return the bearer token
async fn login(client: &Client, login: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "login": login, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");

    assert_eq!(response.status(), StatusCode::OK, "login failed for {}", login);
    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

async fn admin_token(client: &Client) -> String {
    login(client, "admin", "admin").await
}

/// Unique suffix so tests can run repeatedly against the same database
fn unique(prefix: &str) -> String {
    format!("{}{}", prefix, chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

/// Create a user with the given role and return (id, token)
async fn create_user(client: &Client, admin: &str, role: &str) -> (i64, String) {
    let login_name = unique(role);
    let response = client
        .post(format!("{}/users", BASE_URL))
        .bearer_auth(admin)
        .json(&json!({
            "login": login_name,
            "password": "secret",
            "full_name": format!("Test {}", role),
            "role": role
        }))
        .send()
        .await
        .expect("Failed to create user");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    let id = body["id"].as_i64().unwrap();

    (id, login(client, &login_name, "secret").await)
}

/// Create a category and a tool with the given stock, returning the tool id
async fn create_tool(client: &Client, admin: &str, stock: i64) -> (i64, i64) {
    let response = client
        .post(format!("{}/categories", BASE_URL))
        .bearer_auth(admin)
        .json(&json!({ "name": unique("Kategori ") }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let category: Value = response.json().await.unwrap();
    let category_id = category["id"].as_i64().unwrap();

    let response = client
        .post(format!("{}/tools", BASE_URL))
        .bearer_auth(admin)
        .json(&json!({
            "name": unique("Bor listrik "),
            "category_id": category_id,
            "stock": stock
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let tool: Value = response.json().await.unwrap();

    (category_id, tool["id"].as_i64().unwrap())
}

async fn tool_stock(client: &Client, token: &str, tool_id: i64) -> i64 {
    let body: Value = client
        .get(format!("{}/tools/{}", BASE_URL, tool_id))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["stock"].as_i64().unwrap()
}

async fn submit_loan(client: &Client, token: &str, tool_id: i64, due_date: &str) -> i64 {
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "tool_id": tool_id, "due_date": due_date }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let loan: Value = response.json().await.unwrap();
    assert_eq!(loan["status"], "pending");
    loan["id"].as_i64().unwrap()
}

/// Late fee of a return response (serialized as a decimal string)
fn fee(body: &Value) -> f64 {
    body["return"]["late_fee"].as_str().unwrap().parse().unwrap()
}

async fn post_action(client: &Client, token: &str, loan_id: i64, action: &str) -> reqwest::Response {
    client
        .post(format!("{}/loans/{}/{}", BASE_URL, loan_id, action))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
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
async fn test_login() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "login": "admin", "password": "admin" }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["role"], "admin");
}

#[tokio::test]
#[ignore]
async fn test_invalid_login() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "login": "admin", "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_logout_revokes_token() {
    let client = Client::new();
    let token = admin_token(&client).await;

    let response = client
        .post(format!("{}/auth/logout", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_loan_lifecycle_with_staff_confirmation() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (_, staff) = create_user(&client, &admin, "petugas").await;
    let (borrower_id, borrower) = create_user(&client, &admin, "peminjam").await;
    let (_, tool_id) = create_tool(&client, &admin, 2).await;

    let loan_id = submit_loan(&client, &borrower, tool_id, "2099-12-31").await;
    // Submission reserves nothing
    assert_eq!(tool_stock(&client, &admin, tool_id).await, 2);

    // Borrowers cannot approve
    let response = post_action(&client, &borrower, loan_id, "approve").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_action(&client, &staff, loan_id, "approve").await;
    assert_eq!(response.status(), StatusCode::OK);
    let loan: Value = response.json().await.unwrap();
    assert_eq!(loan["status"], "approved");
    assert_eq!(tool_stock(&client, &admin, tool_id).await, 1);

    let response = post_action(&client, &borrower, loan_id, "request-return").await;
    assert_eq!(response.status(), StatusCode::OK);
    let loan: Value = response.json().await.unwrap();
    assert_eq!(loan["status"], "pending_return");
    // Still out until staff confirms
    assert_eq!(tool_stock(&client, &admin, tool_id).await, 1);

    let response = post_action(&client, &staff, loan_id, "confirm-return").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["loan"]["status"], "returned");
    assert_eq!(body["return"]["initiated_by"], "staff");
    assert_eq!(body["return"]["days_late"], 0);
    assert_eq!(body["stock"], 2);

    // Shows up in the borrower's loans and the returns ledger
    let mine: Value = client
        .get(format!("{}/loans/mine", BASE_URL))
        .bearer_auth(&borrower)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(mine
        .as_array()
        .unwrap()
        .iter()
        .any(|l| l["id"] == loan_id && l["user_id"] == borrower_id));

    let returns: Value = client
        .get(format!("{}/returns", BASE_URL))
        .bearer_auth(&staff)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(returns["items"]
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r["loan_id"] == loan_id));

    // Every transition was audited
    let audit: Value = client
        .get(format!("{}/audit-logs?per_page=200", BASE_URL))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let target = loan_id.to_string();
    let actions: Vec<&str> = audit["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["target_id"] == target.as_str() && e["action"].as_str().unwrap_or("").starts_with("loan."))
        .filter_map(|e| e["action"].as_str())
        .collect();
    for expected in ["loan.submit", "loan.approve", "loan.return_request", "loan.return"] {
        assert!(actions.contains(&expected), "missing audit action {}", expected);
    }
}

#[tokio::test]
#[ignore]
async fn test_reject_keeps_stock() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (_, borrower) = create_user(&client, &admin, "peminjam").await;
    let (_, tool_id) = create_tool(&client, &admin, 1).await;

    let loan_id = submit_loan(&client, &borrower, tool_id, "2099-01-01").await;
    let response = post_action(&client, &admin, loan_id, "reject").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(tool_stock(&client, &admin, tool_id).await, 1);

    // Terminal
    let response = post_action(&client, &admin, loan_id, "approve").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("rejected"));
}

#[tokio::test]
#[ignore]
async fn test_submit_validation() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (_, borrower) = create_user(&client, &admin, "peminjam").await;

    let response = client
        .post(format!("{}/loans", BASE_URL))
        .bearer_auth(&borrower)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("tool_id") && message.contains("due_date"));

    let response = client
        .post(format!("{}/loans", BASE_URL))
        .bearer_auth(&borrower)
        .json(&json!({ "tool_id": i32::MAX, "due_date": "2099-01-01" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_approvals_never_oversell() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (_, borrower) = create_user(&client, &admin, "peminjam").await;
    let (_, tool_id) = create_tool(&client, &admin, 1).await;

    let first = submit_loan(&client, &borrower, tool_id, "2099-01-01").await;
    let second = submit_loan(&client, &borrower, tool_id, "2099-01-01").await;

    let (a, b) = tokio::join!(
        post_action(&client, &admin, first, "approve"),
        post_action(&client, &admin, second, "approve"),
    );

    let mut statuses = [a.status(), b.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);
    assert_eq!(tool_stock(&client, &admin, tool_id).await, 0);
}

#[tokio::test]
#[ignore]
async fn test_double_return_is_rejected() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (_, borrower) = create_user(&client, &admin, "peminjam").await;
    let (_, tool_id) = create_tool(&client, &admin, 1).await;

    let loan_id = submit_loan(&client, &borrower, tool_id, "2099-01-01").await;
    assert_eq!(post_action(&client, &admin, loan_id, "approve").await.status(), StatusCode::OK);

    let (a, b) = tokio::join!(
        post_action(&client, &borrower, loan_id, "return"),
        post_action(&client, &admin, loan_id, "confirm-return"),
    );
    let mut statuses = [a.status(), b.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);

    // Exactly one unit came back
    assert_eq!(tool_stock(&client, &admin, tool_id).await, 1);
}

#[tokio::test]
#[ignore]
async fn test_late_return_charges_fee_on_both_paths() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (_, borrower) = create_user(&client, &admin, "peminjam").await;
    let (_, tool_id) = create_tool(&client, &admin, 2).await;

    let due = (chrono::Local::now().date_naive() - chrono::Duration::days(3))
        .format("%Y-%m-%d")
        .to_string();

    let direct = submit_loan(&client, &borrower, tool_id, &due).await;
    let confirmed = submit_loan(&client, &borrower, tool_id, &due).await;
    for id in [direct, confirmed] {
        assert_eq!(post_action(&client, &admin, id, "approve").await.status(), StatusCode::OK);
    }

    let body: Value = post_action(&client, &borrower, direct, "return").await.json().await.unwrap();
    assert_eq!(body["return"]["days_late"], 3);
    assert_eq!(fee(&body), 15000.0);

    assert_eq!(
        post_action(&client, &borrower, confirmed, "request-return").await.status(),
        StatusCode::OK
    );
    let body: Value = post_action(&client, &admin, confirmed, "confirm-return").await.json().await.unwrap();
    assert_eq!(body["return"]["days_late"], 3);
    assert_eq!(fee(&body), 15000.0);
}

#[tokio::test]
#[ignore]
async fn test_borrower_cannot_touch_other_loans() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (_, owner) = create_user(&client, &admin, "peminjam").await;
    let (_, other) = create_user(&client, &admin, "peminjam").await;
    let (_, tool_id) = create_tool(&client, &admin, 1).await;

    let loan_id = submit_loan(&client, &owner, tool_id, "2099-01-01").await;
    assert_eq!(post_action(&client, &admin, loan_id, "approve").await.status(), StatusCode::OK);

    let response = post_action(&client, &other, loan_id, "return").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = client
        .get(format!("{}/loans/{}", BASE_URL, loan_id))
        .bearer_auth(&other)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_category_with_tools_cannot_be_deleted() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (category_id, tool_id) = create_tool(&client, &admin, 1).await;

    let response = client
        .delete(format!("{}/categories/{}", BASE_URL, category_id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Tool without loans can go, then the category
    let response = client
        .delete(format!("{}/tools/{}", BASE_URL, tool_id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .delete(format!("{}/categories/{}", BASE_URL, category_id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore]
async fn test_stock_adjustment_never_negative() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (_, tool_id) = create_tool(&client, &admin, 1).await;

    let response = client
        .post(format!("{}/tools/{}/stock", BASE_URL, tool_id))
        .bearer_auth(&admin)
        .json(&json!({ "delta": -2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = client
        .post(format!("{}/tools/{}/stock", BASE_URL, tool_id))
        .bearer_auth(&admin)
        .json(&json!({ "delta": 4 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["stock"], 5);
}

#[tokio::test]
#[ignore]
async fn test_dashboard_requires_staff() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (_, borrower) = create_user(&client, &admin, "peminjam").await;

    let response = client
        .get(format!("{}/reports/dashboard", BASE_URL))
        .bearer_auth(&borrower)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .get(format!("{}/reports/dashboard", BASE_URL))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(body["loans_by_status"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_audit_entry_of_deleted_actor_lists_as_system() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (staff_id, staff) = create_user(&client, &admin, "petugas").await;
    let (_, borrower) = create_user(&client, &admin, "peminjam").await;
    let (_, tool_id) = create_tool(&client, &admin, 1).await;

    let loan_id = submit_loan(&client, &borrower, tool_id, "2099-01-01").await;
    assert_eq!(post_action(&client, &staff, loan_id, "reject").await.status(), StatusCode::OK);

    let response = client
        .delete(format!("{}/users/{}", BASE_URL, staff_id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(format!("{}/audit-logs?action=loan.reject&per_page=200", BASE_URL))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let audit: Value = response.json().await.unwrap();

    let target = loan_id.to_string();
    let entry = audit["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["target_id"] == target.as_str())
        .expect("reject entry for the loan");
    assert!(entry["actor_user_id"].is_null());
    assert_eq!(entry["actor_name"], "System");
}

#[tokio::test]
#[ignore]
async fn test_tool_update_leaves_stock_alone() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (_, tool_id) = create_tool(&client, &admin, 3).await;

    let response = client
        .put(format!("{}/tools/{}", BASE_URL, tool_id))
        .bearer_auth(&admin)
        .json(&json!({ "stock": 10 }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());

    let response = client
        .put(format!("{}/tools/{}", BASE_URL, tool_id))
        .bearer_auth(&admin)
        .json(&json!({ "name": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .put(format!("{}/tools/{}", BASE_URL, tool_id))
        .bearer_auth(&admin)
        .json(&json!({ "description": "Kabel 5 meter" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(tool_stock(&client, &admin, tool_id).await, 3);
}

#[tokio::test]
#[ignore]
async fn test_overdue_flag_follows_server_date() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (_, borrower) = create_user(&client, &admin, "peminjam").await;
    let (_, tool_id) = create_tool(&client, &admin, 2).await;

    let today = chrono::Local::now().date_naive();
    let yesterday = (today - chrono::Duration::days(1)).format("%Y-%m-%d").to_string();
    let today = today.format("%Y-%m-%d").to_string();

    let due_today = submit_loan(&client, &borrower, tool_id, &today).await;
    let due_yesterday = submit_loan(&client, &borrower, tool_id, &yesterday).await;
    for id in [due_today, due_yesterday] {
        assert_eq!(post_action(&client, &admin, id, "approve").await.status(), StatusCode::OK);
    }

    let loan = |id: i64| {
        let client = client.clone();
        let borrower = borrower.clone();
        async move {
            client
                .get(format!("{}/loans/{}", BASE_URL, id))
                .bearer_auth(&borrower)
                .send()
                .await
                .unwrap()
                .json::<Value>()
                .await
                .unwrap()
        }
    };
    assert_eq!(loan(due_today).await["is_overdue"], false);
    assert_eq!(loan(due_yesterday).await["is_overdue"], true);

    // Overdue by one day is charged for one day
    let body: Value = post_action(&client, &borrower, due_yesterday, "return").await.json().await.unwrap();
    assert_eq!(body["return"]["days_late"], 1);
    assert_eq!(fee(&body), 5000.0);

    let body: Value = post_action(&client, &borrower, due_today, "return").await.json().await.unwrap();
    assert_eq!(body["return"]["days_late"], 0);
    assert_eq!(fee(&body), 0.0);
}
