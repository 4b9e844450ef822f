//! Test utilities and fixtures for clickgate integration tests

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use md5::{Digest, Md5};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tempfile::TempDir;
use tower::ServiceExt;

pub use clickgate::config::ClickConfig;
pub use clickgate::db::{init_db, queries, AppState};
pub use clickgate::handlers;
pub use clickgate::models::{CreatePayment, Payment, PaymentStatus};

pub const TEST_SERVICE_ID: &str = "1234";
pub const TEST_SECRET_KEY: &str = "test_secret_key";
pub const TEST_SIGN_TIME: &str = "2024-01-15 10:30:00";

/// Fixed merchant configuration so signature vectors are deterministic
pub fn test_click_config() -> ClickConfig {
    ClickConfig {
        service_id: TEST_SERVICE_ID.to_string(),
        merchant_user_id: "u-1".to_string(),
        secret_key: TEST_SECRET_KEY.to_string(),
        // Unroutable: tests that touch the gateway without a stub expect a
        // transient error
        api_base_url: "http://127.0.0.1:9".to_string(),
    }
}

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Create an AppState backed by a file database shared across the pool.
/// The TempDir must be kept alive for the duration of the test.
pub fn create_test_app_state() -> (AppState, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("clickgate-test.db");
    let manager = SqliteConnectionManager::file(&db_path)
        .with_init(|conn| conn.execute_batch("PRAGMA busy_timeout = 5000;"));
    let pool = Pool::builder().max_size(4).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }

    (
        AppState {
            db: pool,
            click: test_click_config(),
        },
        dir,
    )
}

/// Create an AppState whose merchant API calls go to the given base URL
/// (usually a stub from `spawn_gateway_stub`).
pub fn create_test_app_state_with_gateway(api_base_url: &str) -> (AppState, TempDir) {
    let (mut state, dir) = create_test_app_state();
    state.click.api_base_url = api_base_url.to_string();
    (state, dir)
}

/// Bind a merchant-API stub on an ephemeral port and return its base URL.
///
/// Serves the two endpoints the gateway client calls, replying with the
/// given JSON bodies regardless of path parameters.
pub async fn spawn_gateway_stub(
    status_reply: serde_json::Value,
    reversal_reply: serde_json::Value,
) -> String {
    use axum::routing::{delete, get};

    let router = Router::new()
        .route(
            "/payment/status_by_mti/{service_id}/{merchant_trans_id}/{date}",
            get(move || {
                let reply = status_reply.clone();
                async move { axum::Json(reply) }
            }),
        )
        .route(
            "/payment/reversal/{service_id}/{payment_id}",
            delete(move || {
                let reply = reversal_reply.clone();
                async move { axum::Json(reply) }
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub listener");
    let addr = listener.local_addr().expect("Failed to read stub address");
    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Stub server failed");
    });
    format!("http://{}", addr)
}

/// Create a Router with callback and payment endpoints
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(handlers::callbacks::router())
        .merge(handlers::payments::router())
        .with_state(state)
}

/// Create a PENDING test payment
pub fn create_test_payment(conn: &Connection, amount: i64) -> Payment {
    queries::create_payment(
        conn,
        &CreatePayment {
            user_id: "test-user".to_string(),
            amount,
        },
    )
    .expect("Failed to create test payment")
}

/// Compute a PREPARE sign_string the way the gateway does
pub fn sign_prepare(
    click_trans_id: &str,
    merchant_trans_id: &str,
    amount: &str,
    sign_time: &str,
) -> String {
    let mut hasher = Md5::new();
    hasher.update(click_trans_id.as_bytes());
    hasher.update(TEST_SERVICE_ID.as_bytes());
    hasher.update(TEST_SECRET_KEY.as_bytes());
    hasher.update(merchant_trans_id.as_bytes());
    hasher.update(amount.as_bytes());
    hasher.update(b"0");
    hasher.update(sign_time.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compute a COMPLETE sign_string (includes merchant_prepare_id)
pub fn sign_complete(
    click_trans_id: &str,
    merchant_trans_id: &str,
    merchant_prepare_id: &str,
    amount: &str,
    sign_time: &str,
) -> String {
    let mut hasher = Md5::new();
    hasher.update(click_trans_id.as_bytes());
    hasher.update(TEST_SERVICE_ID.as_bytes());
    hasher.update(TEST_SECRET_KEY.as_bytes());
    hasher.update(merchant_trans_id.as_bytes());
    hasher.update(merchant_prepare_id.as_bytes());
    hasher.update(amount.as_bytes());
    hasher.update(b"1");
    hasher.update(sign_time.as_bytes());
    hex::encode(hasher.finalize())
}

/// Form-encoded PREPARE body with a valid signature
pub fn prepare_form(click_trans_id: &str, merchant_trans_id: &str, amount: &str) -> String {
    let sign = sign_prepare(click_trans_id, merchant_trans_id, amount, TEST_SIGN_TIME);
    format!(
        "click_trans_id={}&service_id={}&merchant_trans_id={}&amount={}&action=0&sign_time={}&sign_string={}",
        click_trans_id,
        TEST_SERVICE_ID,
        merchant_trans_id,
        amount,
        urlencode(TEST_SIGN_TIME),
        sign
    )
}

/// Form-encoded COMPLETE body with a valid signature
pub fn complete_form(
    click_trans_id: &str,
    merchant_trans_id: &str,
    merchant_prepare_id: &str,
    amount: &str,
) -> String {
    let sign = sign_complete(
        click_trans_id,
        merchant_trans_id,
        merchant_prepare_id,
        amount,
        TEST_SIGN_TIME,
    );
    format!(
        "click_trans_id={}&service_id={}&merchant_trans_id={}&merchant_prepare_id={}&amount={}&action=1&sign_time={}&sign_string={}",
        click_trans_id,
        TEST_SERVICE_ID,
        merchant_trans_id,
        merchant_prepare_id,
        amount,
        urlencode(TEST_SIGN_TIME),
        sign
    )
}

/// COMPLETE body carrying a provider-side error (no amount field)
pub fn complete_error_form(
    click_trans_id: &str,
    merchant_trans_id: &str,
    merchant_prepare_id: &str,
    provider_error: i64,
) -> String {
    let sign = sign_complete(
        click_trans_id,
        merchant_trans_id,
        merchant_prepare_id,
        "",
        TEST_SIGN_TIME,
    );
    format!(
        "click_trans_id={}&service_id={}&merchant_trans_id={}&merchant_prepare_id={}&action=1&error={}&sign_time={}&sign_string={}",
        click_trans_id,
        TEST_SERVICE_ID,
        merchant_trans_id,
        merchant_prepare_id,
        provider_error,
        urlencode(TEST_SIGN_TIME),
        sign
    )
}

/// Percent-encode the characters our fixtures actually contain
fn urlencode(s: &str) -> String {
    s.replace(' ', "%20").replace(':', "%3A")
}

/// POST a form-encoded callback and return (status, parsed JSON body)
pub async fn post_form(app: Router, uri: &str, body: String) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// POST a JSON body and return (status, parsed JSON body)
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}
