// Mock Google Sheets API and server bootstrapping shared by integration tests.
#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    routing::get,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

pub const SHEET_ID: &str = "guest-sheet";
pub const FORBIDDEN_SHEET_ID: &str = "forbidden-sheet";
pub const API_KEY: &str = "test-key";
pub const ACCESS_TOKEN: &str = "token-123";

#[derive(Clone)]
pub struct MockSheets {
    pub base_url: String,
    requests: Arc<AtomicUsize>,
}

impl MockSheets {
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

fn guest_rows() -> Value {
    json!([
        ["Name", "Adult Seats", "Kid Seats", "Guest Code"],
        ["Jane Doe", "2", "1", "AAAAA"],
        ["John Smith", "abc", "0", "BBBBB"]
    ])
}

fn google_error(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({
            "error": { "code": status.as_u16(), "message": message, "status": "ERROR" }
        })),
    )
}

async fn values(
    State(requests): State<Arc<AtomicUsize>>,
    Path((sheet_id, range)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    requests.fetch_add(1, Ordering::SeqCst);

    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value == format!("Bearer {ACCESS_TOKEN}"))
        .unwrap_or(false);
    let keyed = query.get("key").map(|key| key == API_KEY).unwrap_or(false);

    if !keyed && !bearer {
        return google_error(
            StatusCode::BAD_REQUEST,
            "API key not valid. Please pass a valid API key.",
        );
    }
    if sheet_id == FORBIDDEN_SHEET_ID {
        return google_error(StatusCode::FORBIDDEN, "The caller does not have permission");
    }
    if sheet_id != SHEET_ID {
        return google_error(StatusCode::NOT_FOUND, "Requested entity was not found.");
    }

    (
        StatusCode::OK,
        Json(json!({ "range": range, "majorDimension": "ROWS", "values": guest_rows() })),
    )
}

// Bind the mock on an ephemeral port inside the calling test's runtime.
pub async fn spawn_mock_sheets() -> MockSheets {
    let requests = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/v4/spreadsheets/{sheet_id}/values/{range}", get(values))
        .with_state(requests.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral mock port");
    let addr = listener.local_addr().expect("get local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock sheets failed");
    });

    MockSheets {
        base_url: format!("http://{addr}"),
        requests,
    }
}

// Start the invitation server against the given sheet and return its base URL.
pub async fn spawn_invitation_server(sheets_url: &str, sheet_id: &str) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");
    let base_url = format!("http://{addr}");

    let vars: HashMap<&str, String> = HashMap::from([
        ("SITE_ROOT_URL", format!("{base_url}/")),
        ("SHEETS_API_URL", sheets_url.to_string()),
        ("GOOGLE_SHEET_ID", sheet_id.to_string()),
        ("GOOGLE_API_KEY", API_KEY.to_string()),
        ("SHEETS_TIMEOUT_MS", "2000".to_string()),
    ]);
    let settings = invitation_server::Settings::from_sources(
        |key| vars.get(key).cloned(),
        Default::default(),
    )
    .expect("test settings should be valid");

    tokio::spawn(async move {
        invitation_server::run(listener, settings)
            .await
            .expect("server failed");
    });

    base_url
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(10))
        .build()
        .expect("test client")
}

// Read an SSE body until `needle` shows up, then drop the connection.
pub async fn read_events_until(mut response: reqwest::Response, needle: &str) -> String {
    let mut body = String::new();
    while let Some(chunk) = response.chunk().await.expect("event stream chunk") {
        body.push_str(&String::from_utf8_lossy(&chunk));
        if body.contains(needle) {
            break;
        }
    }
    body
}
