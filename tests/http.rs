use expense_tracker::config::messages;
use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Expense {
    id: u64,
    description: String,
    amount: f64,
    category: String,
    date: String,
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct Stats {
    spent: f64,
    remaining: f64,
    days_remaining: i64,
    daily_allowance: f64,
    average_daily: f64,
    over_budget: bool,
    low_budget: bool,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "expense_tracker_http_{}_{}/data.json",
        std::process::id(),
        nanos
    ));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/health")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_expense_tracker"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("APP_DEBOUNCE_MS", "50")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn create(client: &Client, base: &str, body: Value) -> reqwest::Response {
    client
        .post(format!("{base}/api/expenses"))
        .json(&body)
        .send()
        .await
        .unwrap()
}

async fn expenses_on(client: &Client, base: &str, date: &str) -> Vec<Expense> {
    client
        .get(format!("{base}/api/expenses?date={date}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_add_then_fetch_by_id() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = create(
        &client,
        &server.base_url,
        json!({ "description": "Bánh mì", "amount": 25000, "category": "Ăn Uống", "date": "2030-06-15" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Expense = response.json().await.unwrap();

    let fetched: Expense = client
        .get(format!("{}/api/expenses/{}", server.base_url, created.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(fetched, created);
    assert_eq!(fetched.description, "Bánh mì");
    assert_eq!(fetched.amount, 25000.0);
    assert_eq!(fetched.category, "Ăn Uống");
    assert_eq!(fetched.date, "2030-06-15");
    assert!(!fetched.created_at.is_empty());
}

#[tokio::test]
async fn http_invalid_expense_is_rejected() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let before = expenses_on(&client, &server.base_url, "2030-07-01").await;

    let blank = create(
        &client,
        &server.base_url,
        json!({ "description": "   ", "amount": 1000, "date": "2030-07-01" }),
    )
    .await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

    let negative = create(
        &client,
        &server.base_url,
        json!({ "description": "Trả lại", "amount": -5, "date": "2030-07-01" }),
    )
    .await;
    assert_eq!(negative.status(), StatusCode::BAD_REQUEST);
    let body: Value = negative.json().await.unwrap();
    assert!(body["error"].as_str().is_some());

    let after = expenses_on(&client, &server.base_url, "2030-07-01").await;
    assert_eq!(after.len(), before.len());
}

#[tokio::test]
async fn http_unreadable_expense_body_is_a_validation_error() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let text_amount = create(
        &client,
        &server.base_url,
        json!({ "description": "Trà đá", "amount": "abc", "date": "2030-07-02" }),
    )
    .await;
    assert_eq!(text_amount.status(), StatusCode::BAD_REQUEST);
    let body: Value = text_amount.json().await.unwrap();
    assert_eq!(body["error"], messages::INVALID_AMOUNT);

    let no_description = create(&client, &server.base_url, json!({ "amount": 5000 })).await;
    assert_eq!(no_description.status(), StatusCode::BAD_REQUEST);
    let body: Value = no_description.json().await.unwrap();
    assert_eq!(body["error"], messages::EMPTY_DESCRIPTION);

    let not_json = client
        .post(format!("{}/api/expenses", server.base_url))
        .header("content-type", "application/json")
        .body("{description")
        .send()
        .await
        .unwrap();
    assert_eq!(not_json.status(), StatusCode::BAD_REQUEST);
    let body: Value = not_json.json().await.unwrap();
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn http_rejected_form_keeps_input() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let page = client
        .post(format!("{}/expenses", server.base_url))
        .form(&[
            ("description", "  "),
            ("amount", "123456"),
            ("category", "Giải Trí"),
            ("date", "2030-12-03"),
        ])
        .send()
        .await
        .unwrap();
    assert!(page.status().is_success());
    let html = page.text().await.unwrap();
    assert!(html.contains(messages::EMPTY_DESCRIPTION));
    assert!(html.contains(r#"value="123456""#));
    assert!(html.contains(r#"value="Giải Trí""#));
    assert!(html.contains(r#"value="2030-12-03""#));

    assert!(expenses_on(&client, &server.base_url, "2030-12-03").await.is_empty());

    let next = client.get(&server.base_url).send().await.unwrap().text().await.unwrap();
    assert!(!next.contains(messages::EMPTY_DESCRIPTION));
}

#[tokio::test]
async fn http_bad_import_form_keeps_data() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    create(
        &client,
        &server.base_url,
        json!({ "description": "Tiền điện", "amount": 420000, "category": "Hóa Đơn", "date": "2030-12-10" }),
    )
    .await;
    let before: Value = client
        .get(format!("{}/api/export", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let page = client
        .post(format!("{}/import", server.base_url))
        .form(&[("payload", "{not json")])
        .send()
        .await
        .unwrap();
    assert!(page.status().is_success());
    let html = page.text().await.unwrap();
    assert!(html.contains(messages::IMPORT_INVALID));

    let after: Value = client
        .get(format!("{}/api/export", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(after["expenses"], before["expenses"]);
    assert_eq!(after["categories"], before["categories"]);
    assert_eq!(after["settings"], before["settings"]);
}

#[tokio::test]
async fn http_calendar_day_total_matches_expenses() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    for amount in [12000, 30500] {
        let response = create(
            &client,
            &server.base_url,
            json!({ "description": "Gửi xe", "amount": amount, "category": "Di Chuyển", "date": "2030-08-09" }),
        )
        .await;
        assert!(response.status().is_success());
    }

    let expected: f64 = expenses_on(&client, &server.base_url, "2030-08-09")
        .await
        .iter()
        .map(|expense| expense.amount)
        .sum();

    let calendar: Value = client
        .get(format!("{}/api/calendar?month=2030-08", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let cell = calendar["cells"]
        .as_array()
        .unwrap()
        .iter()
        .find(|cell| cell["date"] == "2030-08-09")
        .expect("missing day cell");

    assert_eq!(cell["total"].as_f64().unwrap(), expected);
    assert_eq!(cell["has_expenses"], true);
}

#[tokio::test]
async fn http_delete_reports_missing_ids() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let created: Expense = create(
        &client,
        &server.base_url,
        json!({ "description": "Vé xe buýt", "amount": 7000, "category": "Di Chuyển", "date": "2030-09-01" }),
    )
    .await
    .json()
    .await
    .unwrap();

    let url = format!("{}/api/expenses/{}", server.base_url, created.id);
    let first = client.delete(&url).send().await.unwrap();
    assert_eq!(first.status(), StatusCode::NO_CONTENT);
    let second = client.delete(&url).send().await.unwrap();
    assert_eq!(second.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_stats_follow_settings() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let degenerate = client
        .put(format!("{}/api/settings", server.base_url))
        .json(&json!({ "totalBudget": 1000000, "startDate": "2030-01-11", "endDate": "2030-01-01" }))
        .send()
        .await
        .unwrap();
    assert!(degenerate.status().is_success());

    let stats: Stats = client
        .get(format!("{}/api/stats", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats.spent, 0.0);
    assert_eq!(stats.remaining, 0.0);
    assert_eq!(stats.days_remaining, 0);
    assert_eq!(stats.daily_allowance, 0.0);
    assert_eq!(stats.average_daily, 0.0);
    assert!(!stats.over_budget);
    assert!(!stats.low_budget);

    // a long window around every date used by these tests
    client
        .put(format!("{}/api/settings", server.base_url))
        .json(&json!({ "totalBudget": 1, "startDate": "2000-01-01", "endDate": "2099-12-31" }))
        .send()
        .await
        .unwrap();
    let stats: Stats = client
        .get(format!("{}/api/stats", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let total: f64 = client
        .get(format!("{}/api/expenses?from=2000-01-01&to=2099-12-31", server.base_url))
        .send()
        .await
        .unwrap()
        .json::<Vec<Expense>>()
        .await
        .unwrap()
        .iter()
        .map(|expense| expense.amount)
        .sum();
    assert_eq!(stats.spent, total);
}

#[tokio::test]
async fn http_debounced_settings_commit() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let queued = client
        .post(format!("{}/api/settings/draft", server.base_url))
        .json(&json!({ "totalBudget": "4242", "startDate": "2030-01-01", "endDate": "2030-12-31" }))
        .send()
        .await
        .unwrap();
    assert_eq!(queued.status(), StatusCode::ACCEPTED);

    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        let settings: Value = client
            .get(format!("{}/api/settings", server.base_url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if settings["totalBudget"].as_f64() == Some(4242.0) {
            assert_eq!(settings["startDate"], "2030-01-01");
            break;
        }
        if Instant::now() > deadline {
            panic!("debounced settings were never committed");
        }
        sleep(Duration::from_millis(50)).await;
    }
}

#[tokio::test]
async fn http_export_import_round_trip() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    create(
        &client,
        &server.base_url,
        json!({ "description": "Sách", "amount": 150000, "category": "Giáo Dục", "date": "2030-10-10" }),
    )
    .await;

    let export = client
        .get(format!("{}/export", server.base_url))
        .send()
        .await
        .unwrap();
    let disposition = export.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.contains("chi-tieu-"));
    let exported: Value = export.json().await.unwrap();
    assert_eq!(exported["version"], "1.0");
    assert!(exported["exportDate"].is_string());

    let malformed = client
        .post(format!("{}/api/import", server.base_url))
        .body("[1, 2, 3]")
        .send()
        .await
        .unwrap();
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);

    let imported = client
        .post(format!("{}/api/import", server.base_url))
        .body(exported.to_string())
        .send()
        .await
        .unwrap();
    assert!(imported.status().is_success());

    let after: Value = client
        .get(format!("{}/api/export", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(after["expenses"], exported["expenses"]);
    assert_eq!(after["categories"], exported["categories"]);
}

#[tokio::test]
async fn http_page_renders_day_modal() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    create(
        &client,
        &server.base_url,
        json!({ "description": "<b>Cơm tấm</b>", "amount": 35000, "category": "Ăn Uống", "date": "2030-11-20" }),
    )
    .await;

    let page = client
        .post(format!("{}/day/2030-11-20", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(page.status().is_success());
    let html = page.text().await.unwrap();
    assert!(html.contains(r#"<html lang="vi-VN">"#));
    assert!(html.contains("Chi tiêu ngày 20/11/2030"));
    assert!(html.contains("&lt;b&gt;Cơm tấm&lt;/b&gt;"));

    let closed = client
        .post(format!("{}/modal/close", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(!closed.contains("Chi tiêu ngày 20/11/2030"));
}
