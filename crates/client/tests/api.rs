use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use axum::{
    Json, Router,
    extract::{Multipart, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use api_types::entry::{EntryId, EntryNew};
use client::{Client, ClientError};
use engine::Credentials;

const KEY: &str = "s3cr3t";
const REPORT: &str = "日付\t部類\tリク\tあん\t備考\n2024-04-21\t日常\t-1234\t\tスーパー\n";

#[derive(Clone, Default)]
struct Ledger {
    sent: Arc<Mutex<Vec<Value>>>,
    withdrawn: Arc<Mutex<Vec<Value>>>,
}

#[derive(Deserialize)]
struct Auth {
    key: Option<String>,
}

fn rejected(auth: &Auth) -> Option<Response> {
    (auth.key.as_deref() != Some(KEY)).then(|| {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "bad key" })),
        )
            .into_response()
    })
}

async fn upload(Query(auth): Query<Auth>, mut multipart: Multipart) -> Response {
    if let Some(resp) = rejected(&auth) {
        return resp;
    }
    let mut picture = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("picture") {
            let name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.unwrap_or_default();
            picture = Some((name, bytes));
        }
    }
    match picture {
        Some((_, bytes)) if bytes.is_empty() => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": "empty picture" })),
        )
            .into_response(),
        Some((name, _)) if name == "blurry.jpg" => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "detail": [
                    { "loc": ["body", "picture"], "msg": "picture is unreadable", "type": "value_error" },
                    { "loc": ["body", "picture"], "msg": "no receipt edge found", "type": "value_error" },
                ]
            })),
        )
            .into_response(),
        Some((name, bytes)) => Json(json!({
            "receipts": [
                { "date": "2024-04-21", "amount": bytes.len(), "registration": "T1234567890123" },
                { "remark": name },
            ]
        }))
        .into_response(),
        None => (StatusCode::BAD_REQUEST, Json(json!({ "detail": "no picture" }))).into_response(),
    }
}

async fn send(
    State(ledger): State<Ledger>,
    Query(auth): Query<Auth>,
    Json(body): Json<Value>,
) -> Response {
    if let Some(resp) = rejected(&auth) {
        return resp;
    }
    let mut sent = ledger.sent.lock().unwrap();
    sent.push(body);
    let id = if sent.len() == 1 {
        json!(1714521600)
    } else {
        json!(format!("1714521600+{}", sent.len() - 1))
    };
    Json(json!({ "id": id })).into_response()
}

async fn withdraw(
    State(ledger): State<Ledger>,
    Query(auth): Query<Auth>,
    Json(body): Json<Value>,
) -> Response {
    if let Some(resp) = rejected(&auth) {
        return resp;
    }
    if body["id"] == json!(404) {
        return (StatusCode::NOT_FOUND, Json(json!({ "detail": "no such entry" }))).into_response();
    }
    ledger.withdrawn.lock().unwrap().push(body);
    Json(json!({})).into_response()
}

async fn download(Query(auth): Query<Auth>) -> Response {
    if let Some(resp) = rejected(&auth) {
        return resp;
    }
    (
        [
            (header::CONTENT_TYPE, "text/tab-separated-values"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"kakeibo-2024-04-30.tsv\"",
            ),
        ],
        REPORT,
    )
        .into_response()
}

async fn spawn_ledger() -> (String, Ledger) {
    let ledger = Ledger::default();
    let app = Router::new()
        .route("/api/upload", post(upload))
        .route("/api/send", post(send))
        .route("/api/withdraw", post(withdraw))
        .route("/api/download", get(download))
        .with_state(ledger.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), ledger)
}

fn client(base_url: &str, key: &str) -> Client {
    Client::new(base_url, &Credentials::parse(&format!("riku:{key}")).unwrap()).unwrap()
}

fn download_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../target/test_downloads")
        .join(Uuid::new_v4().to_string())
}

fn entry() -> EntryNew {
    EntryNew {
        date: NaiveDate::from_ymd_opt(2024, 4, 21).unwrap(),
        riku: Some(-1234),
        anju: None,
        remark: "スーパー".to_string(),
        category: "日常".to_string(),
        registration: "T1234567890123".to_string(),
    }
}

#[tokio::test]
async fn upload_returns_receipts() {
    let (url, _) = spawn_ledger().await;
    let receipts = client(&url, KEY)
        .upload_bytes("receipt.jpg", vec![0xff; 42])
        .await
        .unwrap();

    assert_eq!(receipts.len(), 2);
    assert_eq!(receipts[0].amount, Some(42));
    assert_eq!(receipts[0].registration.as_deref(), Some("T1234567890123"));
    assert_eq!(receipts[1].remark.as_deref(), Some("receipt.jpg"));
    assert_eq!(receipts[1].amount, None);
}

#[tokio::test]
async fn upload_reads_picture_from_disk() {
    let (url, _) = spawn_ledger().await;
    let dir = download_dir();
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("scan.png");
    std::fs::write(&path, [1u8, 2, 3]).unwrap();

    let receipts = client(&url, KEY).upload(&path).await.unwrap();
    assert_eq!(receipts[0].amount, Some(3));
    assert_eq!(receipts[1].remark.as_deref(), Some("scan.png"));

    let missing = client(&url, KEY).upload(&dir.join("nope.jpg")).await;
    assert!(matches!(missing, Err(ClientError::Io(_))));
}

#[tokio::test]
async fn upload_error_detail_is_reported() {
    let (url, _) = spawn_ledger().await;
    let err = client(&url, KEY)
        .upload_bytes("empty.jpg", Vec::new())
        .await
        .unwrap_err();
    match err {
        ClientError::Server { status, message } => {
            assert_eq!(status.as_u16(), 422);
            assert_eq!(message, "empty picture");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn validation_error_list_is_reported() {
    let (url, _) = spawn_ledger().await;
    let err = client(&url, KEY)
        .upload_bytes("blurry.jpg", vec![1, 2, 3])
        .await
        .unwrap_err();
    match err {
        ClientError::Server { status, message } => {
            assert_eq!(status.as_u16(), 422);
            assert_eq!(message, "picture is unreadable; no receipt edge found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn send_posts_entry_and_returns_id() {
    let (url, ledger) = spawn_ledger().await;
    let client = client(&url, KEY);

    let first = client.send(&entry()).await.unwrap();
    let second = client.send(&entry()).await.unwrap();
    assert_eq!(first, EntryId::Number(1714521600));
    assert_eq!(second, EntryId::Text("1714521600+1".to_string()));

    let sent = ledger.sent.lock().unwrap();
    assert_eq!(
        sent[0],
        json!({
            "date": "2024-04-21",
            "riku": -1234,
            "anju": null,
            "remark": "スーパー",
            "category": "日常",
            "registration": "T1234567890123",
        })
    );
}

#[tokio::test]
async fn wrong_key_is_unauthorized() {
    let (url, ledger) = spawn_ledger().await;
    let err = client(&url, "wrong").send(&entry()).await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(ledger.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn withdraw_echoes_id_shape() {
    let (url, ledger) = spawn_ledger().await;
    let client = client(&url, KEY);

    client
        .withdraw(&EntryId::Text("1714521600+1".to_string()))
        .await
        .unwrap();
    assert_eq!(
        ledger.withdrawn.lock().unwrap()[0],
        json!({ "id": "1714521600+1" })
    );

    let err = client.withdraw(&EntryId::Number(404)).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Server { ref message, .. } if message == "no such entry"
    ));
}

#[tokio::test]
async fn download_saves_report_under_attachment_name() {
    let (url, _) = spawn_ledger().await;
    let dir = download_dir();
    let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

    let path = client(&url, KEY).download(&dir, today).await.unwrap();

    assert_eq!(path, dir.join("kakeibo-2024-04-30.tsv"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), REPORT);
    let _ = std::fs::remove_dir_all(&dir);
}
