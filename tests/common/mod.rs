#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode},
};
use serde_json::Value;
use std::{
    fs,
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};
use tender::db::UserStorage;
use tender::router::{HttpSettings, tender_router};
use tender::service::UserService;
use tower::ServiceExt;

static NEXT_DB: AtomicUsize = AtomicUsize::new(0);

/// Router over a throwaway SQLite file, removed on drop.
pub struct TestApp {
    pub router: Router,
    pub storage: UserStorage,
    path: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm", "-journal"] {
            let _ = fs::remove_file(format!("{}{suffix}", self.path.display()));
        }
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(HttpSettings::default()).await
}

pub async fn spawn_app_with(settings: HttpSettings) -> TestApp {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut path = std::env::temp_dir();
    path.push(format!(
        "tender-test-{}-{}-{}.sqlite",
        std::process::id(),
        nanos,
        NEXT_DB.fetch_add(1, Ordering::SeqCst)
    ));

    let pool = tender::db::connect(&format!("sqlite://{}", path.display()))
        .await
        .expect("failed to open test database");
    let storage = UserStorage::new(pool);
    storage.init_schema().await.expect("failed to init schema");

    let router = tender_router(UserService::new(storage.clone()), &settings);
    TestApp {
        router,
        storage,
        path,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Drive any router once and decode the JSON body, if there is one.
pub async fn send(router: &Router, req: Request<Body>) -> TestResponse {
    let resp = router.clone().oneshot(req).await.expect("request failed");
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body was not JSON")
    };
    TestResponse {
        status,
        headers,
        body,
    }
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        send(&self.router, req).await
    }

    pub async fn signup(&self, payload: Value) -> TestResponse {
        self.send(
            Request::builder()
                .method("POST")
                .uri("/signup")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .expect("failed to build request"),
        )
        .await
    }

    pub async fn list_users(&self) -> TestResponse {
        self.send(
            Request::builder()
                .method("GET")
                .uri("/users")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
    }
}

pub fn assert_cross_origin_headers(headers: &HeaderMap) {
    assert_eq!(headers["cross-origin-opener-policy"], "same-origin");
    assert_eq!(headers["cross-origin-embedder-policy"], "require-corp");
    assert_eq!(headers["cross-origin-resource-policy"], "same-origin");
}
