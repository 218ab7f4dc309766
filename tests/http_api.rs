//! End-to-end router tests over in-memory backends.
//!
//! The real Postgres and Redis adapters are replaced by mock implementations
//! of the store/cache traits with failure injection, so these exercise the
//! full boundary: auth middleware, validation, the coordinator policy, and
//! status mapping.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use compito::application::auth::Principal;
use compito::application::repos::{CacheError, StoreError, TaskCache, TaskStore};
use compito::application::tasks::TaskService;
use compito::config::AuthTokenSettings;
use compito::domain::task::Task;
use compito::infra::auth::StaticTokenValidator;
use compito::infra::http::{AppState, build_router};

const TOKEN: &str = "integration-test-token";

#[derive(Default)]
struct MemoryStore {
    rows: Mutex<HashMap<i64, Task>>,
}

#[async_trait::async_trait]
impl TaskStore for MemoryStore {
    async fn add_task(&self, task: &Task) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&task.id) {
            return Err(StoreError::AlreadyExists);
        }
        rows.insert(task.id, task.clone());
        Ok(())
    }

    async fn get_task(&self, id: i64) -> Result<Task, StoreError> {
        self.rows
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_all_tasks(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }

    async fn update_task(&self, task: &Task) -> Result<Task, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        if !rows.contains_key(&task.id) {
            return Err(StoreError::NotFound);
        }
        rows.insert(task.id, task.clone());
        Ok(task.clone())
    }

    async fn delete_task(&self, id: i64) -> Result<(), StoreError> {
        match self.rows.lock().unwrap().remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound),
        }
    }
}

#[derive(Default)]
struct MemoryCache {
    entries: Mutex<HashMap<i64, Task>>,
    unavailable: bool,
}

impl MemoryCache {
    fn down() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    fn entry(&self, id: i64) -> Option<Task> {
        self.entries.lock().unwrap().get(&id).cloned()
    }

    fn check_up(&self) -> Result<(), CacheError> {
        if self.unavailable {
            Err(CacheError::unavailable("connection refused"))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl TaskCache for MemoryCache {
    async fn get(&self, id: i64) -> Result<Task, CacheError> {
        self.check_up()?;
        self.entry(id).ok_or(CacheError::NotFound)
    }

    async fn set(&self, task: &Task) -> Result<(), CacheError> {
        self.check_up()?;
        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(&task.id) {
            return Err(CacheError::AlreadyCached);
        }
        entries.insert(task.id, task.clone());
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), CacheError> {
        self.check_up()?;
        match self.entries.lock().unwrap().remove(&id) {
            Some(_) => Ok(()),
            None => Err(CacheError::NotFound),
        }
    }
}

fn router_with(cache: MemoryCache) -> (Router, Arc<MemoryStore>, Arc<MemoryCache>) {
    let store = Arc::new(MemoryStore::default());
    let cache = Arc::new(cache);
    let state = AppState {
        tasks: Arc::new(TaskService::new(store.clone(), cache.clone())),
        auth: Arc::new(StaticTokenValidator::new(&[AuthTokenSettings {
            token: TOKEN.to_string(),
            subject: "tests".to_string(),
        }])),
    };
    (build_router(state), store, cache)
}

fn router() -> (Router, Arc<MemoryStore>, Arc<MemoryCache>) {
    router_with(MemoryCache::default())
}

fn authed(request: axum::http::request::Builder) -> axum::http::request::Builder {
    request.header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    authed(Request::builder().method(method).uri(uri))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    authed(Request::builder().method(method).uri(uri))
        .body(Body::empty())
        .unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

fn task_payload(name: &str, description: &str) -> serde_json::Value {
    serde_json::json!({ "name": name, "description": description })
}

#[tokio::test]
async fn full_lifecycle() {
    let (router, _, _) = router();

    let (status, body) = send(
        &router,
        json_request("POST", "/tasks/1", task_payload("A", "B")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created: Task = serde_json::from_slice(&body).unwrap();
    assert_eq!(created, Task::new(1, "A", "B").unwrap());

    let (status, body) = send(&router, empty_request("GET", "/tasks/1")).await;
    assert_eq!(status, StatusCode::OK);
    let fetched: Task = serde_json::from_slice(&body).unwrap();
    assert_eq!(fetched, created);

    let (status, body) = send(
        &router,
        json_request("PUT", "/tasks/1", task_payload("C", "D")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let updated: Task = serde_json::from_slice(&body).unwrap();
    assert_eq!(updated, Task::new(1, "C", "D").unwrap());

    // Never the stale pre-update content.
    let (status, body) = send(&router, empty_request("GET", "/tasks/1")).await;
    assert_eq!(status, StatusCode::OK);
    let fetched: Task = serde_json::from_slice(&body).unwrap();
    assert_eq!(fetched, updated);

    let (status, _) = send(&router, empty_request("DELETE", "/tasks/1")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&router, empty_request("GET", "/tasks/1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_on_empty_store_is_404_and_caches_nothing() {
    let (router, _, cache) = router();

    let (status, _) = send(&router, empty_request("GET", "/tasks/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(cache.entry(999).is_none());
}

#[tokio::test]
async fn duplicate_create_is_409() {
    let (router, store, _) = router();

    let (status, _) = send(
        &router,
        json_request("POST", "/tasks/1", task_payload("A", "B")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &router,
        json_request("POST", "/tasks/1", task_payload("other", "payload")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"]["code"], "duplicate");

    // Store content for the id is unchanged.
    assert_eq!(
        store.rows.lock().unwrap().get(&1).unwrap(),
        &Task::new(1, "A", "B").unwrap()
    );
}

#[tokio::test]
async fn update_absent_id_is_404() {
    let (router, _, _) = router();

    let (status, _) = send(
        &router,
        json_request("PUT", "/tasks/42", task_payload("C", "D")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_returns_everything_from_the_store() {
    let (router, _, _) = router();

    for id in 1..=3 {
        let (status, _) = send(
            &router,
            json_request("POST", &format!("/tasks/{id}"), task_payload("n", "d")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&router, empty_request("GET", "/tasks")).await;
    assert_eq!(status, StatusCode::OK);
    let mut tasks: Vec<Task> = serde_json::from_slice(&body).unwrap();
    tasks.sort_by_key(|task| task.id);
    assert_eq!(tasks.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[tokio::test]
async fn cache_outage_changes_no_status() {
    let (router, _, _) = router_with(MemoryCache::down());

    let (status, _) = send(
        &router,
        json_request("POST", "/tasks/1", task_payload("A", "B")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&router, empty_request("GET", "/tasks/1")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &router,
        json_request("PUT", "/tasks/1", task_payload("C", "D")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&router, empty_request("GET", "/tasks")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&router, empty_request("DELETE", "/tasks/1")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&router, empty_request("GET", "/tasks/1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn validation_failures_are_400() {
    let (router, _, _) = router();

    // Empty name.
    let (status, body) = send(
        &router,
        json_request("POST", "/tasks/1", task_payload("", "B")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"]["code"], "invalid_input");

    // Missing description field entirely.
    let (status, _) = send(
        &router,
        json_request("POST", "/tasks/1", serde_json::json!({ "name": "A" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Non-positive id in the path.
    let (status, _) = send(
        &router,
        json_request("POST", "/tasks/0", task_payload("A", "B")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&router, empty_request("GET", "/tasks/0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Non-numeric id never reaches a handler.
    let (status, _) = send(&router, empty_request("GET", "/tasks/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn auth_is_enforced() {
    let (router, _, _) = router();

    // Missing header.
    let request = Request::builder()
        .method("GET")
        .uri("/tasks")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Wrong scheme.
    let request = Request::builder()
        .method("GET")
        .uri("/tasks")
        .header(header::AUTHORIZATION, format!("Basic {TOKEN}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Unknown token.
    let request = Request::builder()
        .method("GET")
        .uri("/tasks")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn authenticated_subject_is_attributed_to_the_request() {
    let (router, _, _) = router();

    let response = router
        .clone()
        .oneshot(empty_request("GET", "/tasks"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let principal = response.extensions().get::<Principal>().unwrap();
    assert_eq!(principal.subject, "tests");

    // A rejected request never carries a subject.
    let request = Request::builder()
        .method("GET")
        .uri("/tasks")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.extensions().get::<Principal>().is_none());
}

#[tokio::test]
async fn get_populates_cache_and_update_evicts_it() {
    let (router, _, cache) = router();

    let (status, _) = send(
        &router,
        json_request("POST", "/tasks/1", task_payload("A", "B")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(cache.entry(1).is_none());

    let (status, _) = send(&router, empty_request("GET", "/tasks/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache.entry(1).unwrap(), Task::new(1, "A", "B").unwrap());

    let (status, _) = send(
        &router,
        json_request("PUT", "/tasks/1", task_payload("C", "D")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cache.entry(1).is_none());
}
