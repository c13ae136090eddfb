// tests/api_client_test.rs — ApiClient against an in-process mock backend

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use taskmaster::api::types::*;
use taskmaster::api::{fetch_all_tasks, ApiClient, AuthApi, TaskApi};
use taskmaster::infra::errors::TaskMasterError;

const TOKEN: &str = "test-token";
const TOTAL_TASKS: usize = 150;

// ---------- Mock backend ----------

#[derive(Clone, Default)]
struct Backend {
    /// Query strings seen by GET /tasks.
    list_queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    /// Bodies seen by PATCH /tasks/{id}.
    patches: Arc<Mutex<Vec<Value>>>,
    /// Server-side ceiling on `limit`, if any.
    page_cap: Option<usize>,
}

type Reply = (StatusCode, Json<Value>);

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {TOKEN}"))
        .unwrap_or(false)
}

fn unauthorized() -> Reply {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Authentication required" })),
    )
}

fn wire_task(i: usize) -> Value {
    json!({
        "_id": format!("task-{i:03}"),
        "title": format!("Task {i}"),
        "priority": (i % 5) + 1,
        "status": if i % 2 == 0 { "pending" } else { "finished" },
        // Naive timestamps, as some backends emit them
        "startTime": "2024-03-01T08:00:00",
        "endTime": "2024-03-01T10:30:00.000Z",
        "userId": "u1",
    })
}

async fn list_tasks(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    if !authorized(&headers) {
        return unauthorized();
    }
    backend.list_queries.lock().unwrap().push(params.clone());

    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let limit: usize = params.get("limit").and_then(|l| l.parse().ok()).unwrap_or(10);
    let limit = backend.page_cap.map_or(limit, |cap| limit.min(cap));
    let tasks: Vec<Value> = (0..TOTAL_TASKS)
        .skip((page - 1) * limit)
        .take(limit)
        .map(wire_task)
        .collect();
    (
        StatusCode::OK,
        Json(json!({ "tasks": tasks, "total": TOTAL_TASKS })),
    )
}

async fn update_task(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    if !authorized(&headers) {
        return unauthorized();
    }
    if id == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Task not found" })),
        );
    }
    backend.patches.lock().unwrap().push(body.clone());

    let mut task = wire_task(0);
    task["_id"] = json!(id);
    if let Some(status) = body.get("status") {
        task["status"] = status.clone();
    }
    if let Some(end) = body.get("endTime") {
        task["endTime"] = end.clone();
    }
    (StatusCode::OK, Json(task))
}

async fn delete_task(headers: HeaderMap, Path(id): Path<String>) -> StatusCode {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED;
    }
    if id == "missing" {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    }
}

async fn create_task(headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    if !authorized(&headers) {
        return unauthorized();
    }
    if body["title"].as_str().unwrap_or("").is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "\"title\" is not allowed to be empty" })),
        );
    }
    let mut task = body.clone();
    task["_id"] = json!("created-1");
    task["status"] = json!("pending");
    (StatusCode::CREATED, Json(task))
}

async fn stats(headers: HeaderMap) -> Reply {
    if !authorized(&headers) {
        return unauthorized();
    }
    (
        StatusCode::OK,
        Json(json!({
            "overview": {
                "totalTasks": 10,
                "completedTasks": 4,
                "pendingTasks": 6,
                "completedPercentage": 40,
                "pendingPercentage": 60,
                "averageTime": 2.5
            },
            "timeMetrics": {
                "averageCompletionTime": 2.5,
                "totalTimeElapsed": 12.0,
                "totalTimeToFinish": 30.0,
                "pendingTasksByPriority": [
                    { "priority": 5, "count": 2, "timeElapsed": 4.0, "estimatedTimeLeft": 10.0 }
                ]
            }
        })),
    )
}

async fn login(Json(body): Json<Value>) -> Reply {
    if body["password"] != "secret" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid email or password" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "token": TOKEN,
            "user": { "id": "u1", "email": body["email"] }
        })),
    )
}

async fn spawn_backend() -> (String, Backend) {
    spawn_backend_with(Backend::default()).await
}

async fn spawn_backend_with(backend: Backend) -> (String, Backend) {
    let app = Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/stats", get(stats))
        .route("/tasks/{id}", patch(update_task).delete(delete_task))
        .route("/auth/login", post(login))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/"), backend)
}

// ---------- Tests ----------

#[tokio::test]
async fn test_fetch_all_tasks_walks_pages() {
    let (url, backend) = spawn_backend().await;
    let client = ApiClient::new(url).with_token(TOKEN);

    let tasks = fetch_all_tasks(&client).await.unwrap();
    assert_eq!(tasks.len(), TOTAL_TASKS);
    assert_eq!(tasks[0].id, "task-000");
    assert_eq!(tasks[0].user_id.as_deref(), Some("u1"));
    assert_eq!(tasks[1].status, TaskStatus::Finished);
    assert_eq!(tasks[0].duration_hours(), 3); // 2.5h rounds up

    let queries = backend.list_queries.lock().unwrap().clone();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0].get("page").map(String::as_str), Some("1"));
    assert_eq!(queries[1].get("page").map(String::as_str), Some("2"));
    assert_eq!(queries[0].get("limit").map(String::as_str), Some("100"));
}

#[tokio::test]
async fn test_fetch_all_tasks_with_capped_page_size() {
    let (url, backend) = spawn_backend_with(Backend {
        page_cap: Some(50),
        ..Default::default()
    })
    .await;
    let client = ApiClient::new(url).with_token(TOKEN);

    let tasks = fetch_all_tasks(&client).await.unwrap();
    assert_eq!(tasks.len(), TOTAL_TASKS);
    assert_eq!(tasks.last().map(|t| t.id.as_str()), Some("task-149"));

    let pages: Vec<String> = backend
        .list_queries
        .lock()
        .unwrap()
        .iter()
        .filter_map(|q| q.get("page").cloned())
        .collect();
    assert_eq!(pages, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_list_params_sent_as_query() {
    let (url, backend) = spawn_backend().await;
    let client = ApiClient::new(url).with_token(TOKEN);

    let params = TaskListParams {
        page: Some(2),
        limit: Some(5),
        priority: Some(4),
        status: Some(TaskStatus::Pending),
        field: Some("endTime".into()),
        order: Some("desc".into()),
    };
    let resp = client.list_tasks(&params).await.unwrap();
    assert_eq!(resp.tasks.len(), 5);
    assert_eq!(resp.total, TOTAL_TASKS);

    let q = backend.list_queries.lock().unwrap()[0].clone();
    assert_eq!(q.get("priority").map(String::as_str), Some("4"));
    assert_eq!(q.get("status").map(String::as_str), Some("pending"));
    assert_eq!(q.get("field").map(String::as_str), Some("endTime"));
    assert_eq!(q.get("order").map(String::as_str), Some("desc"));
}

#[tokio::test]
async fn test_missing_token_is_remote_error() {
    let (url, _backend) = spawn_backend().await;
    let client = ApiClient::new(url);

    let err = client.stats().await.unwrap_err();
    match err {
        TaskMasterError::Remote { status, ref message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Authentication required");
        }
        other => panic!("expected Remote, got {other:?}"),
    }
}

#[tokio::test]
async fn test_update_sends_only_patched_fields() {
    let (url, backend) = spawn_backend().await;
    let client = ApiClient::new(url).with_token(TOKEN);

    let patch = UpdateTaskInput {
        status: Some(TaskStatus::Finished),
        ..Default::default()
    };
    let task = client.update_task("abc", &patch).await.unwrap();
    assert_eq!(task.id, "abc");
    assert_eq!(task.status, TaskStatus::Finished);

    let bodies = backend.patches.lock().unwrap().clone();
    assert_eq!(bodies, vec![json!({ "status": "finished" })]);
}

#[tokio::test]
async fn test_task_id_sent_as_one_path_segment() {
    let (url, backend) = spawn_backend().await;
    let client = ApiClient::new(url).with_token(TOKEN);

    let patch = UpdateTaskInput {
        title: Some("Renamed".into()),
        ..Default::default()
    };
    let task = client.update_task("a/b?c", &patch).await.unwrap();
    assert_eq!(task.id, "a/b?c");
    assert_eq!(backend.patches.lock().unwrap().len(), 1);

    client.delete_task("x/y").await.unwrap();
}

#[tokio::test]
async fn test_not_found_maps_to_not_found() {
    let (url, _backend) = spawn_backend().await;
    let client = ApiClient::new(url).with_token(TOKEN);

    let err = client
        .update_task(
            "missing",
            &UpdateTaskInput {
                title: Some("x".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.detail(), "Task not found");

    // Empty 404 body falls back to the status text
    let err = client.delete_task("missing").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.detail(), "Not Found");

    client.delete_task("abc").await.unwrap();
}

#[tokio::test]
async fn test_create_error_field_is_used() {
    let (url, _backend) = spawn_backend().await;
    let client = ApiClient::new(url).with_token(TOKEN);

    let input = CreateTaskInput {
        title: String::new(),
        priority: Priority::new(3).unwrap(),
        start_time: parse_wire_timestamp("2024-03-01T08:00:00Z").unwrap(),
        end_time: parse_wire_timestamp("2024-03-01T09:00:00Z").unwrap(),
    };
    let err = client.create_task(&input).await.unwrap_err();
    assert_eq!(err.detail(), "\"title\" is not allowed to be empty");

    let created = client
        .create_task(&CreateTaskInput {
            title: "Ship it".into(),
            ..input
        })
        .await
        .unwrap();
    assert_eq!(created.id, "created-1");
    assert_eq!(created.title, "Ship it");
    assert_eq!(created.priority.value(), 3);
}

#[tokio::test]
async fn test_stats_decoding() {
    let (url, _backend) = spawn_backend().await;
    let client = ApiClient::new(url).with_token(TOKEN);

    let stats = client.stats().await.unwrap();
    assert_eq!(stats.overview.total_tasks, 10);
    assert_eq!(stats.completed_percent(), 40);
    let p5 = stats.pending_for(Priority::new(5).unwrap());
    assert_eq!(p5.count, 2);
    let p1 = stats.pending_for(Priority::new(1).unwrap());
    assert_eq!(p1.count, 0);
}

#[tokio::test]
async fn test_login_round_trip() {
    let (url, _backend) = spawn_backend().await;
    let client = ApiClient::new(url);

    let ok = client
        .login(&Credentials {
            email: "ada@example.com".into(),
            password: "secret".into(),
        })
        .await
        .unwrap();
    assert_eq!(ok.token, TOKEN);
    assert_eq!(ok.user.email, "ada@example.com");

    let err = client
        .login(&Credentials {
            email: "ada@example.com".into(),
            password: "wrong".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.detail(), "Invalid email or password");
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    // Bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::new(format!("http://{addr}")).with_token(TOKEN);
    let err = client.stats().await.unwrap_err();
    assert!(matches!(err, TaskMasterError::Network(_)));
}
