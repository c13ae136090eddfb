// src/api/mod.rs — REST client for the task service
//
// Every request carries the session token as a bearer credential. Non-2xx
// responses are turned into TaskMasterError with the server's own message
// when the body has one.

pub mod auth;
pub mod types;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::infra::errors::{Result, TaskMasterError};
pub use types::*;

/// Rows requested per page when walking the whole collection.
pub const FETCH_PAGE_LIMIT: usize = 100;

/// Upper bound on pages walked by `fetch_all_tasks`.
const MAX_FETCH_PAGES: usize = 1_000;

/// Task endpoints. Implemented over HTTP by `ApiClient`; tests substitute
/// in-memory fakes.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_tasks(&self, params: &TaskListParams) -> Result<TasksResponse>;
    async fn create_task(&self, input: &CreateTaskInput) -> Result<Task>;
    async fn update_task(&self, id: &str, input: &UpdateTaskInput) -> Result<Task>;
    async fn delete_task(&self, id: &str) -> Result<()>;
    async fn stats(&self) -> Result<TaskStats>;
}

/// Account endpoints.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse>;
    async fn signup(&self, credentials: &Credentials) -> Result<AuthResponse>;
}

/// HTTP client bound to one backend and, optionally, one session token.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        self.request_to(method, &url, path)
    }

    fn request_to(&self, method: Method, url: &str, path: &str) -> RequestBuilder {
        tracing::debug!("API request: {method} {path}");
        let builder = self.client.request(method, url);
        match self.token {
            Some(ref token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and hand back the response only if it succeeded.
    async fn send(&self, builder: RequestBuilder, path: &str) -> Result<Response> {
        let resp = builder
            .send()
            .await
            .map_err(|e| TaskMasterError::Network(e.to_string()))?;

        let status = resp.status();
        tracing::debug!("API response: {path} -> {status}");
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let err = error_from_response(status, &body);
        tracing::warn!("API error: {path} -> {err}");
        Err(err)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        path: &str,
    ) -> Result<T> {
        let resp = self.send(builder, path).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| TaskMasterError::Network(e.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// `{base}/tasks/{id}`, with the id encoded as a single path segment.
    pub fn task_url(&self, id: &str) -> Result<url::Url> {
        let mut url = url::Url::parse(&self.base_url).map_err(|e| {
            TaskMasterError::Config(format!("invalid api.base_url '{}': {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                TaskMasterError::Config(format!("api.base_url '{}' cannot hold a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(["tasks", id]);
        Ok(url)
    }

    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::POST, path).json(body);
        self.send_json(builder, path).await
    }
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Map a failed response to an error, preferring `message`, then `error`,
/// then the raw body, then the status text.
pub fn error_from_response(status: StatusCode, body: &str) -> TaskMasterError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            let raw = body.trim();
            if raw.is_empty() || raw.starts_with('{') {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            } else {
                raw.to_string()
            }
        });

    if status == StatusCode::NOT_FOUND {
        TaskMasterError::NotFound { message }
    } else {
        TaskMasterError::Remote {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl TaskApi for ApiClient {
    async fn list_tasks(&self, params: &TaskListParams) -> Result<TasksResponse> {
        let builder = self.request(Method::GET, "/tasks").query(params);
        self.send_json(builder, "/tasks").await
    }

    async fn create_task(&self, input: &CreateTaskInput) -> Result<Task> {
        self.post_json("/tasks", input).await
    }

    async fn update_task(&self, id: &str, input: &UpdateTaskInput) -> Result<Task> {
        let url = self.task_url(id)?;
        let path = url.path().to_string();
        tracing::debug!("Updating task {id}: {input:?}");
        let builder = self.request_to(Method::PATCH, url.as_str(), &path).json(input);
        self.send_json(builder, &path).await
    }

    async fn delete_task(&self, id: &str) -> Result<()> {
        let url = self.task_url(id)?;
        let path = url.path().to_string();
        let builder = self.request_to(Method::DELETE, url.as_str(), &path);
        self.send(builder, &path).await?;
        Ok(())
    }

    async fn stats(&self) -> Result<TaskStats> {
        let builder = self.request(Method::GET, "/tasks/stats");
        self.send_json(builder, "/tasks/stats").await
    }
}

/// Collect every task visible to the session by walking server pages.
/// Filtering, sorting and paging for display happen client-side afterwards.
/// The server may cap `limit` below the requested size, so only an empty
/// page or reaching `total` ends the walk.
pub async fn fetch_all_tasks(api: &dyn TaskApi) -> Result<Vec<Task>> {
    let mut tasks = Vec::new();

    for page in 1..=MAX_FETCH_PAGES {
        let params = TaskListParams {
            page: Some(page),
            limit: Some(FETCH_PAGE_LIMIT),
            ..Default::default()
        };
        let resp = api.list_tasks(&params).await?;
        let received = resp.tasks.len();
        tasks.extend(resp.tasks);

        if received == 0 || tasks.len() >= resp.total {
            break;
        }
    }

    tracing::debug!("Fetched {} tasks", tasks.len());
    Ok(tasks)
}
