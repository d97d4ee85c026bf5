use crate::config::{ApiConfig, PaginationDialect, SortOrder};
use crate::tasks::api_types::{self, NewTaskBody};
use crate::tasks::error::ApiError;
use crate::tasks::types::{Page, Task, TaskFormData, TaskId, TaskPatch};
use chrono::Utc;
use color_eyre::{eyre::eyre, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Typed client for the `/tasks` REST collection.
///
/// Stateless apart from connection pooling: no caching and no retries happen
/// at this layer.
#[derive(Clone, Debug)]
pub struct TaskClient {
  http: reqwest::Client,
  base_url: Url,
  dialect: PaginationDialect,
  sort_field: String,
  sort_order: SortOrder,
  user_id: u64,
}

impl TaskClient {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let base_url = Url::parse(config.url.trim_end_matches('/'))
      .map_err(|e| eyre!("Invalid API url '{}': {}", config.url, e))?;

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url,
      dialect: config.pagination,
      sort_field: config.sort_field.clone(),
      sort_order: config.sort_order,
      user_id: config.user_id,
    })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  pub fn dialect(&self) -> PaginationDialect {
    self.dialect
  }

  fn collection_url(&self) -> String {
    format!("{}/tasks", self.base_url.as_str().trim_end_matches('/'))
  }

  fn item_url(&self, id: TaskId) -> String {
    format!("{}/{}", self.collection_url(), id)
  }

  /// Fetch the page starting `cursor` items into the collection.
  pub async fn list(&self, cursor: usize, limit: usize) -> Result<Page, ApiError> {
    let params = pagination_params(
      self.dialect,
      cursor,
      limit,
      &self.sort_field,
      self.sort_order,
    )?;
    debug!(cursor, limit, dialect = ?self.dialect, "GET /tasks");

    let response = self
      .http
      .get(self.collection_url())
      .query(&params)
      .send()
      .await?;
    let response = check_status(response).await?;

    let total = match api_types::total_count(response.headers()) {
      Some(total) => total,
      None => {
        warn!("list response carries no usable X-Total-Count header, assuming 0");
        0
      }
    };

    let tasks: Vec<Task> = decode(response).await?;
    let page = Page::from_response(cursor, tasks, total);
    debug!(
      returned = page.tasks.len(),
      total = page.total,
      has_more = page.has_more,
      "task page received"
    );
    Ok(page)
  }

  /// Fetch a single task
  pub async fn get(&self, id: TaskId) -> Result<Task, ApiError> {
    debug!(id, "GET /tasks/:id");
    let response = self.http.get(self.item_url(id)).send().await?;
    decode(check_status(response).await?).await
  }

  /// Create a task, filling server-required defaults
  pub async fn create(&self, form: TaskFormData) -> Result<Task, ApiError> {
    let body = NewTaskBody::from_form(form, self.user_id, Utc::now());
    debug!(title = %body.title, "POST /tasks");
    let response = self
      .http
      .post(self.collection_url())
      .json(&body)
      .send()
      .await?;
    decode(check_status(response).await?).await
  }

  /// Apply a partial update and return the server's version of the task
  pub async fn update(&self, id: TaskId, patch: &TaskPatch) -> Result<Task, ApiError> {
    debug!(id, ?patch, "PATCH /tasks/:id");
    let response = self
      .http
      .patch(self.item_url(id))
      .json(patch)
      .send()
      .await?;
    decode(check_status(response).await?).await
  }

  pub async fn remove(&self, id: TaskId) -> Result<(), ApiError> {
    debug!(id, "DELETE /tasks/:id");
    let response = self.http.delete(self.item_url(id)).send().await?;
    check_status(response).await?;
    Ok(())
  }
}

/// Translate a cursor (items already loaded) into the backend's query
/// parameters for the configured dialect.
pub fn pagination_params(
  dialect: PaginationDialect,
  cursor: usize,
  limit: usize,
  sort_field: &str,
  sort_order: SortOrder,
) -> Result<Vec<(&'static str, String)>, ApiError> {
  let limit = limit.max(1);
  let mut params = match dialect {
    PaginationDialect::Offset => vec![
      ("_start", cursor.to_string()),
      ("_limit", limit.to_string()),
    ],
    PaginationDialect::Page => {
      if cursor % limit != 0 {
        return Err(ApiError::MisalignedCursor { cursor, limit });
      }
      vec![
        ("_page", (cursor / limit + 1).to_string()),
        ("_limit", limit.to_string()),
      ]
    }
  };

  if !sort_field.is_empty() {
    params.push(("_sort", sort_field.to_string()));
    params.push(("_order", sort_order.as_str().to_string()));
  }

  Ok(params)
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }

  let body = match response.text().await {
    Ok(body) => body,
    Err(e) => {
      warn!(status = status.as_u16(), error = %e, "could not read error response body");
      String::new()
    }
  };
  warn!(status = status.as_u16(), "request failed");
  Err(ApiError::Http {
    status: status.as_u16(),
    body,
  })
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
  let bytes = response.bytes().await?;
  Ok(serde_json::from_slice(&bytes)?)
}


#[cfg(test)]
mod tests {
  use super::test_support::{client_for, tasks_json};
  use super::*;
  use crate::tasks::types::Priority;
  use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  #[test]
  fn test_offset_params() {
    let params = pagination_params(PaginationDialect::Offset, 40, 20, "id", SortOrder::Desc).unwrap();
    assert_eq!(
      params,
      vec![
        ("_start", "40".to_string()),
        ("_limit", "20".to_string()),
        ("_sort", "id".to_string()),
        ("_order", "desc".to_string()),
      ]
    );
  }

  #[test]
  fn test_page_params() {
    let params = pagination_params(PaginationDialect::Page, 40, 20, "", SortOrder::Asc).unwrap();
    assert_eq!(
      params,
      vec![("_page", "3".to_string()), ("_limit", "20".to_string())]
    );
  }

  #[test]
  fn test_page_params_reject_misaligned_cursor() {
    let err = pagination_params(PaginationDialect::Page, 25, 20, "id", SortOrder::Desc).unwrap_err();
    assert_eq!(
      err,
      ApiError::MisalignedCursor {
        cursor: 25,
        limit: 20
      }
    );
  }

  #[tokio::test]
  async fn test_list_offset_dialect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/tasks"))
      .and(query_param("_start", "0"))
      .and(query_param("_limit", "3"))
      .and(query_param("_sort", "id"))
      .and(query_param("_order", "desc"))
      .respond_with(
        ResponseTemplate::new(200)
          .insert_header("X-Total-Count", "5")
          .set_body_json(tasks_json([10, 9, 8])),
      )
      .mount(&server)
      .await;

    let client = client_for(&server.uri(), PaginationDialect::Offset);
    let page = client.list(0, 3).await.unwrap();

    let ids: Vec<_> = page.tasks.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![10, 9, 8]);
    assert!(page.has_more);
    assert_eq!(page.next_cursor, Some(3));
    assert_eq!(page.total, 5);
  }

  #[tokio::test]
  async fn test_list_page_dialect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/tasks"))
      .and(query_param("_page", "2"))
      .and(query_param("_limit", "3"))
      .respond_with(
        ResponseTemplate::new(200)
          .insert_header("X-Total-Count", "5")
          .set_body_json(tasks_json([7, 6])),
      )
      .mount(&server)
      .await;

    let client = client_for(&server.uri(), PaginationDialect::Page);
    let page = client.list(3, 3).await.unwrap();

    assert_eq!(page.tasks.len(), 2);
    assert!(!page.has_more);
    assert_eq!(page.next_cursor, None);
  }

  #[tokio::test]
  async fn test_list_without_total_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/tasks"))
      .respond_with(ResponseTemplate::new(200).set_body_json(tasks_json([1, 2])))
      .mount(&server)
      .await;

    let client = client_for(&server.uri(), PaginationDialect::Offset);
    let page = client.list(0, 20).await.unwrap();
    assert_eq!(page.total, 0);
    assert!(!page.has_more);
  }

  #[tokio::test]
  async fn test_base_url_with_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/tasks/4"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(serde_json::to_value(crate::tasks::types::fixtures::task(4)).unwrap()),
      )
      .mount(&server)
      .await;

    let client = client_for(&format!("{}/api/", server.uri()), PaginationDialect::Offset);
    let task = client.get(4).await.unwrap();
    assert_eq!(task.id, 4);
  }

  #[tokio::test]
  async fn test_get_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/tasks/99"))
      .respond_with(ResponseTemplate::new(404).set_body_string("{}"))
      .mount(&server)
      .await;

    let client = client_for(&server.uri(), PaginationDialect::Offset);
    let err = client.get(99).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(
      err,
      ApiError::Http {
        status: 404,
        body: "{}".to_string()
      }
    );
  }

  #[tokio::test]
  async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/tasks/1"))
      .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
      .mount(&server)
      .await;

    let client = client_for(&server.uri(), PaginationDialect::Offset);
    let err = client.get(1).await.unwrap_err();
    assert!(matches!(err, ApiError::Decode { .. }));
  }

  #[tokio::test]
  async fn test_unreachable_backend_is_network_error() {
    // Nothing listens on the discard port
    let client = client_for("http://127.0.0.1:9", PaginationDialect::Offset);
    let err = client.list(0, 20).await.unwrap_err();
    assert!(matches!(err, ApiError::Network { .. }));
  }

  #[tokio::test]
  async fn test_create_fills_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/tasks"))
      .and(body_partial_json(serde_json::json!({
        "title": "New",
        "completed": false,
        "priority": "medium",
        "userId": 1
      })))
      .respond_with(
        ResponseTemplate::new(201)
          .set_body_json(serde_json::to_value(crate::tasks::types::fixtures::task(51)).unwrap()),
      )
      .expect(1)
      .mount(&server)
      .await;

    let client = client_for(&server.uri(), PaginationDialect::Offset);
    let created = client
      .create(TaskFormData {
        title: "New".to_string(),
        ..TaskFormData::default()
      })
      .await
      .unwrap();
    assert_eq!(created.id, 51);
  }

  #[tokio::test]
  async fn test_update_sends_partial_body() {
    let server = MockServer::start().await;
    let mut updated = crate::tasks::types::fixtures::task(7);
    updated.priority = Some(Priority::High);

    Mock::given(method("PATCH"))
      .and(path("/tasks/7"))
      .and(body_json(serde_json::json!({ "priority": "high" })))
      .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::to_value(&updated).unwrap()))
      .expect(1)
      .mount(&server)
      .await;

    let client = client_for(&server.uri(), PaginationDialect::Offset);
    let patch = TaskPatch {
      priority: Some(Priority::High),
      ..TaskPatch::default()
    };
    let task = client.update(7, &patch).await.unwrap();
    assert_eq!(task, updated);
  }

  #[tokio::test]
  async fn test_remove_surfaces_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
      .and(path("/tasks/3"))
      .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
      .mount(&server)
      .await;

    let client = client_for(&server.uri(), PaginationDialect::Offset);
    let err = client.remove(3).await.unwrap_err();
    assert_eq!(
      err,
      ApiError::Http {
        status: 500,
        body: "boom".to_string()
      }
    );
  }

  #[tokio::test]
  async fn test_unreadable_error_body_keeps_status() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
      .and(path("/tasks/3"))
      .respond_with(
        ResponseTemplate::new(502)
          .insert_header("Content-Encoding", "gzip")
          .set_body_string("not gzip at all"),
      )
      .mount(&server)
      .await;

    let client = client_for(&server.uri(), PaginationDialect::Offset);
    let err = client.remove(3).await.unwrap_err();
    assert_eq!(
      err,
      ApiError::Http {
        status: 502,
        body: String::new()
      }
    );
  }
}
