/// Task endpoints
///
/// All endpoints run behind the auth gate and operate only on the caller's
/// own tasks: the owner id comes from the authenticated request context,
/// never from the request body or path. A task owned by someone else is a
/// 404, indistinguishable from a task that does not exist.
///
/// # Endpoints
///
/// - `POST   /tasks` - Create a task
/// - `GET    /tasks` - List the caller's tasks
/// - `GET    /tasks/prioritize` - AI-prioritized view (external service)
/// - `GET    /tasks/:id` - Fetch one task
/// - `PUT    /tasks/:id` - Partial update
/// - `DELETE /tasks/:id` - Delete
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::CurrentUser,
};
use taskzen_shared::models::task::{CreateTask, Task, TaskPriority, TaskStatus, UpdateTask};

/// Create task request
///
/// Fields arrive loosely typed and are validated into the strict task shape
/// here at the boundary; nothing partial travels further in.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    /// Task title
    pub title: Option<String>,

    /// Description, empty when omitted
    pub description: Option<String>,

    /// Priority: LOW, MEDIUM, or HIGH (case-insensitive)
    pub priority: Option<String>,

    /// Status: TODO, IN_PROGRESS, or COMPLETED (case-insensitive)
    pub status: Option<String>,

    /// Deadline as an ISO-8601 timestamp, or null
    pub deadline: Option<String>,
}

/// Update task request
///
/// Absent fields are left untouched. `deadline` distinguishes "not sent"
/// from an explicit null, which clears it.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    /// New title
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New priority
    pub priority: Option<String>,

    /// New status
    pub status: Option<String>,

    /// New deadline; explicit null clears it
    #[serde(default, deserialize_with = "double_option")]
    pub deadline: Option<Option<String>>,
}

/// Maps absent → None, null → Some(None), value → Some(Some(value))
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Response for `DELETE /tasks/:id`
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Confirmation message
    pub message: String,
}

fn parse_priority(value: &str) -> ApiResult<TaskPriority> {
    value
        .parse::<TaskPriority>()
        .map_err(|msg| ApiError::validation("priority", msg))
}

fn parse_status(value: &str) -> ApiResult<TaskStatus> {
    value
        .parse::<TaskStatus>()
        .map_err(|msg| ApiError::validation("status", msg))
}

fn parse_deadline(value: &str) -> ApiResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            ApiError::validation(
                "deadline",
                "Deadline must be an ISO-8601 timestamp (e.g. 2025-06-01T12:00:00Z)",
            )
        })
}

/// Create a new task
///
/// # Endpoint
///
/// ```text
/// POST /tasks
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// { "title": "Write spec", "priority": "HIGH", "status": "TODO" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing title/priority/status, or a malformed enum
///   or deadline value
/// - `401 Unauthorized`: missing or invalid token
pub async fn create_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let title = req
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::validation("title", "Title is required"))?;
    let priority = parse_priority(
        req.priority
            .as_deref()
            .ok_or_else(|| ApiError::validation("priority", "Priority is required"))?,
    )?;
    let status = parse_status(
        req.status
            .as_deref()
            .ok_or_else(|| ApiError::validation("status", "Status is required"))?,
    )?;
    let deadline = match req.deadline.as_deref() {
        Some(raw) => Some(parse_deadline(raw)?),
        None => None,
    };

    let task = Task::create(
        &state.db,
        current.id(),
        CreateTask {
            title,
            description: req.description.unwrap_or_default(),
            priority,
            status,
            deadline,
        },
    )
    .await?;

    tracing::debug!(task_id = %task.id, owner_id = %task.owner_id, "Task created");

    Ok((StatusCode::CREATED, Json(task)))
}

/// List all tasks belonging to the caller
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = Task::list_by_owner(&state.db, current.id()).await?;
    Ok(Json(tasks))
}

/// Fetch a single task
///
/// # Errors
///
/// - `404 Not Found`: unknown id or someone else's task (indistinguishable)
pub async fn get_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = Task::find_by_id_and_owner(&state.db, id, current.id())
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Partially update a task
///
/// Only supplied fields change; the id and owner are never mutable.
///
/// # Errors
///
/// - `400 Bad Request`: empty update or malformed field value
/// - `404 Not Found`: unknown id or someone else's task
pub async fn update_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    if let Some(title) = &req.title {
        if title.trim().is_empty() {
            return Err(ApiError::validation("title", "Title must not be empty"));
        }
    }

    let update = UpdateTask {
        title: req.title,
        description: req.description,
        priority: req.priority.as_deref().map(parse_priority).transpose()?,
        status: req.status.as_deref().map(parse_status).transpose()?,
        deadline: match req.deadline {
            None => None,
            Some(None) => Some(None),
            Some(Some(raw)) => Some(Some(parse_deadline(&raw)?)),
        },
    };

    if update.is_empty() {
        return Err(ApiError::BadRequest(
            "At least one field must be provided".to_string(),
        ));
    }

    let task = Task::update(&state.db, id, current.id(), update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Delete a task
///
/// # Errors
///
/// - `404 Not Found`: unknown id or someone else's task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    let deleted = Task::delete(&state.db, id, current.id()).await?;

    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok(Json(DeleteResponse {
        message: "Task deleted successfully".to_string(),
    }))
}

/// AI-prioritized view of the caller's tasks
///
/// Proxies the external prioritization service and passes its JSON response
/// through untouched. The ranking algorithm is an opaque external concern.
///
/// # Errors
///
/// - `502 Bad Gateway`: the service failed or answered garbage
/// - `503 Service Unavailable`: no service configured
pub async fn prioritize_tasks(
    State(state): State<AppState>,
    Extension(_current): Extension<CurrentUser>,
) -> ApiResult<Json<serde_json::Value>> {
    let base_url = state.config.ai.service_url.as_deref().ok_or_else(|| {
        ApiError::ServiceUnavailable("AI prioritization is not configured".to_string())
    })?;

    let response = reqwest::Client::new()
        .get(format!("{}/api/tasks/prioritize", base_url))
        .send()
        .await
        .map_err(|e| ApiError::UpstreamFailure(format!("Prioritization request failed: {}", e)))?
        .error_for_status()
        .map_err(|e| ApiError::UpstreamFailure(format!("Prioritization service rejected: {}", e)))?;

    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| ApiError::UpstreamFailure(format!("Prioritization response malformed: {}", e)))?;

    Ok(Json(body))
}
