use axum::async_trait;
use axum::extract::{FromRequest, Json, Path, Request, State};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};

use crate::assignments::{AssignmentId, AssignmentIdInput, AssignmentView};
use crate::error::{AppError, AppResult, AssignmentError};
use crate::state::AppState;

/// A request body that reports rejections with the operation's own failure message.
pub trait AssignmentRequest: DeserializeOwned {
    const FAILURE: &'static str;
}

#[derive(Deserialize)]
pub struct CreateAssignmentRequest {
    pub id: AssignmentIdInput,
    pub file: Value,
}

impl AssignmentRequest for CreateAssignmentRequest {
    const FAILURE: &'static str = "Error saving assignment";
}

#[derive(Deserialize)]
pub struct EditAssignmentRequest {
    #[serde(default)]
    pub id: Option<AssignmentIdInput>,
    pub file: Value,
}

impl AssignmentRequest for EditAssignmentRequest {
    const FAILURE: &'static str = "Error updating assignment";
}

/// JSON body extractor whose rejections use the `{ "message" }` error body.
pub struct AssignmentJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AssignmentJson<T>
where
    S: Send + Sync,
    T: AssignmentRequest,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            warn!(error = %rejection.body_text(), "rejected assignment request body");
            AppError::internal(T::FAILURE)
        })?;
        Ok(AssignmentJson(payload))
    }
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct DataResponse<T> {
    pub message: &'static str,
    pub data: T,
}

fn path_id(raw: &str, fallback: &str) -> AppResult<AssignmentId> {
    AssignmentId::parse(raw).map_err(|err| {
        error!(error = %err, "rejected assignment id");
        AppError::from_assignment(&err, fallback)
    })
}

fn body_id(input: AssignmentIdInput, fallback: &str) -> AppResult<AssignmentId> {
    AssignmentId::try_from(input).map_err(|err| {
        error!(error = %err, "rejected assignment id");
        AppError::from_assignment(&err, fallback)
    })
}

pub async fn list_assignments(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<AssignmentView>>>> {
    let views = state.assignments.list_assignments().await.map_err(|err| {
        let source = match err.cause() {
            AssignmentError::Repository(_) => "repository",
            AssignmentError::BucketUnavailable { .. } => "bucket",
            _ => "unknown",
        };
        error!(error = %err, source, "error fetching assignments");
        AppError::from_assignment(&err, "Error fetching assignments")
    })?;

    Ok(Json(DataResponse {
        message: "List of assignments fetched successfully",
        data: views,
    }))
}

pub async fn get_assignment(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Json<DataResponse<Value>>> {
    const FAILURE: &str = "Error fetching assignment";
    let id = path_id(&raw_id, FAILURE)?;

    let document = state
        .assignments
        .fetch_assignment(&id)
        .await
        .map_err(|err| {
            error!(error = %err, assignment_id = %id, "error fetching assignment");
            AppError::from_assignment(&err, FAILURE)
        })?;

    Ok(Json(DataResponse {
        message: "Assignment fetched successfully",
        data: document,
    }))
}

pub async fn create_assignment(
    State(state): State<AppState>,
    AssignmentJson(payload): AssignmentJson<CreateAssignmentRequest>,
) -> AppResult<Json<MessageResponse>> {
    const FAILURE: &str = CreateAssignmentRequest::FAILURE;
    let id = body_id(payload.id, FAILURE)?;

    state
        .assignments
        .create_assignment(&id, &payload.file)
        .await
        .map_err(|err| {
            error!(error = %err, assignment_id = %id, "error saving assignment");
            AppError::from_assignment(&err, FAILURE)
        })?;

    Ok(Json(MessageResponse {
        message: "Assignment saved",
    }))
}

/// The body `id`, when present, names the object to update; the path id is
/// used only when the body has none.
pub async fn edit_assignment(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    AssignmentJson(payload): AssignmentJson<EditAssignmentRequest>,
) -> AppResult<Json<MessageResponse>> {
    const FAILURE: &str = EditAssignmentRequest::FAILURE;
    let id = match payload.id {
        Some(input) => body_id(input, FAILURE)?,
        None => path_id(&raw_id, FAILURE)?,
    };

    state
        .assignments
        .update_assignment(&id, &payload.file)
        .await
        .map_err(|err| {
            if !matches!(err, AssignmentError::AssignmentNotFound { .. }) {
                error!(error = %err, assignment_id = %id, "error updating assignment");
            }
            AppError::from_assignment(&err, FAILURE)
        })?;

    Ok(Json(MessageResponse {
        message: "Assignment updated",
    }))
}
