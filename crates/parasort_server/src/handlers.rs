//! HTTP request handlers and wire DTOs.
//!
//! Handlers translate JSON bodies into core requests and run them through
//! [`AppState::with_service`]; they never touch SQL directly.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use parasort_core::{
    core_version, BucketOverride, CaptureRequest, ClassificationResult, CreateNoteRequest, Note,
    NoteId, NotePatch, ParaBucket,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ClassifyBody {
    pub content: String,
    pub title: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CaptureBody {
    pub content: String,
    pub title: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub captured_from: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CaptureResponse {
    pub note: Note,
    pub classification: ClassificationResult,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub bucket: Option<String>,
    pub tag: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct NotesListResponse {
    pub items: Vec<Note>,
    pub applied_limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteBody {
    pub title: String,
    pub content: String,
    pub para_bucket: String,
    pub area_name: Option<String>,
    pub project_outcome: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub captured_from: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNoteBody {
    pub title: Option<String>,
    pub content: Option<String>,
    pub para_bucket: Option<String>,
    pub tags: Option<Vec<String>>,
    pub captured_from: Option<String>,
}

/// Override body. A missing `area_name`/`project_outcome` keeps the stored
/// value; an explicit `null` clears it.
#[derive(Debug, Deserialize)]
pub struct OverrideBody {
    pub para_bucket: String,
    #[serde(default, deserialize_with = "present")]
    pub area_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub project_outcome: Option<Option<String>>,
}

// Distinguishes an explicit `null` from an absent field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: core_version(),
    })
}

/// POST /classify
///
/// Classifies without persisting.
pub async fn classify(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ClassifyBody>, JsonRejection>,
) -> ApiResult<Json<ClassificationResult>> {
    let Json(body) = body?;
    let title = body.title.as_deref();
    let result = state
        .classifier()
        .classify(&body.content, title, Some(body.tags.as_slice()));
    Ok(Json(result))
}

/// POST /capture
pub async fn capture(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CaptureBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CaptureResponse>)> {
    let Json(body) = body?;
    let request = CaptureRequest {
        title: body.title,
        content: body.content,
        tags: body.tags,
        captured_from: body.captured_from,
    };
    let outcome = state.with_service(move |service| service.capture(request)).await?;
    Ok((
        StatusCode::CREATED,
        Json(CaptureResponse {
            note: outcome.note,
            classification: outcome.classification,
        }),
    ))
}

/// GET /notes
pub async fn list_notes(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<NotesListResponse>> {
    let Query(params) = params?;
    let bucket = parse_optional_bucket(params.bucket.as_deref())?;
    let listed = state
        .with_service(move |service| {
            service.list_notes(bucket, params.tag, params.limit, params.offset.unwrap_or(0))
        })
        .await?;
    Ok(Json(NotesListResponse {
        items: listed.items,
        applied_limit: listed.applied_limit,
    }))
}

/// POST /notes
pub async fn create_note(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateNoteBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Note>)> {
    let Json(body) = body?;
    let request = CreateNoteRequest {
        title: body.title,
        content: body.content,
        para_bucket: body.para_bucket.parse()?,
        area_name: body.area_name,
        project_outcome: body.project_outcome,
        tags: body.tags,
        captured_from: body.captured_from,
    };
    let note = state.with_service(move |service| service.create_note(request)).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// GET /notes/{id}
pub async fn get_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<NoteId>,
) -> ApiResult<Json<Note>> {
    let note = state.with_service(move |service| service.get_note(id)).await?;
    Ok(Json(note))
}

/// PATCH /notes/{id}
pub async fn update_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<NoteId>,
    body: Result<Json<UpdateNoteBody>, JsonRejection>,
) -> ApiResult<Json<Note>> {
    let Json(body) = body?;
    let patch = NotePatch {
        title: body.title,
        content: body.content,
        para_bucket: parse_optional_bucket(body.para_bucket.as_deref())?,
        tags: body.tags,
        captured_from: body.captured_from,
    };
    if patch.is_empty() {
        return Err(ApiError::InvalidInput(
            "patch must change at least one field".to_string(),
        ));
    }
    let note = state.with_service(move |service| service.update_note(id, patch)).await?;
    Ok(Json(note))
}

/// DELETE /notes/{id}
pub async fn delete_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<NoteId>,
) -> ApiResult<StatusCode> {
    state.with_service(move |service| service.delete_note(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /notes/{id}/override
pub async fn override_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<NoteId>,
    body: Result<Json<OverrideBody>, JsonRejection>,
) -> ApiResult<Json<Note>> {
    let Json(body) = body?;
    let change = BucketOverride {
        para_bucket: body.para_bucket.parse()?,
        area_name: body.area_name,
        project_outcome: body.project_outcome,
    };
    let note = state
        .with_service(move |service| service.override_classification(id, change))
        .await?;
    Ok(Json(note))
}

/// GET /tags
pub async fn list_tags(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<String>>> {
    let tags = state.with_service(move |service| service.list_tags()).await?;
    Ok(Json(tags))
}

fn parse_optional_bucket(value: Option<&str>) -> ApiResult<Option<ParaBucket>> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => Ok(Some(value.parse()?)),
        None => Ok(None),
    }
}
