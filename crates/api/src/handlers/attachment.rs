//! Handlers for evidence attachments on findings and actions.

use aqms_core::attachment::{ensure_transition, sanitize_file_name, validate_upload, ParentType};
use aqms_core::error::CoreError;
use aqms_core::roles::{has_any_role, AUDITEE_ROLES, LEAD_ROLES};
use aqms_core::status::AttachmentStatus;
use aqms_core::types::DbId;
use aqms_db::models::attachment::{
    Attachment, AttachmentListParams, NewAttachment, UpdateAttachmentStatus,
};
use aqms_db::repositories::{ActionRepo, AttachmentRepo, FindingRepo};
use aqms_db::DbPool;
use aqms_events::event_types::{entity, ATTACHMENT_STATUS_CHANGED, ATTACHMENT_UPLOADED};
use aqms_events::DomainEvent;
use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use sqlx::PgConnection;
use tokio_util::io::ReaderStream;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::storage::{content_type_for, StorageError};

/// A file part read from the upload form.
struct UploadedFile {
    name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

fn bad_request(e: impl std::fmt::Display) -> AppError {
    AppError::BadRequest(e.to_string())
}

fn storage_error(e: StorageError) -> AppError {
    AppError::InternalError(format!("Evidence storage error: {e}"))
}

async fn ensure_parent_exists(pool: &DbPool, parent_type: ParentType, parent_id: DbId) -> AppResult<()> {
    let exists = match parent_type {
        ParentType::Finding => FindingRepo::find_by_id(pool, parent_id).await?.is_some(),
        ParentType::Action => ActionRepo::find_by_id(pool, parent_id).await?.is_some(),
    };
    if exists {
        Ok(())
    } else {
        Err(AppError::not_found(parent_type.as_str(), parent_id))
    }
}

async fn lock_attachment(conn: &mut PgConnection, id: DbId) -> AppResult<Attachment> {
    AttachmentRepo::lock(conn, id)
        .await?
        .ok_or_else(|| AppError::not_found("Attachment", id))
}

fn status_event(attachment: &Attachment, from: AttachmentStatus, to: AttachmentStatus, actor: DbId) -> DomainEvent {
    DomainEvent::new(ATTACHMENT_STATUS_CHANGED)
        .with_entity(entity::ATTACHMENT, attachment.id)
        .with_actor(actor)
        .with_payload(json!({
            "parent_type": attachment.parent_type,
            "parent_id": attachment.parent_id,
            "from": from,
            "to": to,
        }))
}

/// POST /api/v1/attachments
///
/// Multipart form with `parent_type`, `parent_id` and one `file` part. The
/// file is read in chunks and refused as soon as it exceeds the configured
/// limit.
pub async fn upload(
    user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let max_bytes = state.config.max_upload_bytes;
    let mut parent_type: Option<String> = None;
    let mut parent_id: Option<String> = None;
    let mut file: Option<UploadedFile> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(bad_request)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "parent_type" => parent_type = Some(field.text().await.map_err(bad_request)?),
            "parent_id" => parent_id = Some(field.text().await.map_err(bad_request)?),
            "file" => {
                let name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let mut bytes = Vec::new();
                while let Some(chunk) = field.chunk().await.map_err(bad_request)? {
                    bytes.extend_from_slice(&chunk);
                    if bytes.len() as u64 > max_bytes {
                        return Err(AppError::Core(CoreError::Validation(format!(
                            "File exceeds the upload limit of {max_bytes} bytes"
                        ))));
                    }
                }
                file = Some(UploadedFile {
                    name,
                    content_type,
                    bytes,
                });
            }
            _ => {}
        }
    }

    let parent_type: ParentType = parent_type
        .ok_or_else(|| AppError::BadRequest("Missing 'parent_type' field".into()))?
        .parse()?;
    let parent_id: DbId = parent_id
        .ok_or_else(|| AppError::BadRequest("Missing 'parent_id' field".into()))?
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest("'parent_id' must be an integer".into()))?;
    let file = file.ok_or_else(|| AppError::BadRequest("Missing 'file' field".into()))?;

    let ext = validate_upload(&file.name, file.bytes.len() as u64, max_bytes)?;
    ensure_parent_exists(&state.pool, parent_type, parent_id).await?;

    let file_name = sanitize_file_name(&file.name);
    let content_type = file
        .content_type
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream")
        .unwrap_or_else(|| content_type_for(&ext).to_string());

    let file_path = state
        .storage
        .save(parent_type, parent_id, &file_name, &file.bytes)
        .await
        .map_err(storage_error)?;

    let created = AttachmentRepo::create(
        &state.pool,
        &NewAttachment {
            parent_type: parent_type.as_str().to_string(),
            parent_id,
            file_name,
            file_path: file_path.clone(),
            file_size: file.bytes.len() as i64,
            content_type,
            uploaded_by: user.user_id,
        },
    )
    .await;
    let attachment = match created {
        Ok(attachment) => attachment,
        Err(e) => {
            if let Err(cleanup) = state.storage.remove(&file_path).await {
                tracing::warn!(error = %cleanup, file_path = %file_path, "Failed to remove orphaned evidence file");
            }
            return Err(e.into());
        }
    };

    state.event_bus.publish(
        DomainEvent::new(ATTACHMENT_UPLOADED)
            .with_entity(entity::ATTACHMENT, attachment.id)
            .with_actor(user.user_id)
            .with_payload(json!({
                "parent_type": attachment.parent_type,
                "parent_id": attachment.parent_id,
                "file_name": attachment.file_name,
            })),
    );
    tracing::info!(
        user_id = user.user_id,
        attachment_id = attachment.id,
        parent_type = %parent_type,
        parent_id,
        file_size = attachment.file_size,
        "Evidence uploaded"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: attachment })))
}

/// GET /api/v1/attachments?parent_type=&parent_id=&include_inactive=
pub async fn list(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Query(params): Query<AttachmentListParams>,
) -> AppResult<Json<DataResponse<Vec<Attachment>>>> {
    let parent_type: ParentType = params.parent_type.parse()?;
    let attachments = AttachmentRepo::list_by_parent(
        &state.pool,
        parent_type,
        params.parent_id,
        params.include_inactive,
    )
    .await?;
    Ok(Json(DataResponse { data: attachments }))
}

/// GET /api/v1/attachments/{id}
pub async fn get(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Attachment>>> {
    let attachment = AttachmentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Attachment", id))?;
    Ok(Json(DataResponse { data: attachment }))
}

/// GET /api/v1/attachments/{id}/download
///
/// Streams the stored file.
pub async fn download(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    let attachment = AttachmentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Attachment", id))?;
    let file = match state.storage.open(&attachment.file_path).await {
        Ok(file) => file,
        Err(StorageError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(attachment_id = id, file_path = %attachment.file_path, "Evidence file missing on disk");
            return Err(AppError::not_found("AttachmentFile", id));
        }
        Err(e) => return Err(storage_error(e)),
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &attachment.content_type)
        .header(header::CONTENT_LENGTH, attachment.file_size.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", attachment.file_name),
        )
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| AppError::InternalError(format!("Failed to build download response: {e}")))
}

/// PUT /api/v1/attachments/{id}/status
///
/// Reviewers approve, reject or reopen evidence.
pub async fn update_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateAttachmentStatus>,
) -> AppResult<Json<DataResponse<Attachment>>> {
    if !has_any_role(&user.role, AUDITEE_ROLES) && !has_any_role(&user.role, LEAD_ROLES) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Auditee Owner or Lead Auditor role required".into(),
        )));
    }
    let target: AttachmentStatus = input.status.parse()?;

    let mut tx = state.pool.begin().await?;
    let attachment = lock_attachment(&mut tx, id).await?;
    let current = attachment.status()?;
    ensure_transition(current, target)?;
    let attachment = AttachmentRepo::set_status(&mut *tx, id, target).await?;
    tx.commit().await?;

    state
        .event_bus
        .publish(status_event(&attachment, current, target, user.user_id));
    tracing::info!(user_id = user.user_id, attachment_id = id, status = %target, "Attachment status changed");

    Ok(Json(DataResponse { data: attachment }))
}

/// DELETE /api/v1/attachments/{id}
///
/// Soft delete: the attachment becomes `Inactive` and the file is kept.
/// Allowed for the uploader and admins.
pub async fn deactivate(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let mut tx = state.pool.begin().await?;
    let attachment = lock_attachment(&mut tx, id).await?;
    if attachment.uploaded_by != user.user_id && !user.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the uploader or an admin may remove evidence".into(),
        )));
    }
    let current = attachment.status()?;
    ensure_transition(current, AttachmentStatus::Inactive)?;
    let attachment = AttachmentRepo::set_status(&mut *tx, id, AttachmentStatus::Inactive).await?;
    tx.commit().await?;

    state.event_bus.publish(status_event(
        &attachment,
        current,
        AttachmentStatus::Inactive,
        user.user_id,
    ));
    tracing::info!(user_id = user.user_id, attachment_id = id, "Attachment deactivated");

    Ok(StatusCode::NO_CONTENT)
}
