use actix_multipart::form::tempfile::TempFile;
use actix_multipart::form::MultipartForm;
use actix_web::{web, HttpResponse};

use crate::errors::{render, AppError};
use crate::models::{annotation, presentation, slide};
use crate::pipeline;
use crate::pipeline::tool::SystemToolRunner;
use crate::templates_structs::{IndexTemplate, ReviewTemplate};
use crate::AppState;

#[derive(Debug, MultipartForm)]
pub struct UploadForm {
    #[multipart(rename = "file")]
    pub file: TempFile,
}

/// GET /
/// Upload form plus the list of processed presentations.
pub async fn index(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let conn = state.pool.get()?;
    let presentations = presentation::find_all(&conn)?;
    render(IndexTemplate {
        presentations,
        error: None,
    })
}

/// POST /presentations
/// Accepts a multipart upload and runs the processing pipeline. On failure
/// the index is re-rendered with a generic message plus the underlying
/// error text; the client may re-upload.
pub async fn upload(
    state: web::Data<AppState>,
    MultipartForm(form): MultipartForm<UploadForm>,
) -> Result<HttpResponse, AppError> {
    let original_filename = form
        .file
        .file_name
        .clone()
        .unwrap_or_else(|| "presentation.pptx".to_string());

    // Detach the temp file from its RAII guard; the pipeline owns its
    // removal from here on.
    let temp_path = form
        .file
        .file
        .into_temp_path()
        .keep()
        .map_err(|e| AppError::Io(e.error))?;

    let pool = state.pool.clone();
    let mirror = state.mirror.clone();
    let outcome = web::block(move || {
        let runner = SystemToolRunner::default();
        pipeline::process_presentation(&pool, &mirror, &original_filename, &temp_path, &runner)
    })
    .await
    // A cancelled blocking call gets the same re-render treatment as a
    // pipeline failure.
    .unwrap_or_else(|e| Err(AppError::Pipeline(e.to_string())));

    match outcome {
        Ok(presentation_id) => Ok(HttpResponse::SeeOther()
            .insert_header(("Location", format!("/presentations/{presentation_id}")))
            .finish()),
        Err(e) => {
            log::error!("upload processing failed: {e}");
            let conn = state.pool.get()?;
            let presentations = presentation::find_all(&conn)?;
            render(IndexTemplate {
                presentations,
                error: Some(format!("Failed to process presentation: {e}")),
            })
        }
    }
}

/// GET /presentations/{id}
/// Review page: slides in sequence order with the annotation editor.
pub async fn review(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let presentation_id = path.into_inner();
    let conn = state.pool.get()?;

    let presentation =
        presentation::find_by_id(&conn, &presentation_id)?.ok_or(AppError::NotFound)?;
    let slides = slide::find_for_presentation(&conn, &presentation_id)?;
    render(ReviewTemplate {
        presentation,
        slides,
    })
}

/// GET /presentations/{id}/annotations
/// JSON map of slide id to its ordered key/value pairs.
pub async fn annotations(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let presentation_id = path.into_inner();
    let conn = state.pool.get()?;

    if presentation::find_by_id(&conn, &presentation_id)?.is_none() {
        return Err(AppError::NotFound);
    }
    let map = annotation::map_for_presentation(&conn, &presentation_id)?;
    Ok(HttpResponse::Ok().json(map))
}

/// POST /presentations/{id}/submit
/// Flips the submitted flag and returns to the review page.
pub async fn submit(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let presentation_id = path.into_inner();
    let conn = state.pool.get()?;

    presentation::mark_submitted(&conn, &presentation_id)?;
    log::info!("presentation {presentation_id} submitted");
    Ok(HttpResponse::SeeOther()
        .insert_header(("Location", format!("/presentations/{presentation_id}")))
        .finish())
}
