use actix_web::{web, HttpResponse};

use crate::errors::AppError;
use crate::models::annotation::{self, AnnotationPair};
use crate::models::slide;
use crate::pipeline::render::content_type_for;
use crate::AppState;

/// GET /slides/{id}/image
/// Raw slide image; the content type is sniffed from the byte signature.
pub async fn image(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let slide_id = path.into_inner();
    let conn = state.pool.get()?;

    let bytes = slide::get_image(&conn, &slide_id)?.ok_or(AppError::NotFound)?;
    let content_type = content_type_for(&bytes);
    Ok(HttpResponse::Ok().content_type(content_type).body(bytes))
}

/// POST /slides/{id}/annotations
/// Replaces the slide's annotation set with the posted pairs.
pub async fn save_annotations(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<Vec<AnnotationPair>>,
) -> Result<HttpResponse, AppError> {
    let slide_id = path.into_inner();
    let mut conn = state.pool.get()?;

    annotation::replace_for_slide(&mut conn, &slide_id, &body)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })))
}
