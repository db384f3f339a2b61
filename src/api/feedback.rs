use actix_multipart::form::{bytes::Bytes, text::Text, MultipartForm};
use actix_web::{web, HttpResponse, Responder};
use futures::stream::StreamExt;
use mongodb::bson::{doc, oid::ObjectId, spec::BinarySubtype, Binary};
use serde::Deserialize;

use crate::{
    database::MongoDB,
    models::{Feedback, FEEDBACK_STATUS_PENDING, FEEDBACK_STATUS_VISIBLE},
    utils::error::AppError,
};

/// The landing page shows at most six feedback cards.
const FEEDBACK_LIST_LIMIT: i64 = 6;

#[derive(Debug, MultipartForm)]
pub struct FeedbackForm {
    pub name: Text<String>,
    pub title: Text<String>,
    pub feedback: Text<String>,
    pub image: Bytes,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

/// "pending" is the only parameter value that parks an entry; every other
/// value, including none at all, makes it visible again.
fn persisted_status(status: Option<&str>) -> &'static str {
    match status {
        Some("pending") => FEEDBACK_STATUS_PENDING,
        _ => FEEDBACK_STATUS_VISIBLE,
    }
}

/// POST /feedback - Stores a feedback entry from a multipart submission
#[utoipa::path(
    post,
    path = "/feedback",
    tag = "Feedback",
    responses(
        (status = 200, description = "Feedback stored, insert acknowledgment returned"),
        (status = 400, description = "Missing form field or file"),
        (status = 500, description = "Database failure")
    )
)]
pub async fn create_feedback(
    db: web::Data<MongoDB>,
    MultipartForm(form): MultipartForm<FeedbackForm>,
) -> Result<HttpResponse, AppError> {
    log::info!("📝 POST /feedback - Entry from {}", form.name.0);

    let entry = Feedback {
        id: None,
        name: form.name.0,
        title: form.title.0,
        feedback: form.feedback.0,
        image: Binary {
            subtype: BinarySubtype::Generic,
            bytes: form.image.data.to_vec(),
        },
        status: FEEDBACK_STATUS_VISIBLE.to_string(),
    };

    let result = db
        .collection::<Feedback>("feedback")
        .insert_one(entry)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "acknowledged": true,
        "insertedId": result.inserted_id.as_object_id().map(|id| id.to_hex()),
    })))
}

/// GET /feedback - Lists at most six entries, store order, all statuses
#[utoipa::path(
    get,
    path = "/feedback",
    tag = "Feedback",
    responses(
        (status = 200, description = "Up to six feedback documents"),
        (status = 500, description = "Database failure")
    )
)]
pub async fn list_feedback(db: web::Data<MongoDB>) -> impl Responder {
    log::info!("📋 GET /feedback - Listing entries");

    match db
        .collection::<Feedback>("feedback")
        .find(doc! {})
        .limit(FEEDBACK_LIST_LIMIT)
        .await
    {
        Ok(mut cursor) => {
            let mut entries = Vec::new();

            while let Some(result) = cursor.next().await {
                match result {
                    Ok(entry) => entries.push(entry),
                    Err(e) => {
                        log::error!("❌ Error reading feedback document: {}", e);
                    }
                }
            }

            HttpResponse::Ok().json(entries)
        }
        Err(e) => {
            log::error!("❌ Error listing feedback: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e)
            }))
        }
    }
}

/// POST /feedback/{id} - Toggles an entry between visible and pending
#[utoipa::path(
    post,
    path = "/feedback/{id}",
    tag = "Feedback",
    responses(
        (status = 200, description = "Update acknowledgment"),
        (status = 400, description = "Malformed id"),
        (status = 500, description = "Database failure")
    )
)]
pub async fn update_feedback_status(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    query: web::Query<StatusQuery>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let object_id = ObjectId::parse_str(&id)
        .map_err(|_| AppError::InvalidRequest(format!("Invalid feedback id: {}", id)))?;

    let status = persisted_status(query.status.as_deref());

    log::info!("🔧 POST /feedback/{} - status -> {}", id, status);

    let result = db
        .collection::<Feedback>("feedback")
        .update_one(
            doc! { "_id": object_id },
            doc! { "$set": { "status": status } },
        )
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "acknowledged": true,
        "matchedCount": result.matched_count,
        "modifiedCount": result.modified_count,
        "upsertedId": result.upserted_id.and_then(|id| id.as_object_id().map(|id| id.to_hex())),
    })))
}

/// DELETE /feedback/{id} - Deletes one entry; zero-count ack when absent
#[utoipa::path(
    delete,
    path = "/feedback/{id}",
    tag = "Feedback",
    responses(
        (status = 200, description = "Deletion acknowledgment"),
        (status = 400, description = "Malformed id"),
        (status = 500, description = "Database failure")
    )
)]
pub async fn delete_feedback(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let object_id = ObjectId::parse_str(&id)
        .map_err(|_| AppError::InvalidRequest(format!("Invalid feedback id: {}", id)))?;

    log::info!("🗑️  DELETE /feedback/{}", id);

    let result = db
        .collection::<Feedback>("feedback")
        .delete_one(doc! { "_id": object_id })
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "acknowledged": true,
        "deletedCount": result.deleted_count,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_parks_the_entry() {
        assert_eq!(persisted_status(Some("pending")), "2");
    }

    #[test]
    fn any_other_value_makes_it_visible() {
        assert_eq!(persisted_status(Some("approved")), "1");
        assert_eq!(persisted_status(Some("")), "1");
        assert_eq!(persisted_status(None), "1");
    }

    #[test]
    fn the_toggle_is_idempotent() {
        let first = persisted_status(Some("pending"));
        let second = persisted_status(Some("pending"));
        assert_eq!(first, second);
    }
}
