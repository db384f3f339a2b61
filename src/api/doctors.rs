use actix_multipart::form::{bytes::Bytes, text::Text, MultipartForm};
use actix_web::{web, HttpResponse, Responder};
use futures::stream::StreamExt;
use mongodb::bson::{doc, oid::ObjectId, spec::BinarySubtype, Binary};

use crate::{database::MongoDB, models::Doctor, utils::error::AppError};

/// Multipart payload for registering a doctor. The typed extractor rejects
/// submissions with a missing field before the handler runs.
#[derive(Debug, MultipartForm)]
pub struct DoctorForm {
    pub name: Text<String>,
    pub email: Text<String>,
    pub title: Text<String>,
    pub description: Text<String>,
    pub image: Bytes,
    pub signature: Bytes,
}

fn to_binary(data: web::Bytes) -> Binary {
    Binary {
        subtype: BinarySubtype::Generic,
        bytes: data.to_vec(),
    }
}

/// GET /doctors - Lists every doctor
#[utoipa::path(
    get,
    path = "/doctors",
    tag = "Doctors",
    responses(
        (status = 200, description = "All doctor documents"),
        (status = 500, description = "Database failure")
    )
)]
pub async fn list_doctors(db: web::Data<MongoDB>) -> impl Responder {
    log::info!("📋 GET /doctors - Listing doctors");

    match db.collection::<Doctor>("doctors").find(doc! {}).await {
        Ok(mut cursor) => {
            let mut doctors = Vec::new();

            while let Some(result) = cursor.next().await {
                match result {
                    Ok(doctor) => doctors.push(doctor),
                    Err(e) => {
                        log::error!("❌ Error reading doctor document: {}", e);
                    }
                }
            }

            HttpResponse::Ok().json(doctors)
        }
        Err(e) => {
            log::error!("❌ Error listing doctors: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e)
            }))
        }
    }
}

/// GET /doctors/{id} - Fetches one doctor; responds with JSON null on a miss
#[utoipa::path(
    get,
    path = "/doctors/{id}",
    tag = "Doctors",
    responses(
        (status = 200, description = "The doctor document, or null when absent"),
        (status = 400, description = "Malformed id"),
        (status = 500, description = "Database failure")
    )
)]
pub async fn get_doctor(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let object_id = ObjectId::parse_str(&id)
        .map_err(|_| AppError::InvalidRequest(format!("Invalid doctor id: {}", id)))?;

    log::info!("🔍 GET /doctors/{}", id);

    let doctor = db
        .collection::<Doctor>("doctors")
        .find_one(doc! { "_id": object_id })
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

    Ok(HttpResponse::Ok().json(doctor))
}

/// DELETE /doctors/{id} - Deletes one doctor; the acknowledgment reports a
/// zero count when nothing matched
#[utoipa::path(
    delete,
    path = "/doctors/{id}",
    tag = "Doctors",
    responses(
        (status = 200, description = "Deletion acknowledgment"),
        (status = 400, description = "Malformed id"),
        (status = 500, description = "Database failure")
    )
)]
pub async fn delete_doctor(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let object_id = ObjectId::parse_str(&id)
        .map_err(|_| AppError::InvalidRequest(format!("Invalid doctor id: {}", id)))?;

    log::info!("🗑️  DELETE /doctors/{}", id);

    let result = db
        .collection::<Doctor>("doctors")
        .delete_one(doc! { "_id": object_id })
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "acknowledged": true,
        "deletedCount": result.deleted_count,
    })))
}

/// POST /doctors - Registers a doctor from a multipart submission. Uploaded
/// bytes are stored as-is; retrieval returns them byte-identical.
#[utoipa::path(
    post,
    path = "/doctors",
    tag = "Doctors",
    responses(
        (status = 200, description = "Doctor stored, insert acknowledgment returned"),
        (status = 400, description = "Missing form field or file"),
        (status = 500, description = "Database failure")
    )
)]
pub async fn create_doctor(
    db: web::Data<MongoDB>,
    MultipartForm(form): MultipartForm<DoctorForm>,
) -> Result<HttpResponse, AppError> {
    log::info!("📝 POST /doctors - Registering {}", form.name.0);

    let doctor = Doctor {
        id: None,
        name: form.name.0,
        email: form.email.0,
        title: form.title.0,
        description: form.description.0,
        image: to_binary(form.image.data),
        signature_img: to_binary(form.signature.data),
    };

    let result = db
        .collection::<Doctor>("doctors")
        .insert_one(doctor)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "acknowledged": true,
        "insertedId": result.inserted_id.as_object_id().map(|id| id.to_hex()),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uploaded_bytes_are_stored_without_transformation() {
        let payload = vec![0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10];
        let binary = to_binary(web::Bytes::from(payload.clone()));

        assert_eq!(binary.subtype, BinarySubtype::Generic);
        assert_eq!(binary.bytes, payload);
    }
}
