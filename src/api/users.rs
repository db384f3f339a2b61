use actix_web::{web, HttpResponse, Responder};
use mongodb::bson::{doc, Document};

use crate::{database::MongoDB, middleware::auth::DecodedUser, utils::error::AppError};

fn has_admin_role(user: &Document) -> bool {
    user.get_str("role").map(|role| role == "admin").unwrap_or(false)
}

/// POST /users - Stores a user document verbatim
#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "User stored, insert acknowledgment returned"),
        (status = 500, description = "Database failure")
    )
)]
pub async fn create_user(db: web::Data<MongoDB>, body: web::Json<Document>) -> impl Responder {
    let user = body.into_inner();

    log::info!("📝 POST /users - Creating user");

    match db.collection::<Document>("users").insert_one(user).await {
        Ok(result) => HttpResponse::Ok().json(serde_json::json!({
            "acknowledged": true,
            "insertedId": result.inserted_id.as_object_id().map(|id| id.to_hex()),
        })),
        Err(e) => {
            log::error!("❌ Error creating user: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e)
            }))
        }
    }
}

/// GET /users/{email} - Answers whether the stored user is an admin
#[utoipa::path(
    get,
    path = "/users/{email}",
    tag = "Users",
    responses(
        (status = 200, description = "Admin flag for the email", body = AdminFlagResponse),
        (status = 500, description = "Database failure")
    )
)]
pub async fn get_admin_flag(db: web::Data<MongoDB>, path: web::Path<String>) -> impl Responder {
    let email = path.into_inner();

    log::info!("🔍 GET /users/{} - Checking admin flag", email);

    match db
        .collection::<Document>("users")
        .find_one(doc! { "email": &email })
        .await
    {
        Ok(user) => {
            let admin = user.as_ref().map(has_admin_role).unwrap_or(false);
            HttpResponse::Ok().json(AdminFlagResponse { admin })
        }
        Err(e) => {
            log::error!("❌ Error looking up user {}: {}", email, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e)
            }))
        }
    }
}

#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct AdminFlagResponse {
    pub admin: bool,
}

/// PUT /users - Creates or merge-updates the user matching the body's email.
/// `$set` semantics: fields absent from the body stay untouched on an
/// existing document.
#[utoipa::path(
    put,
    path = "/users",
    tag = "Users",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Upsert acknowledgment"),
        (status = 400, description = "Body has no email field"),
        (status = 500, description = "Database failure")
    )
)]
pub async fn upsert_user(
    db: web::Data<MongoDB>,
    body: web::Json<Document>,
) -> Result<HttpResponse, AppError> {
    let user = body.into_inner();

    let email = user
        .get_str("email")
        .map(str::to_owned)
        .map_err(|_| AppError::InvalidRequest("Request body has no email field".to_string()))?;

    log::info!("🔧 PUT /users - Upserting {}", email);

    let result = db
        .collection::<Document>("users")
        .update_one(doc! { "email": &email }, doc! { "$set": user })
        .upsert(true)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "acknowledged": true,
        "matchedCount": result.matched_count,
        "modifiedCount": result.modified_count,
        "upsertedId": result.upserted_id.and_then(|id| id.as_object_id().map(|id| id.to_hex())),
    })))
}

/// PUT /users/admin - Promotes the target email to admin. Runs behind the
/// fail-open gate, so authorization happens here: no recorded identity or a
/// non-admin requester are both explicit 403s.
#[utoipa::path(
    put,
    path = "/users/admin",
    tag = "Users",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Update acknowledgment"),
        (status = 400, description = "Body has no email field"),
        (status = 403, description = "Requester is not a verified admin"),
        (status = 500, description = "Database failure")
    )
)]
pub async fn make_admin(
    db: web::Data<MongoDB>,
    requester: Option<web::ReqData<DecodedUser>>,
    body: web::Json<Document>,
) -> Result<HttpResponse, AppError> {
    let requester_email = requester
        .map(|user| user.email.clone())
        .ok_or_else(|| {
            AppError::Forbidden("You do not have permission to make admin".to_string())
        })?;

    let users = db.collection::<Document>("users");

    let requester_account = users
        .find_one(doc! { "email": &requester_email })
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

    let requester_is_admin = requester_account.as_ref().map(has_admin_role).unwrap_or(false);

    if !requester_is_admin {
        log::warn!("⚠️ {} attempted admin promotion without admin role", requester_email);
        return Err(AppError::Forbidden(
            "You do not have permission to make admin".to_string(),
        ));
    }

    let target_email = body
        .get_str("email")
        .map(str::to_owned)
        .map_err(|_| AppError::InvalidRequest("Request body has no email field".to_string()))?;

    log::info!("👑 PUT /users/admin - {} promotes {}", requester_email, target_email);

    let result = users
        .update_one(
            doc! { "email": &target_email },
            doc! { "$set": { "role": "admin" } },
        )
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "acknowledged": true,
        "matchedCount": result.matched_count,
        "modifiedCount": result.modified_count,
        "upsertedId": null,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn an_admin_role_sets_the_flag() {
        let user = doc! { "email": "boss@fovia.com", "role": "admin" };
        assert!(has_admin_role(&user));
    }

    #[test]
    fn a_non_admin_role_does_not() {
        let user = doc! { "email": "patient@fovia.com", "role": "patient" };
        assert!(!has_admin_role(&user));
    }

    #[test]
    fn a_missing_role_field_does_not() {
        let user = doc! { "email": "patient@fovia.com" };
        assert!(!has_admin_role(&user));
    }

    #[test]
    fn a_non_string_role_does_not() {
        let user = doc! { "email": "patient@fovia.com", "role": 1 };
        assert!(!has_admin_role(&user));
    }
}
