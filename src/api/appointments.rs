use actix_web::{web, HttpResponse, Responder};
use futures::stream::StreamExt;
use mongodb::bson::{doc, Document};
use serde::Deserialize;

use crate::database::MongoDB;

#[derive(Debug, Deserialize)]
pub struct AppointmentQuery {
    pub email: Option<String>,
    pub date: Option<String>,
}

/// Absent parameters become BSON null, which matches documents where the
/// field is missing or null. Equality match only; no wildcard semantics.
fn appointment_filter(query: &AppointmentQuery) -> Document {
    doc! {
        "email": query.email.clone(),
        "date": query.date.clone(),
    }
}

/// POST /appointments - Books an appointment (body stored verbatim)
#[utoipa::path(
    post,
    path = "/appointments",
    tag = "Appointments",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Appointment stored, insert acknowledgment returned"),
        (status = 500, description = "Database failure")
    )
)]
pub async fn create_appointment(
    db: web::Data<MongoDB>,
    body: web::Json<Document>,
) -> impl Responder {
    let appointment = body.into_inner();

    log::info!("📝 POST /appointments - Booking appointment");

    match db
        .collection::<Document>("appointments")
        .insert_one(appointment)
        .await
    {
        Ok(result) => HttpResponse::Ok().json(serde_json::json!({
            "acknowledged": true,
            "insertedId": result.inserted_id.as_object_id().map(|id| id.to_hex()),
        })),
        Err(e) => {
            log::error!("❌ Error booking appointment: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e)
            }))
        }
    }
}

/// GET /appointments - Lists appointments matching email + date exactly
#[utoipa::path(
    get,
    path = "/appointments",
    tag = "Appointments",
    responses(
        (status = 200, description = "Appointments matching the email/date filter"),
        (status = 500, description = "Database failure")
    )
)]
pub async fn list_appointments(
    db: web::Data<MongoDB>,
    query: web::Query<AppointmentQuery>,
) -> impl Responder {
    let filter = appointment_filter(&query);

    log::info!(
        "📋 GET /appointments - email={:?} date={:?}",
        query.email,
        query.date
    );

    match db.collection::<Document>("appointments").find(filter).await {
        Ok(mut cursor) => {
            let mut appointments = Vec::new();

            while let Some(result) = cursor.next().await {
                match result {
                    Ok(appointment) => appointments.push(appointment),
                    Err(e) => {
                        log::error!("❌ Error reading appointment document: {}", e);
                    }
                }
            }

            HttpResponse::Ok().json(appointments)
        }
        Err(e) => {
            log::error!("❌ Error listing appointments: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e)
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::Bson;

    #[test]
    fn absent_parameters_filter_on_null_not_wildcard() {
        let filter = appointment_filter(&AppointmentQuery {
            email: None,
            date: None,
        });

        assert_eq!(filter.get("email"), Some(&Bson::Null));
        assert_eq!(filter.get("date"), Some(&Bson::Null));
    }

    #[test]
    fn present_parameters_filter_on_exact_equality() {
        let filter = appointment_filter(&AppointmentQuery {
            email: Some("patient@example.com".to_string()),
            date: Some("2021-11-04".to_string()),
        });

        assert_eq!(
            filter.get_str("email").expect("email in filter"),
            "patient@example.com"
        );
        assert_eq!(filter.get_str("date").expect("date in filter"), "2021-11-04");
    }
}
