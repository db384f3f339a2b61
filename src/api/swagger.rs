use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Fovia Service API",
        version = "1.0.0",
        description = "REST backend for the Fovia medical-appointment booking application.\n\n**Authentication:** A Firebase ID token may be supplied as a Bearer token. Unverifiable tokens never block a request; only admin promotion requires a verified admin identity.",
        contact(
            name = "Fovia Team",
            email = "support@fovia.com"
        )
    ),
    paths(
        // Health
        crate::api::health::health_check,

        // Appointments
        crate::api::appointments::create_appointment,
        crate::api::appointments::list_appointments,

        // Doctors
        crate::api::doctors::list_doctors,
        crate::api::doctors::get_doctor,
        crate::api::doctors::delete_doctor,
        crate::api::doctors::create_doctor,

        // Feedback
        crate::api::feedback::create_feedback,
        crate::api::feedback::list_feedback,
        crate::api::feedback::update_feedback_status,
        crate::api::feedback::delete_feedback,

        // Users
        crate::api::users::create_user,
        crate::api::users::get_admin_flag,
        crate::api::users::upsert_user,
        crate::api::users::make_admin,
    ),
    components(
        schemas(
            crate::api::health::HealthResponse,
            crate::api::users::AdminFlagResponse,
        )
    ),
    tags(
        (name = "Health", description = "Liveness and status endpoints."),
        (name = "Appointments", description = "Appointment booking and exact-match listing."),
        (name = "Doctors", description = "Doctor profiles with inline image uploads."),
        (name = "Feedback", description = "Patient feedback entries with a visible/pending toggle."),
        (name = "Users", description = "User documents, admin flag, and admin promotion."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Enter a Firebase ID token"))
                        .build(),
                ),
            );
        }
    }
}
