mod api;
mod database;
mod middleware;
mod models;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{guard, middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::env;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use middleware::auth::VerifyToken;
use services::identity_service::{FirebaseVerifier, IdentityVerifier};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Get configuration from environment
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "5000".to_string());
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    log::info!("🚀 Starting Fovia Service...");

    // Initialize MongoDB connection
    let db = database::MongoDB::new(&database_url)
        .await
        .expect("Failed to connect to MongoDB");

    let db_data = web::Data::new(db.clone());

    log::info!("✅ MongoDB connected successfully");

    // Identity verifier for the fail-open bearer-token gate
    let verifier: Arc<dyn IdentityVerifier> = Arc::new(
        FirebaseVerifier::from_env().expect("Failed to load FIREBASE_SERVICE_ACCOUNT"),
    );

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);

    // Start HTTP server
    let server = HttpServer::new(move || {
        let cors = Cors::permissive();

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
            // Liveness
            .route("/", web::get().to(api::health::server_status))
            .route("/health", web::get().to(api::health::health_check))
            // Appointments: booking is open; the listing runs behind the
            // fail-open gate (its outcome is not read by the handler)
            .service(
                web::scope("/appointments")
                    .service(
                        web::resource("")
                            .guard(guard::Post())
                            .to(api::appointments::create_appointment),
                    )
                    .service(
                        web::resource("")
                            .guard(guard::Get())
                            .wrap(VerifyToken::new(verifier.clone()))
                            .to(api::appointments::list_appointments),
                    ),
            )
            // Doctors
            .service(
                web::scope("/doctors")
                    .service(
                        web::resource("")
                            .route(web::get().to(api::doctors::list_doctors))
                            .route(web::post().to(api::doctors::create_doctor)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(api::doctors::get_doctor))
                            .route(web::delete().to(api::doctors::delete_doctor)),
                    ),
            )
            // Feedback
            .service(
                web::scope("/feedback")
                    .service(
                        web::resource("")
                            .route(web::post().to(api::feedback::create_feedback))
                            .route(web::get().to(api::feedback::list_feedback)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::post().to(api::feedback::update_feedback_status))
                            .route(web::delete().to(api::feedback::delete_feedback)),
                    ),
            )
            // Users: admin promotion runs behind the gate; GET /users/admin
            // still resolves as an admin-flag lookup for the literal "admin"
            .service(
                web::scope("/users")
                    .service(
                        web::resource("/admin")
                            .guard(guard::Put())
                            .wrap(VerifyToken::new(verifier.clone()))
                            .to(api::users::make_admin),
                    )
                    .service(
                        web::resource("")
                            .route(web::post().to(api::users::create_user))
                            .route(web::put().to(api::users::upsert_user)),
                    )
                    .route("/{email}", web::get().to(api::users::get_admin_flag)),
            )
    })
    .bind(format!("{}:{}", host, port))?
    .run();

    let result = server.await;

    log::info!("🛑 Server stopped, closing MongoDB connection");
    db.shutdown().await;

    result
}
