use mongodb::{Client, Collection, Database};
use std::error::Error;

#[derive(Clone)]
pub struct MongoDB {
    client: Client,
    db: Database,
}

/// Extracts the database name from the connection URI path, falling back to
/// the service default when the URI has no path segment.
fn database_name(uri: &str) -> &str {
    uri.split('/')
        .last()
        .and_then(|s| s.split('?').next())
        .filter(|s| !s.is_empty() && !s.contains(':'))
        .unwrap_or("foviaDoctor")
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Connection pool tuning
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        let db = client.database(database_name(uri));

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { client, db };

        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the indexes backing the two exact-match query shapes
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        use mongodb::bson::doc;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        // Index for users: (email) - admin-flag lookups and upserts
        let users = self.db.collection::<mongodb::bson::Document>("users");

        let users_index = IndexModel::builder().keys(doc! { "email": 1 }).build();

        match users.create_index(users_index).await {
            Ok(_) => log::info!("   ✅ Index created: users(email)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        // Index for appointments: (email, date) - booking-list queries
        let appointments = self.db.collection::<mongodb::bson::Document>("appointments");

        let appointments_index = IndexModel::builder()
            .keys(doc! { "email": 1, "date": 1 })
            .build();

        match appointments.create_index(appointments_index).await {
            Ok(_) => log::info!("   ✅ Index created: appointments(email, date)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    /// Closes the underlying client. Called once, after the HTTP server exits.
    pub async fn shutdown(&self) {
        self.client.clone().shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_mongodb_connection() {
        dotenv::dotenv().ok();

        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/foviaDoctor".to_string());

        let db = MongoDB::new(&uri).await;
        assert!(db.is_ok());
    }

    #[test]
    fn database_name_comes_from_the_uri_path() {
        assert_eq!(database_name("mongodb://localhost:27017/clinic"), "clinic");
        assert_eq!(
            database_name("mongodb+srv://u:p@cluster0.example.net/booking?retryWrites=true"),
            "booking"
        );
    }

    #[test]
    fn database_name_falls_back_when_the_uri_has_no_path() {
        assert_eq!(database_name("mongodb://localhost:27017"), "foviaDoctor");
        assert_eq!(database_name("mongodb://localhost:27017/"), "foviaDoctor");
    }
}
