#[cfg(test)]
pub mod test_utils {
    use crate::ai::AiClient;
    use crate::router::create_router;
    use crate::schemas::{ApiResponse, AppState};
    use crate::tenant::{ADMIN_TOKEN_HEADER, ORGANIZATION_HEADER};
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use axum::Router;
    use axum_test::TestServer;
    use migration::{Migrator, MigratorTrait};
    use moka::future::Cache;
    use sea_orm::{ConnectionTrait, Database, DatabaseConnection};
    use serde_json::json;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    pub const TEST_ADMIN_TOKEN: &str = "test-admin-token";

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        db.execute_unprepared("PRAGMA foreign_keys = ON;")
            .await
            .expect("Failed to enable foreign keys");

        // Run migrations
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Create AppState for testing. AI is disabled, admin routes accept
    /// [`TEST_ADMIN_TOKEN`].
    pub async fn setup_test_app_state() -> AppState {
        let db = setup_test_db().await;
        let cache = Cache::new(100);

        AppState {
            db,
            cache,
            ai: None,
            admin_token: Some(TEST_ADMIN_TOKEN.to_string()),
        }
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is taken from RUST_LOG, defaulting to WARN.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Create axum app for testing
    pub async fn setup_test_app() -> Router {
        let _ = init_test_tracing();

        let state = setup_test_app_state().await;
        create_router(state)
    }

    /// Test server over a fresh database
    pub async fn setup_test_server() -> TestServer {
        TestServer::new(setup_test_app().await).unwrap()
    }

    /// Test server whose insight generation goes to the given provider
    pub async fn setup_test_server_with_ai(ai: AiClient) -> TestServer {
        let _ = init_test_tracing();

        let mut state = setup_test_app_state().await;
        state.ai = Some(ai);
        TestServer::new(create_router(state)).unwrap()
    }

    pub fn org_header() -> HeaderName {
        HeaderName::from_static(ORGANIZATION_HEADER)
    }

    pub fn org_value(organization_id: i32) -> HeaderValue {
        HeaderValue::from(organization_id)
    }

    pub fn admin_header() -> HeaderName {
        HeaderName::from_static(ADMIN_TOKEN_HEADER)
    }

    /// Create an organization and return its id
    pub async fn create_test_organization(server: &TestServer, slug: &str) -> i32 {
        let response = server
            .post("/api/v1/organizations")
            .json(&json!({ "name": format!("Agency {}", slug), "slug": slug }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<serde_json::Value> = response.json();
        body.data["id"].as_i64().unwrap() as i32
    }

    /// Create a client inside the organization and return its id
    pub async fn create_test_client(server: &TestServer, organization_id: i32, name: &str) -> i32 {
        let response = server
            .post("/api/v1/clients")
            .add_header(org_header(), org_value(organization_id))
            .json(&json!({ "name": name, "industry": "retail", "target_roas": "4", "crm_enabled": true }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<serde_json::Value> = response.json();
        body.data["id"].as_i64().unwrap() as i32
    }

    /// Create a campaign for the client and return its id
    pub async fn create_test_campaign(server: &TestServer, organization_id: i32, client_id: i32) -> i32 {
        let response = server
            .post(&format!("/api/v1/clients/{}/campaigns", client_id))
            .add_header(org_header(), org_value(organization_id))
            .json(&json!({ "name": "Search", "platform": "google" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<serde_json::Value> = response.json();
        body.data["id"].as_i64().unwrap() as i32
    }
}
