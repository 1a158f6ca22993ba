//! HTTP implementation of the board and roster gateways.
//!
//! Talks to a running AgencyOps server as one organization. Reads are retried
//! on transport failures and 5xx answers; mutations are sent once.

use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use common::{
    ApiResponse, BoardSnapshot, ClientDto, ClientStatus, DateWindow, ErrorResponse,
    MoveTaskRequest, TaskCategory, TaskDto, ToggleTaskRequest,
};
use compute::{ClientGateway, GatewayError, TaskGateway};

use crate::tenant::ORGANIZATION_HEADER;

#[derive(Debug, Clone)]
pub struct HttpGateway {
    http: Client,
    base_url: String,
    organization_id: i32,
}

impl HttpGateway {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(base_url: impl Into<String>, organization_id: i32) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("agencyops/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::Remote(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            organization_id,
        })
    }

    pub fn organization_id(&self) -> i32 {
        self.organization_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    fn scoped(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(ORGANIZATION_HEADER, self.organization_id)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GatewayError> {
        let response = self
            .scoped(request)
            .send()
            .await
            .map_err(|e| GatewayError::Remote(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let body: ApiResponse<T> = response
                .json()
                .await
                .map_err(|e| GatewayError::Remote(format!("Invalid response body: {}", e)))?;
            return Ok(body.data);
        }

        let message = match response.json::<ErrorResponse>().await {
            Ok(error) => error.error,
            Err(_) => status.to_string(),
        };
        debug!(%status, %message, "Remote call rejected");
        Err(match status {
            StatusCode::CONFLICT => GatewayError::Conflict(message),
            StatusCode::NOT_FOUND => GatewayError::NotFound(message),
            _ => GatewayError::Status {
                status: status.as_u16(),
                message,
            },
        })
    }

    /// GET with retries on transient failures.
    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let url = self.url(path);
        (|| async { self.send(self.http.get(&url).query(query)).await })
            .retry(
                &ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(200))
                    .with_max_delay(Duration::from_secs(2))
                    .with_max_times(3),
            )
            .when(is_transient)
            .notify(|e, dur| {
                warn!("Gateway read failed, retrying after {:.2}s: {}", dur.as_secs_f64(), e)
            })
            .await
    }
}

fn is_transient(error: &GatewayError) -> bool {
    match error {
        GatewayError::Remote(_) => true,
        GatewayError::Status { status, .. } => *status >= 500,
        _ => false,
    }
}

#[async_trait]
impl TaskGateway for HttpGateway {
    #[instrument(skip(self))]
    async fn fetch_board(&self) -> Result<BoardSnapshot, GatewayError> {
        self.fetch("/board", &[]).await
    }

    #[instrument(skip(self))]
    async fn update_category(
        &self,
        task_id: i32,
        category: TaskCategory,
        expected_version: Option<i32>,
    ) -> Result<TaskDto, GatewayError> {
        let body = MoveTaskRequest { category, expected_version };
        let url = self.url(&format!("/tasks/{}/category", task_id));
        self.send(self.http.patch(url).json(&body)).await
    }

    #[instrument(skip(self))]
    async fn set_completed(
        &self,
        task_id: i32,
        completed: bool,
        expected_version: Option<i32>,
    ) -> Result<TaskDto, GatewayError> {
        let body = ToggleTaskRequest { completed, expected_version };
        let url = self.url(&format!("/tasks/{}/completion", task_id));
        self.send(self.http.patch(url).json(&body)).await
    }

    #[instrument(skip(self))]
    async fn delete_task(&self, task_id: i32) -> Result<(), GatewayError> {
        let url = self.url(&format!("/tasks/{}", task_id));
        self.send::<String>(self.http.delete(url)).await.map(|_| ())
    }
}

#[async_trait]
impl ClientGateway for HttpGateway {
    #[instrument(skip(self))]
    async fn list_clients(&self, window: Option<DateWindow>) -> Result<Vec<ClientDto>, GatewayError> {
        let query = match window {
            Some(window) => vec![
                ("start_date", window.start.to_string()),
                ("end_date", window.end.to_string()),
            ],
            None => Vec::new(),
        };
        self.fetch("/clients", &query).await
    }

    #[instrument(skip(self))]
    async fn delete_client(&self, client_id: i32) -> Result<(), GatewayError> {
        let url = self.url(&format!("/clients/{}", client_id));
        self.send::<String>(self.http.delete(url).query(&[("confirm", "true")]))
            .await
            .map(|_| ())
    }

    #[instrument(skip(self))]
    async fn set_client_status(
        &self,
        client_id: i32,
        status: ClientStatus,
    ) -> Result<ClientDto, GatewayError> {
        let action = match status {
            ClientStatus::Paused => "pause",
            ClientStatus::Active => "reactivate",
        };
        let url = self.url(&format!("/clients/{}/{}", client_id, action));
        self.send(self.http.post(url).query(&[("confirm", "true")])).await
    }
}

#[cfg(test)]
mod tests {
    use super::{is_transient, HttpGateway};
    use crate::router::create_router;
    use crate::test_utils::test_utils::setup_test_app_state;
    use common::{ClientStatus, TaskCategory};
    use compute::{ClientGateway, ClientRoster, GatewayError, Outcome, TaskBoard, TaskGateway};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    async fn spawn_server() -> String {
        let app = create_router(setup_test_app_state().await);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn post(base: &str, path: &str, org: Option<i32>, body: Value) -> Value {
        let mut request = reqwest::Client::new()
            .post(format!("{}/api/v1{}", base, path))
            .json(&body);
        if let Some(org) = org {
            request = request.header("x-organization-id", org);
        }
        let response: Value = request.send().await.unwrap().json().await.unwrap();
        response["data"].clone()
    }

    async fn seed(base: &str) -> (i32, i32) {
        let org = post(base, "/organizations", None, json!({ "name": "Agency", "slug": "agency" })).await;
        let org_id = org["id"].as_i64().unwrap() as i32;
        let client = post(base, "/clients", Some(org_id), json!({ "name": "Acme" })).await;
        (org_id, client["id"].as_i64().unwrap() as i32)
    }

    #[tokio::test]
    async fn test_board_moves_go_through_http() {
        let base = spawn_server().await;
        let (org_id, _) = seed(&base).await;
        let task = post(&base, "/tasks", Some(org_id), json!({ "title": "Write brief" })).await;
        let task_id = task["id"].as_i64().unwrap() as i32;

        let gateway = HttpGateway::new(base.as_str(), org_id).unwrap();
        let mut board = TaskBoard::load(gateway).await.unwrap();
        assert_eq!(board.snapshot().tasks.len(), 1);

        let moved = board.move_task(task_id, TaskCategory::Delegate).await.unwrap();
        assert_eq!(moved.category, TaskCategory::Delegate);
        assert_eq!(moved.version, 2);

        // A stale version is reported as a conflict by the server
        let stale = board
            .gateway()
            .update_category(task_id, TaskCategory::Schedule, Some(1))
            .await;
        assert!(matches!(stale, Err(GatewayError::Conflict(_))));

        let missing = board.gateway().set_completed(9999, true, None).await;
        assert!(matches!(missing, Err(GatewayError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_roster_pause_and_delete() {
        let base = spawn_server().await;
        let (org_id, client_id) = seed(&base).await;

        let gateway = HttpGateway::new(base.as_str(), org_id).unwrap();
        let mut roster = ClientRoster::new(gateway);
        roster.load(None).await.unwrap();
        assert_eq!(roster.clients().len(), 1);

        let outcome = roster.pause_client(client_id, &|_: &str| true).await.unwrap();
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(roster.clients()[0].status, ClientStatus::Paused);

        let outcome = roster.delete_client(client_id, &|_: &str| false).await.unwrap();
        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(roster.gateway().list_clients(None).await.unwrap().len(), 1);

        roster.delete_client(client_id, &|_: &str| true).await.unwrap();
        assert!(roster.clients().is_empty());
        assert!(roster.gateway().list_clients(None).await.unwrap().is_empty());
    }

    #[test]
    fn test_only_server_side_failures_are_retried() {
        assert!(is_transient(&GatewayError::Remote("connection refused".to_string())));
        assert!(is_transient(&GatewayError::Status { status: 503, message: String::new() }));
        assert!(!is_transient(&GatewayError::Status { status: 401, message: String::new() }));
        assert!(!is_transient(&GatewayError::Conflict(String::new())));
    }

    #[tokio::test]
    async fn test_unknown_organization_keeps_its_status() {
        let base = spawn_server().await;
        let gateway = HttpGateway::new(base.as_str(), 9999).unwrap();

        let err = gateway.fetch_board().await.unwrap_err();
        assert!(matches!(err, GatewayError::Status { status: 401, .. }));
    }
}
