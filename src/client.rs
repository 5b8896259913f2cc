use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde_json::{Map, Value};
use std::ops::Deref;
use tracing::{debug, instrument};
use url::Url;

use chrono::{DateTime, Utc};

use crate::alert::Alert;
use crate::config::ClientOptions;
use crate::deployment::Deployment;
use crate::errors::{BigPandaError, Result};
use crate::types::{AlertStatus, DeploymentStatus, Event, Outbound};

/// Client for sending alerts and deployments to BigPanda
///
/// One pooled HTTP client is owned per instance and reused across sends.
/// Cloning is cheap and shares the pool.
///
/// # Example
///
/// ```rust,no_run
/// use bigpanda_api::{BigPandaClient, ClientOptions};
/// use serde_json::Map;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = BigPandaClient::from_options(
///         ClientOptions::new("my-api-token").with_app_key("my-app-key"),
///     )?;
///
///     client
///         .alert("critical", Map::new())
///         .with_attr("host", "web1")
///         .with_check("disk")
///         .send()
///         .await?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct BigPandaClient {
    client: ClientWithMiddleware,
    options: ClientOptions,
}

/// A fully validated request, ready to be posted
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub url: Url,
    pub body: Value,
}

impl BigPandaClient {
    /// Create a client with default options and the given API token
    ///
    /// No app key is set, so alerts cannot be sent until one is configured
    /// through [`from_options`](Self::from_options).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        Self::from_options(ClientOptions::new(api_token))
    }

    /// Create a client from explicit options
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_options(options: ClientOptions) -> Result<Self> {
        let mut builder = Client::builder().timeout(options.timeout);
        if !options.trust_env {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(BigPandaError::BuildHttpClient)?;

        let client = ClientBuilder::new(client).build();

        Ok(Self { client, options })
    }

    /// Create a new client with a custom reqwest middleware client
    ///
    /// This allows you to add custom middleware (retry, logging, etc.)
    pub fn with_client(client: ClientWithMiddleware, options: ClientOptions) -> Self {
        Self { client, options }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Start an alert bound to this client
    ///
    /// Nothing is validated or sent until [`Bound::send`] is called.
    pub fn alert(&self, status: impl Into<AlertStatus>, subject: Map<String, Value>) -> Bound<'_, Alert> {
        Bound {
            client: self,
            event: Alert::new(status, subject),
        }
    }

    /// Start a deployment bound to this client
    pub fn deployment(
        &self,
        component: impl Into<String>,
        version: impl Into<String>,
        hosts: Vec<String>,
    ) -> Bound<'_, Deployment> {
        Bound {
            client: self,
            event: Deployment::new(component, version, hosts),
        }
    }

    /// Validate and serialize an event or batch without sending it
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A batch is empty or contains anything other than alerts
    /// - An alert is missing an identity attribute
    /// - An alert is sent without an app key and the key is not suppressed
    /// - The base URL and endpoint do not form a valid URL
    pub fn prepare(&self, data: impl Into<Outbound>) -> Result<PreparedRequest> {
        let (mut payload, endpoint, is_alert) = match data.into() {
            Outbound::Single(event) => (event.build_payload()?, event.endpoint(), event.is_alert()),
            Outbound::Batch(events) => {
                let first = events.first().ok_or(BigPandaError::EmptyBatch)?;
                if !events.iter().all(Event::is_alert) {
                    return Err(BigPandaError::BatchType);
                }

                let alerts = events
                    .iter()
                    .map(|event| event.build_payload().map(Value::Object))
                    .collect::<Result<Vec<_>>>()?;

                let mut payload = Map::new();
                payload.insert("alerts".to_string(), Value::Array(alerts));
                (payload, first.endpoint(), true)
            }
        };

        if is_alert {
            match self.options.app_key.as_deref() {
                Some(app_key) if !app_key.is_empty() => {
                    payload.insert("app_key".to_string(), Value::from(app_key));
                }
                _ if self.options.suppress_app_key => {}
                _ => return Err(BigPandaError::MissingAppKey),
            }
        }

        Ok(PreparedRequest {
            url: self.endpoint_url(endpoint)?,
            body: Value::Object(payload),
        })
    }

    /// Send an alert, a deployment, or a batch of alerts in one request
    ///
    /// Validation happens before any network I/O. A batch succeeds or fails
    /// as a whole.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - [`prepare`](Self::prepare) rejects the data
    /// - The HTTP request fails
    /// - BigPanda returns a non-success status code
    #[instrument(name = "BigPandaClient::send", skip_all)]
    pub async fn send(&self, data: impl Into<Outbound>) -> Result<()> {
        let request = self.prepare(data)?;
        self.post(&request.url, &request.body).await
    }

    /// POST a JSON body with the bearer token
    #[instrument(name = "BigPandaClient::post", skip_all, fields(url = %url))]
    pub async fn post(&self, url: &Url, body: &Value) -> Result<()> {
        let body = serde_json::to_vec(body).map_err(BigPandaError::Serialize)?;

        debug!(bytes = body.len(), "Posting payload to BigPanda");

        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.options.api_token)
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.options.timeout)
            .body(body)
            .send()
            .await
            .map_err(BigPandaError::Request)?;

        Self::check_response(response).await
    }

    /// GET an endpoint relative to the base URL
    #[instrument(name = "BigPandaClient::get", skip_all, fields(endpoint = endpoint))]
    pub async fn get(&self, endpoint: &str) -> Result<()> {
        let url = self.endpoint_url(endpoint)?;

        debug!(url = %url, "Requesting BigPanda endpoint");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.options.api_token)
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.options.timeout)
            .send()
            .await
            .map_err(BigPandaError::Request)?;

        Self::check_response(response).await
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        let url = format!("{}{}", self.options.base_url.trim_end_matches('/'), endpoint);
        Url::parse(&url).map_err(|source| BigPandaError::InvalidUrl { url, source })
    }

    async fn check_response(response: Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BigPandaError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!(status = status.as_u16(), "BigPanda accepted request");
        Ok(())
    }
}

/// An event tied to the client that created it
///
/// Builder methods mirror those of the wrapped event; [`send`](Bound::send)
/// delivers it through the owning client.
pub struct Bound<'c, E> {
    client: &'c BigPandaClient,
    event: E,
}

impl<'c, E> Bound<'c, E> {
    /// Apply a change to the wrapped event
    pub fn map(self, f: impl FnOnce(E) -> E) -> Self {
        Self {
            client: self.client,
            event: f(self.event),
        }
    }

    /// Detach the event from the client
    pub fn into_inner(self) -> E {
        self.event
    }
}

impl<'c, E: Into<Outbound>> Bound<'c, E> {
    /// Send the event through the client that created it
    pub async fn send(self) -> Result<()> {
        self.client.send(self.event).await
    }
}

impl<'c, E> Deref for Bound<'c, E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.event
    }
}

impl<'c> Bound<'c, Alert> {
    pub fn with_check(self, check: impl Into<String>) -> Self {
        self.map(|a| a.with_check(check))
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        self.map(|a| a.with_description(description))
    }

    pub fn with_cluster(self, cluster: impl Into<String>) -> Self {
        self.map(|a| a.with_cluster(cluster))
    }

    pub fn with_timestamp(self, timestamp: DateTime<Utc>) -> Self {
        self.map(|a| a.with_timestamp(timestamp))
    }

    pub fn with_primary_attr(self, name: impl Into<String>) -> Self {
        self.map(|a| a.with_primary_attr(name))
    }

    pub fn with_secondary_attr(self, name: impl Into<String>) -> Self {
        self.map(|a| a.with_secondary_attr(name))
    }

    pub fn with_attr(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.map(|a| a.with_attr(key, value))
    }
}

impl<'c> Bound<'c, Deployment> {
    pub fn with_status(self, status: impl Into<DeploymentStatus>) -> Self {
        self.map(|d| d.with_status(status))
    }

    pub fn with_owner(self, owner: impl Into<String>) -> Self {
        self.map(|d| d.with_owner(owner))
    }

    pub fn with_env(self, env: impl Into<String>) -> Self {
        self.map(|d| d.with_env(env))
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        self.map(|d| d.with_description(description))
    }

    pub fn with_source_system(self, source_system: impl Into<String>) -> Self {
        self.map(|d| d.with_source_system(source_system))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn options(server: &MockServer) -> ClientOptions {
        ClientOptions::new("tok123")
            .with_base_url(server.uri())
            .with_trust_env(false)
    }

    fn host_check(host: &str, check: &str) -> Alert {
        Alert::new("critical", Map::new())
            .with_attr("host", host)
            .with_check(check)
    }

    #[tokio::test]
    async fn test_send_alert_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/alerts"))
            .and(header("Authorization", "Bearer tok123"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(json!({
                "app_key": "app1",
                "status": "critical",
                "host": "web1",
                "check": "disk"
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = BigPandaClient::from_options(options(&mock_server).with_app_key("app1")).unwrap();

        let result = client
            .alert("critical", Map::new())
            .with_attr("host", "web1")
            .with_check("disk")
            .send()
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_send_batch_single_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/alerts"))
            .and(body_json(json!({
                "app_key": "app1",
                "alerts": [
                    {"status": "critical", "host": "web1", "check": "disk"},
                    {"status": "critical", "host": "web2", "check": "cpu"},
                    {"status": "critical", "host": "web3", "check": "mem"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = BigPandaClient::from_options(options(&mock_server).with_app_key("app1")).unwrap();

        let alerts = vec![
            host_check("web1", "disk"),
            host_check("web2", "cpu"),
            host_check("web3", "mem"),
        ];

        let result = client.send(alerts).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_batch_with_deployment_rejected_before_network() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = BigPandaClient::from_options(options(&mock_server).with_app_key("app1")).unwrap();

        let batch = vec![
            Event::from(host_check("web1", "disk")),
            Event::from(Deployment::new("api", "1.0", vec!["web1".to_string()])),
        ];

        let result = client.send(batch).await;
        assert!(matches!(result, Err(BigPandaError::BatchType)));
    }

    #[tokio::test]
    async fn test_empty_batch_rejected() {
        let mock_server = MockServer::start().await;
        let client = BigPandaClient::from_options(options(&mock_server).with_app_key("app1")).unwrap();

        let result = client.send(Vec::<Alert>::new()).await;
        assert!(matches!(result, Err(BigPandaError::EmptyBatch)));
    }

    #[tokio::test]
    async fn test_missing_app_key_rejected_before_network() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = BigPandaClient::from_options(options(&mock_server)).unwrap();

        let result = client.send(host_check("web1", "disk")).await;
        assert!(matches!(result, Err(BigPandaError::MissingAppKey)));
    }

    #[tokio::test]
    async fn test_suppressed_app_key_allows_alert() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/alerts"))
            .and(body_json(json!({
                "status": "critical",
                "host": "web1",
                "check": "disk"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client =
            BigPandaClient::from_options(options(&mock_server).with_suppress_app_key(true)).unwrap();

        let result = client.send(host_check("web1", "disk")).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_deployment_never_carries_app_key() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/deployments"))
            .and(header("Authorization", "Bearer tok123"))
            .and(body_json(json!({
                "component": "billing",
                "version": "2.3.1",
                "hosts": ["web1", "web2"],
                "status": "start",
                "owner": "alice"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = BigPandaClient::from_options(options(&mock_server).with_app_key("app1")).unwrap();

        let result = client
            .deployment("billing", "2.3.1", vec!["web1".to_string(), "web2".to_string()])
            .with_owner("alice")
            .send()
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_deployment_without_app_key() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/deployments"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = BigPandaClient::from_options(options(&mock_server)).unwrap();

        let result = client
            .send(Deployment::new("api", "1.0", vec![]).with_status("end"))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_send_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/alerts"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&mock_server)
            .await;

        let client = BigPandaClient::from_options(options(&mock_server).with_app_key("app1")).unwrap();

        let result = client.send(host_check("web1", "disk")).await;

        if let Err(BigPandaError::Api { status, message }) = result {
            assert_eq!(status, 401);
            assert_eq!(message, "Unauthorized");
        } else {
            panic!("Expected Api error");
        }
    }

    #[tokio::test]
    async fn test_send_server_error_is_retryable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/alerts"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service unavailable"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = BigPandaClient::from_options(options(&mock_server).with_app_key("app1")).unwrap();

        let result = client.send(host_check("web1", "disk")).await;
        let err = result.unwrap_err();
        assert!(err.is_retryable());
        assert!(!err.is_validation());
    }

    #[tokio::test]
    async fn test_send_timeout() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/alerts"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&mock_server)
            .await;

        let client = BigPandaClient::from_options(
            options(&mock_server)
                .with_app_key("app1")
                .with_timeout(Duration::from_millis(100)),
        )
        .unwrap();

        let result = client.send(host_check("web1", "disk")).await;
        match result {
            Err(err @ BigPandaError::Request(_)) => assert!(err.is_retryable()),
            other => panic!("Expected Request error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_endpoint() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/alerts"))
            .and(header("Authorization", "Bearer tok123"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = BigPandaClient::from_options(options(&mock_server)).unwrap();

        assert!(client.get("/alerts").await.is_ok());
    }

    #[test]
    fn test_prepare_uses_first_alert_endpoint() {
        let client = BigPandaClient::from_options(
            ClientOptions::new("tok").with_app_key("app1").with_trust_env(false),
        )
        .unwrap();

        let request = client
            .prepare(vec![host_check("web1", "disk"), host_check("web2", "disk")])
            .unwrap();

        assert_eq!(request.url.as_str(), "https://api.bigpanda.io/data/v2/alerts");
        assert_eq!(request.body["alerts"].as_array().map(Vec::len), Some(2));
        assert_eq!(request.body["app_key"], "app1");
    }

    #[test]
    fn test_prepare_trailing_slash_base_url() {
        let client = BigPandaClient::from_options(
            ClientOptions::new("tok")
                .with_base_url("http://localhost:8080/api/")
                .with_trust_env(false),
        )
        .unwrap();

        let request = client
            .prepare(Deployment::new("api", "1.0", vec![]))
            .unwrap();
        assert_eq!(request.url.as_str(), "http://localhost:8080/api/deployments");
    }

    #[test]
    fn test_prepare_invalid_base_url() {
        let client = BigPandaClient::from_options(
            ClientOptions::new("tok")
                .with_base_url("not a url")
                .with_trust_env(false),
        )
        .unwrap();

        let result = client.prepare(Deployment::new("api", "1.0", vec![]));
        assert!(matches!(result, Err(BigPandaError::InvalidUrl { .. })));
    }

    #[test]
    fn test_prepare_missing_identity_in_batch() {
        let client = BigPandaClient::from_options(
            ClientOptions::new("tok").with_app_key("app1").with_trust_env(false),
        )
        .unwrap();

        let batch = vec![
            host_check("web1", "disk"),
            Alert::new("critical", Map::new()).with_check("disk"),
        ];

        let result = client.prepare(batch);
        assert!(matches!(result, Err(BigPandaError::MissingIdentity { .. })));
    }

    #[test]
    fn test_empty_app_key_treated_as_missing() {
        let client = BigPandaClient::from_options(
            ClientOptions::new("tok").with_app_key("").with_trust_env(false),
        )
        .unwrap();

        let result = client.prepare(host_check("web1", "disk"));
        assert!(matches!(result, Err(BigPandaError::MissingAppKey)));
    }

    #[test]
    fn test_factories_are_pure() {
        let client = BigPandaClient::new("tok").unwrap();

        let alert = client.alert("warning", Map::new()).with_cluster("east");
        assert_eq!(alert.status, AlertStatus::Warning);
        assert_eq!(alert.cluster.as_deref(), Some("east"));

        let deployment = client
            .deployment("api", "1.0", vec!["web1".to_string()])
            .with_env("staging")
            .into_inner();
        assert_eq!(deployment.status, DeploymentStatus::Start);
        assert_eq!(deployment.env.as_deref(), Some("staging"));
    }
}
