//! HTTP webhook delivery

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use tracing::{debug, warn};

use crate::error::{ActionError, ActionResult};
use crate::params::WebhookMethod;
use crate::ports::{WebhookRequest, WebhookSender};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("crm-automation/", env!("CARGO_PKG_VERSION"));

/// [`WebhookSender`] backed by a reqwest client
///
/// A non-2xx answer is a failure. Retries are left to the caller.
#[derive(Clone)]
pub struct HttpWebhookSender {
    client: Client,
}

impl HttpWebhookSender {
    /// Create a sender with a 30 second request timeout
    pub fn new() -> ActionResult<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> ActionResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// Use a preconfigured client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn method(method: WebhookMethod) -> Method {
    match method {
        WebhookMethod::Post => Method::POST,
        WebhookMethod::Put => Method::PUT,
        WebhookMethod::Patch => Method::PATCH,
    }
}

#[async_trait]
impl WebhookSender for HttpWebhookSender {
    async fn send(&self, request: WebhookRequest) -> ActionResult<()> {
        let mut builder = self
            .client
            .request(method(request.method), &request.url)
            .json(&request.body);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            debug!(url = %request.url, status = status.as_u16(), "Webhook delivered");
            Ok(())
        } else {
            warn!(url = %request.url, status = status.as_u16(), "Webhook rejected");
            Err(ActionError::WebhookStatus {
                url: request.url,
                status: status.as_u16(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use tokio::net::TcpListener;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn direct_sender() -> HttpWebhookSender {
        HttpWebhookSender::with_client(
            Client::builder()
                .no_proxy()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap(),
        )
    }

    fn request(url: String) -> WebhookRequest {
        WebhookRequest {
            url,
            method: WebhookMethod::Post,
            headers: HashMap::from([("X-Signature".to_string(), "abc".to_string())]),
            body: json!({"event": "automation.fired"}),
        }
    }

    #[test]
    fn test_default_sender_builds() {
        assert!(HttpWebhookSender::new().is_ok());
    }

    #[tokio::test]
    async fn test_delivers_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header("X-Signature", "abc"))
            .and(body_json(json!({"event": "automation.fired"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        direct_sender()
            .send(request(format!("{}/hook", server.uri())))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_put_method_is_used() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let mut put = request(format!("{}/hook", server.uri()));
        put.method = WebhookMethod::Put;
        direct_sender().send(put).await.unwrap();
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let err = direct_sender()
            .send(request(format!("{}/hook", server.uri())))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::WebhookStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_connection_error() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let sender = direct_sender();
        let err = sender
            .send(request(format!("http://{addr}/hook")))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Http(_)));
    }
}
