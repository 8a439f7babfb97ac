//! reqwest-backed implementation of [`BasisTheoryApi`].

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use super::models::{
    Application, ApplePayDomainRequest, ApplicationKey, ClientEncryptionKey,
    CreateApplicationRequest, CreateClientEncryptionKeyRequest, DomainRegistration,
    DomainRegistrationList, Proxy, ProxyRequest, Reactor, ReactorFormula, ReactorFormulaRequest,
    ReactorRequest, UpdateApplicationRequest, Webhook, WebhookRequest,
};
use super::{ApiError, BasisTheoryApi, API_KEY_HEADER};

/// Maximum length of response body to log
const MAX_LOG_BODY_LENGTH: usize = 200;

const APPLE_PAY_REGISTRATION: [&str; 3] = ["connections", "apple-pay", "domain-registration"];
const APPLE_PAY_DEREGISTRATION: [&str; 3] = ["connections", "apple-pay", "domain-deregistration"];

/// Truncate response bodies and strip control characters before logging.
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.chars().count() > MAX_LOG_BODY_LENGTH {
        let head: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
        format!("{}... [truncated, {} bytes total]", head, body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// HTTP client for the Basis Theory API.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: Url,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Build a client that authenticates every request with `api_key`.
    ///
    /// `timeout` bounds each request end to end; an expired request fails
    /// with [`ApiError::Transport`].
    pub fn new(
        base_url: Url,
        api_key: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Configuration(format!(
                "{} cannot be used as a base URL",
                base_url
            )));
        }

        let name = HeaderName::from_bytes(API_KEY_HEADER.as_bytes())
            .map_err(|e| ApiError::Configuration(e.to_string()))?;
        let mut value = HeaderValue::from_str(api_key).map_err(|_| {
            ApiError::Configuration("api_key contains characters not allowed in a header".into())
        })?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(name, value);

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// The API root every path is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ApiError::Configuration(format!("{} cannot be used as a base URL", self.base_url))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let url = self.url(segments)?;
        debug!(%method, %url, "Basis Theory API request");
        Ok(self.client.request(method, url))
    }

    async fn send(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(
                status = status.as_u16(),
                body = %sanitize_for_log(&body),
                "Basis Theory API error"
            );
            return Err(ApiError::from_response(status, &body));
        }

        Ok(body)
    }

    async fn execute<T: DeserializeOwned + Send>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let body = self.send(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get<T: DeserializeOwned + Send>(&self, segments: &[&str]) -> Result<T, ApiError> {
        self.execute(self.request(Method::GET, segments)?).await
    }

    async fn post<B, T>(&self, segments: &[&str], body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned + Send,
    {
        self.execute(self.request(Method::POST, segments)?.json(body))
            .await
    }

    async fn put<B, T>(&self, segments: &[&str], body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned + Send,
    {
        self.execute(self.request(Method::PUT, segments)?.json(body))
            .await
    }

    async fn delete(&self, segments: &[&str]) -> Result<(), ApiError> {
        self.send(self.request(Method::DELETE, segments)?)
            .await
            .map(|_| ())
    }
}

#[async_trait::async_trait]
impl BasisTheoryApi for HttpClient {
    async fn create_application(
        &self,
        request: &CreateApplicationRequest,
    ) -> Result<Application, ApiError> {
        self.post(&["applications"], request).await
    }

    async fn get_application(&self, id: &str) -> Result<Application, ApiError> {
        self.get(&["applications", id]).await
    }

    async fn update_application(
        &self,
        id: &str,
        request: &UpdateApplicationRequest,
    ) -> Result<Application, ApiError> {
        self.put(&["applications", id], request).await
    }

    async fn delete_application(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&["applications", id]).await
    }

    async fn create_application_key(
        &self,
        application_id: &str,
    ) -> Result<ApplicationKey, ApiError> {
        self.post(&["applications", application_id, "keys"], &serde_json::json!({}))
            .await
    }

    async fn get_application_key(
        &self,
        application_id: &str,
        key_id: &str,
    ) -> Result<ApplicationKey, ApiError> {
        self.get(&["applications", application_id, "keys", key_id])
            .await
    }

    async fn delete_application_key(
        &self,
        application_id: &str,
        key_id: &str,
    ) -> Result<(), ApiError> {
        self.delete(&["applications", application_id, "keys", key_id])
            .await
    }

    async fn create_reactor(&self, request: &ReactorRequest) -> Result<Reactor, ApiError> {
        self.post(&["reactors"], request).await
    }

    async fn get_reactor(&self, id: &str) -> Result<Reactor, ApiError> {
        self.get(&["reactors", id]).await
    }

    async fn update_reactor(
        &self,
        id: &str,
        request: &ReactorRequest,
    ) -> Result<Reactor, ApiError> {
        self.put(&["reactors", id], request).await
    }

    async fn delete_reactor(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&["reactors", id]).await
    }

    async fn create_reactor_formula(
        &self,
        request: &ReactorFormulaRequest,
    ) -> Result<ReactorFormula, ApiError> {
        self.post(&["reactor-formulas"], request).await
    }

    async fn get_reactor_formula(&self, id: &str) -> Result<ReactorFormula, ApiError> {
        self.get(&["reactor-formulas", id]).await
    }

    async fn update_reactor_formula(
        &self,
        id: &str,
        request: &ReactorFormulaRequest,
    ) -> Result<ReactorFormula, ApiError> {
        self.put(&["reactor-formulas", id], request).await
    }

    async fn delete_reactor_formula(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&["reactor-formulas", id]).await
    }

    async fn create_proxy(&self, request: &ProxyRequest) -> Result<Proxy, ApiError> {
        self.post(&["proxies"], request).await
    }

    async fn get_proxy(&self, id: &str) -> Result<Proxy, ApiError> {
        self.get(&["proxies", id]).await
    }

    async fn update_proxy(&self, id: &str, request: &ProxyRequest) -> Result<Proxy, ApiError> {
        self.put(&["proxies", id], request).await
    }

    async fn delete_proxy(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&["proxies", id]).await
    }

    async fn create_webhook(&self, request: &WebhookRequest) -> Result<Webhook, ApiError> {
        self.post(&["webhooks"], request).await
    }

    async fn get_webhook(&self, id: &str) -> Result<Webhook, ApiError> {
        self.get(&["webhooks", id]).await
    }

    async fn update_webhook(
        &self,
        id: &str,
        request: &WebhookRequest,
    ) -> Result<Webhook, ApiError> {
        self.put(&["webhooks", id], request).await
    }

    async fn delete_webhook(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&["webhooks", id]).await
    }

    async fn create_client_encryption_key(
        &self,
        request: &CreateClientEncryptionKeyRequest,
    ) -> Result<ClientEncryptionKey, ApiError> {
        self.post(&["keys"], request).await
    }

    async fn get_client_encryption_key(
        &self,
        id: &str,
    ) -> Result<ClientEncryptionKey, ApiError> {
        self.get(&["keys", id]).await
    }

    async fn delete_client_encryption_key(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&["keys", id]).await
    }

    async fn register_apple_pay_domain(
        &self,
        domain: &str,
    ) -> Result<DomainRegistration, ApiError> {
        let request = ApplePayDomainRequest {
            domain: domain.to_string(),
        };
        self.post(&APPLE_PAY_REGISTRATION, &request).await
    }

    async fn list_apple_pay_domains(&self) -> Result<Vec<DomainRegistration>, ApiError> {
        let list: DomainRegistrationList = self.get(&APPLE_PAY_REGISTRATION).await?;
        Ok(list.domains)
    }

    async fn deregister_apple_pay_domain(&self, domain: &str) -> Result<(), ApiError> {
        let request = ApplePayDomainRequest {
            domain: domain.to_string(),
        };
        self.send(
            self.request(Method::POST, &APPLE_PAY_DEREGISTRATION)?
                .json(&request),
        )
        .await
        .map(|_| ())
    }
}
