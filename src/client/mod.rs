//! Basis Theory API client.
//!
//! [`BasisTheoryApi`] is the seam between resource controllers and the
//! network: one async method per endpoint, typed requests and responses,
//! and the closed [`ApiError`] set for failures. [`HttpClient`] is the
//! reqwest implementation used in production; tests and embedders may
//! supply their own implementation through
//! [`BasisTheoryProvider::with_client`](crate::BasisTheoryProvider::with_client).
//!
//! Every method returns a plain future. Dropping it aborts the in-flight
//! request, which is how host cancellation reaches the network.

mod error;
mod http;
#[allow(missing_docs)]
pub mod models;

pub use error::{ApiError, ProblemDetails, ValidationProblemDetails};
pub use http::HttpClient;

use models::{
    Application, ApplicationKey, ClientEncryptionKey, CreateApplicationRequest,
    CreateClientEncryptionKeyRequest, DomainRegistration, Proxy, ProxyRequest, Reactor,
    ReactorFormula, ReactorFormulaRequest, ReactorRequest, UpdateApplicationRequest, Webhook,
    WebhookRequest,
};

/// Header carrying the tenant API key.
pub const API_KEY_HEADER: &str = "BT-API-KEY";

/// Typed access to the Basis Theory endpoints the provider manages.
#[async_trait::async_trait]
pub trait BasisTheoryApi: Send + Sync {
    // =========================================================================
    // Applications
    // =========================================================================

    /// `POST /applications`
    async fn create_application(
        &self,
        request: &CreateApplicationRequest,
    ) -> Result<Application, ApiError>;

    /// `GET /applications/{id}`
    async fn get_application(&self, id: &str) -> Result<Application, ApiError>;

    /// `PUT /applications/{id}`
    async fn update_application(
        &self,
        id: &str,
        request: &UpdateApplicationRequest,
    ) -> Result<Application, ApiError>;

    /// `DELETE /applications/{id}`
    async fn delete_application(&self, id: &str) -> Result<(), ApiError>;

    /// `POST /applications/{application_id}/keys`
    async fn create_application_key(
        &self,
        application_id: &str,
    ) -> Result<ApplicationKey, ApiError>;

    /// `GET /applications/{application_id}/keys/{key_id}`
    async fn get_application_key(
        &self,
        application_id: &str,
        key_id: &str,
    ) -> Result<ApplicationKey, ApiError>;

    /// `DELETE /applications/{application_id}/keys/{key_id}`
    async fn delete_application_key(
        &self,
        application_id: &str,
        key_id: &str,
    ) -> Result<(), ApiError>;

    // =========================================================================
    // Reactors
    // =========================================================================

    /// `POST /reactors`
    async fn create_reactor(&self, request: &ReactorRequest) -> Result<Reactor, ApiError>;

    /// `GET /reactors/{id}`
    async fn get_reactor(&self, id: &str) -> Result<Reactor, ApiError>;

    /// `PUT /reactors/{id}`
    async fn update_reactor(&self, id: &str, request: &ReactorRequest)
        -> Result<Reactor, ApiError>;

    /// `DELETE /reactors/{id}`
    async fn delete_reactor(&self, id: &str) -> Result<(), ApiError>;

    /// `POST /reactor-formulas`
    async fn create_reactor_formula(
        &self,
        request: &ReactorFormulaRequest,
    ) -> Result<ReactorFormula, ApiError>;

    /// `GET /reactor-formulas/{id}`
    async fn get_reactor_formula(&self, id: &str) -> Result<ReactorFormula, ApiError>;

    /// `PUT /reactor-formulas/{id}`
    async fn update_reactor_formula(
        &self,
        id: &str,
        request: &ReactorFormulaRequest,
    ) -> Result<ReactorFormula, ApiError>;

    /// `DELETE /reactor-formulas/{id}`
    async fn delete_reactor_formula(&self, id: &str) -> Result<(), ApiError>;

    // =========================================================================
    // Proxies
    // =========================================================================

    /// `POST /proxies`
    async fn create_proxy(&self, request: &ProxyRequest) -> Result<Proxy, ApiError>;

    /// `GET /proxies/{id}`
    async fn get_proxy(&self, id: &str) -> Result<Proxy, ApiError>;

    /// `PUT /proxies/{id}`
    async fn update_proxy(&self, id: &str, request: &ProxyRequest) -> Result<Proxy, ApiError>;

    /// `DELETE /proxies/{id}`
    async fn delete_proxy(&self, id: &str) -> Result<(), ApiError>;

    // =========================================================================
    // Webhooks
    // =========================================================================

    /// `POST /webhooks`
    async fn create_webhook(&self, request: &WebhookRequest) -> Result<Webhook, ApiError>;

    /// `GET /webhooks/{id}`
    async fn get_webhook(&self, id: &str) -> Result<Webhook, ApiError>;

    /// `PUT /webhooks/{id}`
    async fn update_webhook(&self, id: &str, request: &WebhookRequest)
        -> Result<Webhook, ApiError>;

    /// `DELETE /webhooks/{id}`
    async fn delete_webhook(&self, id: &str) -> Result<(), ApiError>;

    // =========================================================================
    // Client encryption keys
    // =========================================================================

    /// `POST /keys`
    async fn create_client_encryption_key(
        &self,
        request: &CreateClientEncryptionKeyRequest,
    ) -> Result<ClientEncryptionKey, ApiError>;

    /// `GET /keys/{id}`
    async fn get_client_encryption_key(&self, id: &str)
        -> Result<ClientEncryptionKey, ApiError>;

    /// `DELETE /keys/{id}`
    async fn delete_client_encryption_key(&self, id: &str) -> Result<(), ApiError>;

    // =========================================================================
    // Apple Pay domains
    // =========================================================================

    /// `POST /connections/apple-pay/domain-registration`
    async fn register_apple_pay_domain(
        &self,
        domain: &str,
    ) -> Result<DomainRegistration, ApiError>;

    /// `GET /connections/apple-pay/domain-registration`
    async fn list_apple_pay_domains(&self) -> Result<Vec<DomainRegistration>, ApiError>;

    /// `POST /connections/apple-pay/domain-deregistration`
    async fn deregister_apple_pay_domain(&self, domain: &str) -> Result<(), ApiError>;
}
