//! Provider assembly: binds resource schemas and controllers to a configured
//! API client and implements [`ProviderService`] on top of them.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::client::BasisTheoryApi;
use crate::config::{HostInfo, ProviderConfig};
use crate::error::ProviderError;
use crate::plan::plan;
use crate::resources::{self, Resource, ResourceData};
use crate::schema::{Attribute, AttributeFlags, AttributeType, Diagnostic, ProviderSchema, Schema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult};
use crate::validation::validate;

/// What every controller call receives: the API client and the credentials
/// it was built from. Immutable once the provider is configured.
#[derive(Clone)]
pub struct ProviderContext {
    /// Client for the Basis Theory API.
    pub client: Arc<dyn BasisTheoryApi>,
    /// API key the client authenticates with.
    pub api_key: String,
    /// API base URL.
    pub api_url: String,
}

impl std::fmt::Debug for ProviderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderContext")
            .field("api_key", &"(sensitive)")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

/// The Basis Theory provider.
///
/// # Example
///
/// ```
/// use basistheory_provider::{BasisTheoryProvider, ProviderService};
///
/// let provider = BasisTheoryProvider::new();
/// assert!(provider.metadata().resources.contains(&"basistheory_proxy".to_string()));
/// ```
pub struct BasisTheoryProvider {
    resources: BTreeMap<&'static str, Arc<dyn Resource>>,
    context: RwLock<Option<Arc<ProviderContext>>>,
    client: Option<Arc<dyn BasisTheoryApi>>,
    host: HostInfo,
}

impl Default for BasisTheoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl BasisTheoryProvider {
    /// A provider that builds its client from configuration.
    pub fn new() -> Self {
        Self {
            resources: resources::all()
                .into_iter()
                .map(|r| (r.type_name(), r))
                .collect(),
            context: RwLock::new(None),
            client: None,
            host: HostInfo::default(),
        }
    }

    /// A provider that uses `client` instead of building one.
    pub fn with_client(client: Arc<dyn BasisTheoryApi>) -> Self {
        Self {
            client: Some(client),
            ..Self::new()
        }
    }

    /// Set the host identity reported in the `User-Agent` header.
    pub fn with_host(mut self, host: HostInfo) -> Self {
        self.host = host;
        self
    }

    /// Schema of the provider block.
    pub fn config_schema() -> Schema {
        Schema::v0()
            .with_attribute(
                "api_key",
                Attribute::optional_string()
                    .sensitive()
                    .with_description("Tenant API key. Defaults to BASISTHEORY_API_KEY."),
            )
            .with_attribute(
                "api_url",
                Attribute::optional_string()
                    .with_description("API base URL. Defaults to BASISTHEORY_API_URL."),
            )
            .with_attribute(
                "client_timeout",
                Attribute::new(AttributeType::Int64, AttributeFlags::optional())
                    .with_description("Request timeout in seconds. Defaults to BASISTHEORY_CLIENT_TIMEOUT."),
            )
    }

    fn resource(&self, resource_type: &str) -> Result<&Arc<dyn Resource>, ProviderError> {
        self.resources
            .get(resource_type)
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    async fn context(&self) -> Result<Arc<ProviderContext>, ProviderError> {
        self.context.read().await.clone().ok_or_else(|| {
            ProviderError::Configuration("provider has not been configured".to_string())
        })
    }

    fn preflight(resource: &dyn Resource, config: &Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let mut diagnostics = validate(&resource.schema(), config);
        if diagnostics.is_empty() {
            diagnostics.extend(resource.validate(&ResourceData::new(config.clone())?));
        }
        Ok(diagnostics)
    }
}

#[async_trait::async_trait]
impl ProviderService for BasisTheoryProvider {
    fn schema(&self) -> ProviderSchema {
        self.resources.iter().fold(
            ProviderSchema::new().with_provider_config(Self::config_schema()),
            |schema, (name, resource)| schema.with_resource(*name, resource.schema()),
        )
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let mut diagnostics = validate(&Self::config_schema(), &config);
        if diagnostics.is_empty() {
            if let Err(e) = ProviderConfig::from_value(&config) {
                diagnostics.extend(e.into_diagnostics());
            }
        }
        Ok(diagnostics)
    }

    #[instrument(skip_all)]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let settings = match ProviderConfig::from_value(&config) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "invalid provider configuration");
                return Ok(e.into_diagnostics());
            },
        };

        let client: Arc<dyn BasisTheoryApi> = match &self.client {
            Some(client) => client.clone(),
            None => match settings.build_client(&self.host) {
                Ok(client) => Arc::new(client),
                Err(e) => return Ok(e.into_diagnostics()),
            },
        };

        let context = ProviderContext {
            client,
            api_key: settings.api_key.clone(),
            api_url: settings.api_url.to_string(),
        };
        info!(api_url = %context.api_url, timeout = ?settings.client_timeout, "provider configured");
        *self.context.write().await = Some(Arc::new(context));

        Ok(Vec::new())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Self::preflight(self.resource(resource_type)?.as_ref(), &config)
    }

    #[instrument(skip(self, state))]
    async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: u64,
        state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        if version >= resource.schema().version {
            return Ok(state);
        }
        debug!("upgrading resource state");
        resource.upgrade_state(version, state)
    }

    #[instrument(skip(self, prior_state, config))]
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let resource = self.resource(resource_type)?;
        if !config.is_null() {
            let diagnostics = Self::preflight(resource.as_ref(), &config)?;
            if diagnostics.iter().any(Diagnostic::is_error) {
                return Err(ProviderError::Diagnostics(diagnostics));
            }
        }

        let result = plan(&resource.schema(), prior_state.as_ref(), &config);
        debug!(
            changes = result.changes.len(),
            requires_replace = result.requires_replace,
            "planned"
        );
        Ok(result)
    }

    #[instrument(skip(self, planned_state))]
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let ctx = self.context().await?;
        let mut data = ResourceData::new(planned_state)?;
        resource.create(&ctx, &mut data).await?;
        Ok(data.into_state())
    }

    #[instrument(skip(self, current_state))]
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let ctx = self.context().await?;
        let mut data = ResourceData::new(current_state)?;
        resource.read(&ctx, &mut data).await?;
        Ok(data.into_state())
    }

    #[instrument(skip(self, prior_state, planned_state))]
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let ctx = self.context().await?;
        let mut data = ResourceData::for_update(prior_state, planned_state)?;
        resource.update(&ctx, &mut data).await?;
        Ok(data.into_state())
    }

    #[instrument(skip(self, current_state))]
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let resource = self.resource(resource_type)?;
        let ctx = self.context().await?;
        let data = ResourceData::new(current_state)?;
        resource.delete(&ctx, &data).await
    }

    #[instrument(skip(self))]
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let state = resource.import(id)?;
        Ok(vec![ImportedResource::new(resource_type, state)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_lists_every_resource() {
        let provider = BasisTheoryProvider::new();
        let schema = provider.schema();
        assert_eq!(schema.resources.len(), 8);
        assert_eq!(schema.resources["basistheory_application"].version, 1);
        assert!(schema.provider.block.attributes["api_key"].flags.sensitive);

        let metadata = provider.metadata();
        assert_eq!(
            metadata.resources.first().map(String::as_str),
            Some("basistheory_applepay_domain")
        );
    }

    #[tokio::test]
    async fn test_operations_require_configuration() {
        let provider = BasisTheoryProvider::new();
        let err = provider
            .read("basistheory_webhook", json!({"id": "wh-1"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_unknown_resource_type() {
        let provider = BasisTheoryProvider::new();
        let err = provider
            .plan("basistheory_token", None, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_configure_reports_bad_settings() {
        let provider = BasisTheoryProvider::new();
        let diags = provider
            .configure(json!({"api_key": "key", "api_url": "::nope::"}))
            .await
            .unwrap();
        assert_eq!(diags.len(), 1);
        assert!(diags[0].summary.contains("api_url"));
        assert!(provider.context().await.is_err());
    }

    #[tokio::test]
    async fn test_configure_builds_context() {
        let provider = BasisTheoryProvider::new();
        let diags = provider
            .configure(json!({"api_key": "key_test", "api_url": "http://localhost:1", "client_timeout": 3}))
            .await
            .unwrap();
        assert!(diags.is_empty());

        let ctx = provider.context().await.unwrap();
        assert_eq!(ctx.api_key, "key_test");
        assert_eq!(ctx.api_url, "http://localhost:1/");
        assert!(!format!("{:?}", ctx).contains("key_test"));
    }

    #[tokio::test]
    async fn test_plan_surfaces_preflight_errors() {
        let provider = BasisTheoryProvider::new();
        let err = provider
            .plan(
                "basistheory_proxy",
                None,
                json!({
                    "name": "proxy",
                    "destination_url": "https://echo.example.com",
                    "response_transform": [{"type": "MASK"}]
                }),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "matcher is required when type is MASK");
    }

    #[tokio::test]
    async fn test_upgrade_only_runs_for_older_versions() {
        let provider = BasisTheoryProvider::new();
        let state = json!({"id": "app-1"});

        let upgraded = provider
            .upgrade_resource_state("basistheory_application", 0, state.clone())
            .await
            .unwrap();
        assert_eq!(upgraded["create_key"], true);

        let current = provider
            .upgrade_resource_state("basistheory_application", 1, state.clone())
            .await
            .unwrap();
        assert_eq!(current, state);
    }

    #[tokio::test]
    async fn test_import_application_key() {
        let provider = BasisTheoryProvider::new();
        let imported = provider
            .import_resource("basistheory_application_key", "app-1/key-1")
            .await
            .unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].state["application_id"], "app-1");
    }
}
