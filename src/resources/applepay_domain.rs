//! `basistheory_applepay_domain`
//!
//! Registrations have no server ID; the domain itself identifies one, and
//! reading means scanning the tenant's whole registration list.

use tracing::{debug, info};

use super::{AttributeReader, Resource, ResourceData};
use crate::diagnostics::api_error;
use crate::error::ProviderError;
use crate::provider::ProviderContext;
use crate::schema::{Attribute, Schema};

/// A domain registered for Apple Pay on the web.
pub struct ApplePayDomainResource;

#[async_trait::async_trait]
impl Resource for ApplePayDomainResource {
    fn type_name(&self) -> &'static str {
        "basistheory_applepay_domain"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("Apple Pay Domain")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("domain", Attribute::required_string().with_force_new())
    }

    async fn create(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let domain = data.get_string("domain");
        let registration = ctx
            .client
            .register_apple_pay_domain(&domain)
            .await
            .map_err(|e| api_error("Error registering Apple Pay Domain:", e))?;

        info!(%domain, registered = %registration.domain, "registered apple pay domain");
        data.set_id(domain);
        self.read(ctx, data).await
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let id = data.require_id()?;
        debug!(%id, "reading apple pay domain");

        let domains = ctx
            .client
            .list_apple_pay_domains()
            .await
            .map_err(|e| api_error("Error reading Apple Pay Domain:", e))?;

        let registration = domains
            .into_iter()
            .find(|d| d.domain == id)
            .ok_or_else(|| ProviderError::summary(format!("No domain found with ID: {}", id)))?;

        data.set_id(registration.domain.clone());
        data.set("domain", registration.domain);
        Ok(())
    }

    async fn update(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        self.read(ctx, data).await
    }

    async fn delete(&self, ctx: &ProviderContext, data: &ResourceData) -> Result<(), ProviderError> {
        let id = data.require_id()?;
        ctx.client
            .deregister_apple_pay_domain(&id)
            .await
            .map_err(|e| api_error("Error deregistering Apple Pay Domain:", e))?;
        info!(domain = %id, "deregistered apple pay domain");
        Ok(())
    }
}
