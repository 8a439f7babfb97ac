//! `basistheory_reactor`

use tracing::{debug, info};

use super::{set_audit, with_audit_attributes, AttributeReader, Resource, ResourceData};
use crate::client::models::{ApplicationRef, ReactorRequest};
use crate::diagnostics::api_error;
use crate::error::ProviderError;
use crate::provider::ProviderContext;
use crate::schema::{Attribute, Schema};

/// Serverless functions bound to an application.
pub struct ReactorResource;

impl ReactorResource {
    fn request(data: &ResourceData) -> ReactorRequest {
        ReactorRequest {
            name: data.get_string("name"),
            code: data.get_optional_string("code"),
            application: data
                .get_non_empty_string("application_id")
                .map(|id| ApplicationRef { id }),
            configuration: data.get_string_map("configuration"),
        }
    }
}

#[async_trait::async_trait]
impl Resource for ReactorResource {
    fn type_name(&self) -> &'static str {
        "basistheory_reactor"
    }

    fn schema(&self) -> Schema {
        with_audit_attributes(Schema::v0())
            .with_description("Reactor")
            .with_attribute("name", Attribute::required_string())
            .with_attribute("code", Attribute::optional_string())
            .with_attribute("application_id", Attribute::optional_string())
            .with_attribute("configuration", Attribute::optional_string_map().sensitive())
    }

    async fn create(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let reactor = ctx
            .client
            .create_reactor(&Self::request(data))
            .await
            .map_err(|e| api_error("Error creating Reactor:", e))?;

        info!(id = %reactor.id, "created reactor");
        data.set_id(reactor.id);
        self.read(ctx, data).await
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let id = data.require_id()?;
        debug!(%id, "reading reactor");

        let reactor = ctx
            .client
            .get_reactor(&id)
            .await
            .map_err(|e| api_error("Error reading Reactor:", e))?;

        data.set_id(reactor.id);
        data.set("name", reactor.name.unwrap_or_default());
        data.set("code", reactor.code.unwrap_or_default());
        data.set(
            "application_id",
            reactor.application.map(|a| a.id).unwrap_or_default(),
        );
        data.set(
            "configuration",
            serde_json::to_value(&reactor.configuration)?,
        );
        set_audit(data, &reactor.audit);

        Ok(())
    }

    async fn update(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let id = data.require_id()?;
        ctx.client
            .update_reactor(&id, &Self::request(data))
            .await
            .map_err(|e| api_error("Error updating Reactor:", e))?;
        info!(%id, "updated reactor");

        self.read(ctx, data).await
    }

    async fn delete(&self, ctx: &ProviderContext, data: &ResourceData) -> Result<(), ProviderError> {
        let id = data.require_id()?;
        ctx.client
            .delete_reactor(&id)
            .await
            .map_err(|e| api_error("Error deleting Reactor:", e))?;
        info!(%id, "deleted reactor");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_application_id_is_omitted() {
        let data = ResourceData::new(json!({
            "name": "reactor",
            "code": "module.exports = async () => ({})",
            "application_id": "",
            "configuration": {"REGION": "us-east-1"}
        }))
        .unwrap();

        let request = ReactorResource::request(&data);
        assert!(request.application.is_none());
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "name": "reactor",
                "code": "module.exports = async () => ({})",
                "configuration": {"REGION": "us-east-1"}
            })
        );
    }

    #[test]
    fn test_application_id_is_sent_when_set() {
        let data = ResourceData::new(json!({"name": "r", "application_id": "app-1"})).unwrap();
        let request = ReactorResource::request(&data);
        assert_eq!(request.application.map(|a| a.id).as_deref(), Some("app-1"));
    }
}
