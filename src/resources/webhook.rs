//! `basistheory_webhook`

use tracing::{debug, info};

use super::{set_audit, with_audit_attributes, AttributeReader, Resource, ResourceData};
use crate::client::models::WebhookRequest;
use crate::diagnostics::api_error;
use crate::error::ProviderError;
use crate::provider::ProviderContext;
use crate::schema::{Attribute, Schema};

/// Event subscriptions delivered to an HTTPS endpoint.
pub struct WebhookResource;

fn request(data: &ResourceData) -> WebhookRequest {
    WebhookRequest {
        name: data.get_string("name"),
        url: data.get_string("url"),
        events: data.get_string_set("events"),
    }
}

#[async_trait::async_trait]
impl Resource for WebhookResource {
    fn type_name(&self) -> &'static str {
        "basistheory_webhook"
    }

    fn schema(&self) -> Schema {
        with_audit_attributes(Schema::v0())
            .with_description("Webhook")
            .with_attribute("name", Attribute::required_string())
            .with_attribute("url", Attribute::required_string())
            .with_attribute("events", Attribute::required_string_set())
    }

    async fn create(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let webhook = ctx
            .client
            .create_webhook(&request(data))
            .await
            .map_err(|e| api_error("Error creating Webhook:", e))?;

        info!(id = %webhook.id, "created webhook");
        data.set_id(webhook.id);
        self.read(ctx, data).await
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let id = data.require_id()?;
        debug!(%id, "reading webhook");

        let webhook = ctx
            .client
            .get_webhook(&id)
            .await
            .map_err(|e| api_error("Error reading Webhook:", e))?;

        data.set_id(webhook.id);
        data.set("name", webhook.name.unwrap_or_default());
        data.set("url", webhook.url.unwrap_or_default());
        data.set("events", webhook.events);
        set_audit(data, &webhook.audit);

        Ok(())
    }

    async fn update(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let id = data.require_id()?;
        ctx.client
            .update_webhook(&id, &request(data))
            .await
            .map_err(|e| api_error("Error updating Webhook:", e))?;
        info!(%id, "updated webhook");

        self.read(ctx, data).await
    }

    async fn delete(&self, ctx: &ProviderContext, data: &ResourceData) -> Result<(), ProviderError> {
        let id = data.require_id()?;
        ctx.client
            .delete_webhook(&id)
            .await
            .map_err(|e| api_error("Error deleting Webhook:", e))?;
        info!(%id, "deleted webhook");
        Ok(())
    }
}
