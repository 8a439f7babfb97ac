//! `basistheory_application_key`

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::{AttributeReader, Resource, ResourceData};
use crate::diagnostics::api_error;
use crate::error::ProviderError;
use crate::provider::ProviderContext;
use crate::schema::{Attribute, Schema};

/// Additional keys minted for an existing application.
pub struct ApplicationKeyResource;

#[async_trait::async_trait]
impl Resource for ApplicationKeyResource {
    fn type_name(&self) -> &'static str {
        "basistheory_application_key"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("Application Key")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "application_id",
                Attribute::required_string().with_description("Write-once."),
            )
            .with_attribute("key", Attribute::computed_string().sensitive())
            .with_attribute("created_by", Attribute::computed_string())
            .with_attribute("created_at", Attribute::computed_string())
    }

    /// Keys are addressed through their application: `<application_id>/<key_id>`.
    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        match id.split_once('/') {
            Some((application_id, key_id)) if !application_id.is_empty() && !key_id.is_empty() => {
                Ok(json!({ "id": key_id, "application_id": application_id }))
            },
            _ => Err(ProviderError::Validation(format!(
                "unexpected import ID {:?}, expected <application_id>/<key_id>",
                id
            ))),
        }
    }

    async fn create(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let application_id = data.get_string("application_id");
        let key = ctx
            .client
            .create_application_key(&application_id)
            .await
            .map_err(|e| api_error("Error creating ApplicationKey:", e))?;

        info!(id = %key.id, %application_id, "created application key");
        data.set_id(key.id);
        if let Some(value) = key.key {
            data.set("key", value);
        }

        self.read(ctx, data).await
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let id = data.require_id()?;
        let application_id = data.get_string("application_id");
        debug!(%id, %application_id, "reading application key");

        let key = ctx
            .client
            .get_application_key(&application_id, &id)
            .await
            .map_err(|e| api_error("Error reading ApplicationKey:", e))?;

        data.set_id(key.id);
        if let Some(value) = key.key {
            data.set("key", value);
        }
        data.set("created_by", key.created_by.unwrap_or_default());
        data.set_time("created_at", key.created_at);

        Ok(())
    }

    async fn update(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        if data.has_change("application_id") {
            data.restore("application_id");
            return Err(ProviderError::summary(
                "Updating ApplicationKey is not supported.",
            ));
        }

        self.read(ctx, data).await
    }

    async fn delete(&self, ctx: &ProviderContext, data: &ResourceData) -> Result<(), ProviderError> {
        let id = data.require_id()?;
        let application_id = data.get_string("application_id");

        match ctx.client.delete_application_key(&application_id, &id).await {
            Ok(()) => {
                info!(%id, "deleted application key");
                Ok(())
            },
            Err(e) if e.to_string().contains("Not Found") => {
                warn!(%id, "application key already removed");
                Ok(())
            },
            Err(e) => Err(api_error("Error deleting ApplicationKey:", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_splits_composite_id() {
        let state = ApplicationKeyResource.import("app-1/key-9").unwrap();
        assert_eq!(state, json!({"id": "key-9", "application_id": "app-1"}));
    }

    #[test]
    fn test_import_rejects_plain_id() {
        let err = ApplicationKeyResource.import("key-9").unwrap_err();
        assert!(err.to_string().contains("<application_id>/<key_id>"));
        assert!(ApplicationKeyResource.import("/key-9").is_err());
    }

    #[test]
    fn test_key_is_sensitive() {
        let schema = ApplicationKeyResource.schema();
        assert!(schema.block.attributes["key"].flags.sensitive);
        assert!(schema.block.attributes["application_id"].flags.required);
    }
}
