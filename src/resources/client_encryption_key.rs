//! `basistheory_client_encryption_key`

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::data::format_time;
use super::{AttributeReader, Resource, ResourceData};
use crate::client::models::CreateClientEncryptionKeyRequest;
use crate::diagnostics::api_error;
use crate::error::ProviderError;
use crate::provider::ProviderContext;
use crate::schema::{Attribute, Diagnostic, Schema};

/// Keys clients use to encrypt data before it reaches the tenant.
///
/// A key is never modified; a new expiry replaces the key.
pub struct ClientEncryptionKeyResource;

fn parse_expires_at(raw: &str) -> Result<DateTime<Utc>, ProviderError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            ProviderError::diagnostic(
                Diagnostic::error(format!(
                    "Error parsing expires_at: {:?} is not an RFC 3339 timestamp",
                    raw
                ))
                .with_detail(e.to_string())
                .with_attribute("expires_at"),
            )
        })
}

#[async_trait::async_trait]
impl Resource for ClientEncryptionKeyResource {
    fn type_name(&self) -> &'static str {
        "basistheory_client_encryption_key"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("Client Encryption Key")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "expires_at",
                Attribute::optional_string()
                    .with_force_new()
                    .with_description("RFC 3339 expiry."),
            )
            .with_attribute("public_key_pem", Attribute::computed_string())
    }

    async fn create(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let expires_at = data
            .get_non_empty_string("expires_at")
            .map(|raw| parse_expires_at(&raw))
            .transpose()?;

        let key = ctx
            .client
            .create_client_encryption_key(&CreateClientEncryptionKeyRequest { expires_at })
            .await
            .map_err(|e| api_error("Error creating Client Encryption Key:", e))?;

        info!(id = %key.id, "created client encryption key");
        data.set_id(key.id);
        self.read(ctx, data).await
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let id = data.require_id()?;
        debug!(%id, "reading client encryption key");

        let key = ctx
            .client
            .get_client_encryption_key(&id)
            .await
            .map_err(|e| api_error("Error reading Client Encryption Key:", e))?;

        data.set_id(key.id);
        data.set("public_key_pem", key.public_key_pem.unwrap_or_default());

        // The configured spelling wins when it names the same instant.
        let configured = data
            .get_non_empty_string("expires_at")
            .and_then(|raw| parse_expires_at(&raw).ok());
        if configured != key.expires_at {
            data.set("expires_at", format_time(key.expires_at));
        }

        Ok(())
    }

    async fn update(
        &self,
        _ctx: &ProviderContext,
        _data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        Err(ProviderError::summary(
            "Updating Client Encryption Key is not supported.",
        ))
    }

    async fn delete(&self, ctx: &ProviderContext, data: &ResourceData) -> Result<(), ProviderError> {
        let id = data.require_id()?;
        ctx.client
            .delete_client_encryption_key(&id)
            .await
            .map_err(|e| api_error("Error deleting Client Encryption Key:", e))?;
        info!(%id, "deleted client encryption key");
        Ok(())
    }
}
