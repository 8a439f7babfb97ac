//! Resource controllers.
//!
//! Each resource kind implements [`Resource`]: its schema, optional
//! pre-flight checks and state upgrades, and the Create/Read/Update/Delete
//! lifecycle. Controllers are stateless; identity flows through the `id`
//! attribute and credentials through the [`ProviderContext`].
//!
//! The lifecycle contract shared by all kinds:
//!
//! - Create sends the request built from the desired state, assigns the
//!   returned ID and finishes with a Read.
//! - Read overwrites every attribute the API reports.
//! - Update rejects changes to write-once attributes before any request,
//!   otherwise sends the update and finishes with a Read.
//! - Delete removes the remote object.

mod applepay_domain;
mod application;
mod application_key;
mod client_encryption_key;
pub mod data;
mod proxy;
mod reactor;
mod reactor_formula;
mod webhook;

pub use applepay_domain::ApplePayDomainResource;
pub use application::ApplicationResource;
pub use application_key::ApplicationKeyResource;
pub use client_encryption_key::ClientEncryptionKeyResource;
pub use data::{AttributeReader, BlockData, ResourceData};
pub use proxy::ProxyResource;
pub use reactor::ReactorResource;
pub use reactor_formula::ReactorFormulaResource;
pub use webhook::WebhookResource;

use std::sync::Arc;

use serde_json::Value;

use crate::client::models::Audit;
use crate::error::ProviderError;
use crate::provider::ProviderContext;
use crate::schema::{Attribute, Diagnostic, Schema};

/// A resource kind the provider manages.
#[async_trait::async_trait]
pub trait Resource: Send + Sync {
    /// Type name used in configuration, e.g. `basistheory_webhook`.
    fn type_name(&self) -> &'static str;

    /// Attribute schema of this kind.
    fn schema(&self) -> Schema;

    /// Checks beyond what the schema expresses. Run before any request.
    fn validate(&self, config: &ResourceData) -> Vec<Diagnostic> {
        let _ = config;
        Vec::new()
    }

    /// Migrate state written under an older schema version.
    fn upgrade_state(&self, version: u64, state: Value) -> Result<Value, ProviderError> {
        let _ = version;
        Ok(state)
    }

    /// State adopted for an import ID. The host reads it afterwards.
    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        Ok(ResourceData::from_id(id).into_state())
    }

    /// Create the remote object described by `data`.
    async fn create(&self, ctx: &ProviderContext, data: &mut ResourceData)
        -> Result<(), ProviderError>;

    /// Refresh `data` from the remote object.
    async fn read(&self, ctx: &ProviderContext, data: &mut ResourceData)
        -> Result<(), ProviderError>;

    /// Apply the planned state in `data` to the remote object.
    async fn update(&self, ctx: &ProviderContext, data: &mut ResourceData)
        -> Result<(), ProviderError>;

    /// Remove the remote object.
    async fn delete(&self, ctx: &ProviderContext, data: &ResourceData)
        -> Result<(), ProviderError>;
}

/// Every resource kind, in registration order.
pub fn all() -> Vec<Arc<dyn Resource>> {
    vec![
        Arc::new(ApplicationResource),
        Arc::new(ApplicationKeyResource),
        Arc::new(ReactorResource),
        Arc::new(ReactorFormulaResource),
        Arc::new(ProxyResource),
        Arc::new(WebhookResource),
        Arc::new(ClientEncryptionKeyResource),
        Arc::new(ApplePayDomainResource),
    ]
}

/// `id` plus the tenant and audit attributes every tenant-owned entity carries.
pub(crate) fn with_audit_attributes(schema: Schema) -> Schema {
    schema
        .with_attribute("id", Attribute::computed_string())
        .with_attribute("tenant_id", Attribute::computed_string())
        .with_attribute("created_by", Attribute::computed_string())
        .with_attribute("created_at", Attribute::computed_string())
        .with_attribute("modified_by", Attribute::computed_string())
        .with_attribute("modified_at", Attribute::computed_string())
}

/// Write the audit attributes of a response.
pub(crate) fn set_audit(data: &mut ResourceData, audit: &Audit) {
    data.set("tenant_id", audit.tenant_id.clone().unwrap_or_default());
    data.set("created_by", audit.created_by.clone().unwrap_or_default());
    data.set_time("created_at", audit.created_at);
    data.set("modified_by", audit.modified_by.clone().unwrap_or_default());
    data.set_time("modified_at", audit.modified_at);
}
