//! `basistheory_proxy`
//!
//! A proxy forwards traffic to `destination_url`, optionally passing requests
//! and responses through a reactor or a transform. A transform is either user
//! code or a mask rule; its shape is checked here before anything is sent,
//! since the API's own messages for a malformed transform are not actionable.

use serde_json::{json, Value};
use tracing::{debug, info};

use super::{
    set_audit, with_audit_attributes, AttributeReader, BlockData, Resource, ResourceData,
};
use crate::client::models::{ApplicationRef, ProxyRequest, ProxyTransform};
use crate::diagnostics::api_error;
use crate::error::ProviderError;
use crate::provider::ProviderContext;
use crate::schema::{Attribute, Block, Diagnostic, NestedBlock, Schema};

const TRANSFORM_BLOCKS: [&str; 2] = ["request_transform", "response_transform"];
const TRANSFORM_PROPERTIES: [&str; 5] = ["type", "code", "matcher", "expression", "replacement"];
const MASK_ONLY_PROPERTIES: [&str; 3] = ["matcher", "expression", "replacement"];
const MATCHERS: [&str; 2] = ["REGEX", "CHASE_STRATUS_PAN"];

/// Pre-flight check of one transform block.
pub fn validate_transform(transform: &BlockData) -> Result<(), String> {
    if let Some(unknown) = transform
        .keys()
        .find(|key| !TRANSFORM_PROPERTIES.contains(key))
    {
        return Err(format!("invalid transform property of: {}", unknown));
    }

    let set = |name: &str| transform.get_non_empty_string(name);

    match set("type").as_deref() {
        None => {
            if set("code").is_none() {
                return Err("code is required".to_string());
            }
            forbid_mask_properties(transform)
        },
        Some("CODE") => {
            if set("code").is_none() {
                return Err("code is required when type is CODE".to_string());
            }
            forbid_mask_properties(transform)
        },
        Some("MASK") => {
            if set("code").is_some() {
                return Err("code is not allowed when type is MASK".to_string());
            }
            let Some(matcher) = set("matcher") else {
                return Err("matcher is required when type is MASK".to_string());
            };
            if !MATCHERS.contains(&matcher.as_str()) {
                return Err(format!("invalid transform matcher: {}", matcher));
            }
            if matcher == "REGEX" && set("expression").is_none() {
                return Err("expression is required when matcher is REGEX".to_string());
            }
            if set("replacement").is_none() {
                return Err("replacement is required when type is MASK".to_string());
            }
            Ok(())
        },
        Some(other) => Err(format!("invalid transform type: {}", other)),
    }
}

fn forbid_mask_properties(transform: &BlockData) -> Result<(), String> {
    match MASK_ONLY_PROPERTIES
        .iter()
        .find(|name| transform.get_non_empty_string(name).is_some())
    {
        Some(name) => Err(format!("{} is not allowed when type is CODE", name)),
        None => Ok(()),
    }
}

/// Proxies and their transforms.
pub struct ProxyResource;

impl ProxyResource {
    fn transform(data: &ResourceData, name: &str) -> Option<ProxyTransform> {
        data.get_blocks(name).first().map(|t| ProxyTransform {
            transform_type: t.get_non_empty_string("type"),
            code: t.get_non_empty_string("code"),
            matcher: t.get_non_empty_string("matcher"),
            expression: t.get_non_empty_string("expression"),
            replacement: t.get_non_empty_string("replacement"),
        })
    }

    fn flatten_transform(transform: Option<ProxyTransform>) -> Value {
        match transform {
            Some(t) => json!([{
                "type": t.transform_type.unwrap_or_default(),
                "code": t.code.unwrap_or_default(),
                "matcher": t.matcher.unwrap_or_default(),
                "expression": t.expression.unwrap_or_default(),
                "replacement": t.replacement.unwrap_or_default(),
            }]),
            None => json!([]),
        }
    }

    fn check_transforms(data: &ResourceData) -> Result<(), ProviderError> {
        let diagnostics = ProxyResource.validate(data);
        if diagnostics.is_empty() {
            Ok(())
        } else {
            Err(ProviderError::Diagnostics(diagnostics))
        }
    }

    fn request(data: &ResourceData) -> ProxyRequest {
        ProxyRequest {
            name: data.get_string("name"),
            destination_url: data.get_string("destination_url"),
            request_reactor_id: data.get_non_empty_string("request_reactor_id"),
            response_reactor_id: data.get_non_empty_string("response_reactor_id"),
            request_transform: Self::transform(data, "request_transform"),
            response_transform: Self::transform(data, "response_transform"),
            application: data
                .get_non_empty_string("application_id")
                .map(|id| ApplicationRef { id }),
            configuration: data.get_string_map("configuration"),
            require_auth: data.get_bool_or("require_auth", true),
        }
    }
}

#[async_trait::async_trait]
impl Resource for ProxyResource {
    fn type_name(&self) -> &'static str {
        "basistheory_proxy"
    }

    fn schema(&self) -> Schema {
        let transform = || {
            let block = TRANSFORM_PROPERTIES
                .iter()
                .fold(Block::new(), |block, name| {
                    block.with_attribute(*name, Attribute::optional_string())
                });
            NestedBlock::set(block).with_max_items(1)
        };

        with_audit_attributes(Schema::v0())
            .with_description("Proxy")
            .with_attribute("key", Attribute::computed_string().sensitive())
            .with_attribute("name", Attribute::required_string())
            .with_attribute("destination_url", Attribute::required_string())
            .with_attribute("request_reactor_id", Attribute::optional_string())
            .with_attribute("response_reactor_id", Attribute::optional_string())
            .with_attribute("application_id", Attribute::optional_string())
            .with_attribute("configuration", Attribute::optional_string_map().sensitive())
            .with_attribute(
                "require_auth",
                Attribute::optional_bool().with_default(json!(true)),
            )
            .with_block("request_transform", transform())
            .with_block("response_transform", transform())
    }

    fn validate(&self, config: &ResourceData) -> Vec<Diagnostic> {
        TRANSFORM_BLOCKS
            .iter()
            .flat_map(|name| {
                config
                    .get_blocks(name)
                    .into_iter()
                    .filter_map(move |t| validate_transform(&t).err().map(|m| (name, m)))
            })
            .map(|(name, message)| Diagnostic::error(message).with_attribute(*name))
            .collect()
    }

    async fn create(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        Self::check_transforms(data)?;

        let proxy = ctx
            .client
            .create_proxy(&Self::request(data))
            .await
            .map_err(|e| api_error("Error creating Proxy:", e))?;

        info!(id = %proxy.id, "created proxy");
        data.set_id(proxy.id);
        self.read(ctx, data).await
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let id = data.require_id()?;
        debug!(%id, "reading proxy");

        let proxy = ctx
            .client
            .get_proxy(&id)
            .await
            .map_err(|e| api_error("Error reading Proxy:", e))?;

        data.set_id(proxy.id);
        data.set("key", proxy.key.unwrap_or_default());
        data.set("name", proxy.name.unwrap_or_default());
        data.set("destination_url", proxy.destination_url.unwrap_or_default());
        data.set(
            "request_reactor_id",
            proxy.request_reactor_id.unwrap_or_default(),
        );
        data.set(
            "response_reactor_id",
            proxy.response_reactor_id.unwrap_or_default(),
        );
        data.set(
            "request_transform",
            Self::flatten_transform(proxy.request_transform),
        );
        data.set(
            "response_transform",
            Self::flatten_transform(proxy.response_transform),
        );
        data.set(
            "application_id",
            proxy.application.map(|a| a.id).unwrap_or_default(),
        );
        data.set("configuration", serde_json::to_value(&proxy.configuration)?);
        data.set("require_auth", proxy.require_auth.unwrap_or(true));
        set_audit(data, &proxy.audit);

        Ok(())
    }

    async fn update(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        Self::check_transforms(data)?;

        let id = data.require_id()?;
        ctx.client
            .update_proxy(&id, &Self::request(data))
            .await
            .map_err(|e| api_error("Error updating Proxy:", e))?;
        info!(%id, "updated proxy");

        self.read(ctx, data).await
    }

    async fn delete(&self, ctx: &ProviderContext, data: &ResourceData) -> Result<(), ProviderError> {
        let id = data.require_id()?;
        ctx.client
            .delete_proxy(&id)
            .await
            .map_err(|e| api_error("Error deleting Proxy:", e))?;
        info!(%id, "deleted proxy");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform(value: Value) -> BlockData {
        BlockData(value.as_object().cloned().unwrap())
    }

    fn check(value: Value) -> Result<(), String> {
        validate_transform(&transform(value))
    }

    #[test]
    fn test_code_transform() {
        assert!(check(json!({"code": "module.exports = async (req) => req"})).is_ok());
        assert!(check(json!({"type": "CODE", "code": "x"})).is_ok());
        assert_eq!(check(json!({})).unwrap_err(), "code is required");
        assert_eq!(check(json!({"code": ""})).unwrap_err(), "code is required");
        assert_eq!(
            check(json!({"type": "CODE"})).unwrap_err(),
            "code is required when type is CODE"
        );
        assert_eq!(
            check(json!({"type": "CODE", "code": "x", "matcher": "REGEX"})).unwrap_err(),
            "matcher is not allowed when type is CODE"
        );
    }

    #[test]
    fn test_mask_transform() {
        assert!(check(json!({
            "type": "MASK",
            "matcher": "REGEX",
            "expression": "(.*)",
            "replacement": "*"
        }))
        .is_ok());
        assert!(check(json!({
            "type": "MASK",
            "matcher": "CHASE_STRATUS_PAN",
            "replacement": "*"
        }))
        .is_ok());

        assert_eq!(
            check(json!({"type": "MASK"})).unwrap_err(),
            "matcher is required when type is MASK"
        );
        assert_eq!(
            check(json!({"type": "MASK", "matcher": "LUHN"})).unwrap_err(),
            "invalid transform matcher: LUHN"
        );
        assert_eq!(
            check(json!({"type": "MASK", "matcher": "REGEX", "replacement": "*"})).unwrap_err(),
            "expression is required when matcher is REGEX"
        );
        assert_eq!(
            check(json!({"type": "MASK", "matcher": "REGEX", "expression": "(.*)"})).unwrap_err(),
            "replacement is required when type is MASK"
        );
        assert_eq!(
            check(json!({"type": "MASK", "code": "x"})).unwrap_err(),
            "code is not allowed when type is MASK"
        );
    }

    #[test]
    fn test_unknown_property_and_type() {
        assert_eq!(
            check(json!({"code": "x", "language": "js"})).unwrap_err(),
            "invalid transform property of: language"
        );
        assert_eq!(
            check(json!({"type": "TOKENIZE"})).unwrap_err(),
            "invalid transform type: TOKENIZE"
        );
    }

    #[test]
    fn test_validate_reports_block_name() {
        let data = ResourceData::new(json!({
            "name": "proxy",
            "destination_url": "https://echo.example.com",
            "response_transform": [{"type": "MASK"}]
        }))
        .unwrap();

        let diags = ProxyResource.validate(&data);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].summary, "matcher is required when type is MASK");
        assert_eq!(diags[0].attribute.as_deref(), Some("response_transform"));
    }

    #[test]
    fn test_request_defaults_require_auth() {
        let data = ResourceData::new(json!({
            "name": "proxy",
            "destination_url": "https://echo.example.com",
            "request_transform": [{"code": "x", "matcher": ""}]
        }))
        .unwrap();

        let request = ProxyResource::request(&data);
        assert!(request.require_auth);
        assert_eq!(
            request.request_transform,
            Some(ProxyTransform {
                code: Some("x".to_string()),
                ..Default::default()
            })
        );
        assert!(request.response_transform.is_none());
    }
}
