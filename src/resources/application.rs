//! `basistheory_application`

use serde_json::{json, Value};
use tracing::{debug, info};

use super::{set_audit, with_audit_attributes, AttributeReader, Resource, ResourceData};
use crate::client::models::{AccessRule, CreateApplicationRequest, UpdateApplicationRequest};
use crate::diagnostics::api_error;
use crate::error::ProviderError;
use crate::provider::ProviderContext;
use crate::schema::{Attribute, Block, NestedBlock, Schema, Validator};

const TYPE_NAME: &str = "basistheory_application";

/// Applications and their access rules.
pub struct ApplicationResource;

impl ApplicationResource {
    fn rules(data: &ResourceData) -> Vec<AccessRule> {
        data.get_blocks("rule")
            .iter()
            .map(|rule| AccessRule {
                description: rule.get_optional_string("description"),
                priority: rule.get_i64("priority"),
                container: rule.get_optional_string("container"),
                transform: rule.get_optional_string("transform"),
                permissions: rule.get_string_set("permissions"),
            })
            .collect()
    }

    fn flatten_rules(rules: &[AccessRule]) -> Value {
        Value::Array(
            rules
                .iter()
                .map(|rule| {
                    json!({
                        "description": rule.description.clone().unwrap_or_default(),
                        "priority": rule.priority,
                        "container": rule.container.clone().unwrap_or_default(),
                        "transform": rule.transform.clone().unwrap_or_default(),
                        "permissions": rule.permissions,
                    })
                })
                .collect(),
        )
    }
}

#[async_trait::async_trait]
impl Resource for ApplicationResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let rule = Block::new()
            .with_attribute(
                "description",
                Attribute::required_string()
                    .with_validator(Validator::uppercase_with("^[A-Z-_]+", "-_")),
            )
            .with_attribute(
                "priority",
                Attribute::required_int64().with_validator(Validator::at_least(1)),
            )
            .with_attribute("container", Attribute::required_string())
            .with_attribute(
                "transform",
                Attribute::required_string()
                    .with_validator(Validator::one_of(["mask", "redact", "reveal"])),
            )
            .with_attribute("permissions", Attribute::required_string_set());

        with_audit_attributes(Schema::new(1))
            .with_description("Application")
            .with_attribute("name", Attribute::required_string())
            .with_attribute(
                "type",
                Attribute::required_string()
                    .with_force_new()
                    .with_validator(Validator::one_of(["public", "private", "management"])),
            )
            .with_attribute("permissions", Attribute::optional_string_set())
            .with_attribute(
                "create_key",
                Attribute::optional_bool()
                    .with_default(json!(false))
                    .with_description("Whether to mint a key with the application. Write-once."),
            )
            .with_attribute("key", Attribute::computed_string().sensitive())
            .with_block("rule", NestedBlock::set(rule))
    }

    /// Version 0 states predate `create_key`; those applications were always
    /// created with a key.
    fn upgrade_state(&self, version: u64, state: Value) -> Result<Value, ProviderError> {
        if version >= 1 {
            return Ok(state);
        }
        let mut data = ResourceData::new(state)?;
        data.set("create_key", true);
        Ok(data.into_state())
    }

    async fn create(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let request = CreateApplicationRequest {
            name: data.get_string("name"),
            application_type: data.get_string("type"),
            permissions: data.get_string_set("permissions"),
            rules: Self::rules(data),
            create_key: Some(data.get_bool("create_key")),
        };

        let application = ctx
            .client
            .create_application(&request)
            .await
            .map_err(|e| api_error("Error creating Application:", e))?;

        info!(id = %application.id, "created application");
        data.set_id(application.id);
        if let Some(key) = application.keys.first().and_then(|k| k.key.clone()) {
            data.set("key", key);
        }

        self.read(ctx, data).await
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let id = data.require_id()?;
        debug!(%id, "reading application");

        let application = ctx
            .client
            .get_application(&id)
            .await
            .map_err(|e| api_error("Error reading Application:", e))?;

        data.set_id(application.id);
        // Keys are only returned when minted; a key already in state is kept.
        if let Some(key) = application.keys.first().and_then(|k| k.key.clone()) {
            data.set("key", key);
        }
        data.set("name", application.name.unwrap_or_default());
        data.set("type", application.application_type.unwrap_or_default());
        data.set("permissions", application.permissions);
        data.set("rule", Self::flatten_rules(&application.rules));
        set_audit(data, &application.audit);

        Ok(())
    }

    async fn update(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        if data.has_bool_change("create_key") {
            data.restore("create_key");
            return Err(ProviderError::summary(
                "Updating 'create_key' is not supported.",
            ));
        }

        let id = data.require_id()?;
        let request = UpdateApplicationRequest {
            name: data.get_string("name"),
            permissions: data.get_string_set("permissions"),
            rules: Self::rules(data),
        };

        ctx.client
            .update_application(&id, &request)
            .await
            .map_err(|e| api_error("Error updating Application:", e))?;
        info!(%id, "updated application");

        self.read(ctx, data).await
    }

    async fn delete(&self, ctx: &ProviderContext, data: &ResourceData) -> Result<(), ProviderError> {
        let id = data.require_id()?;
        ctx.client
            .delete_application(&id)
            .await
            .map_err(|e| api_error("Error deleting Application:", e))?;
        info!(%id, "deleted application");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate;

    #[test]
    fn test_schema_version_and_flags() {
        let schema = ApplicationResource.schema();
        assert_eq!(schema.version, 1);
        assert!(schema.block.attributes["type"].force_new);
        assert!(schema.block.attributes["key"].flags.sensitive);
        assert!(!schema.block.attributes["create_key"].force_new);
    }

    #[test]
    fn test_upgrade_from_v0_sets_create_key() {
        let state = json!({"id": "app-1", "name": "legacy", "type": "private"});
        let once = ApplicationResource.upgrade_state(0, state).unwrap();
        assert_eq!(once["create_key"], true);
        assert_eq!(once["name"], "legacy");

        let twice = ApplicationResource.upgrade_state(0, once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_upgrade_leaves_current_state_alone() {
        let state = json!({"id": "app-1", "create_key": false});
        assert_eq!(
            ApplicationResource.upgrade_state(1, state.clone()).unwrap(),
            state
        );
    }

    #[test]
    fn test_rule_validation_messages() {
        let schema = ApplicationResource.schema();
        let config = json!({
            "name": "app",
            "type": "private",
            "rule": [{
                "description": "lower",
                "priority": 0,
                "container": "/",
                "transform": "reveal",
                "permissions": ["token:read"]
            }]
        });

        let summaries: Vec<String> = validate(&schema, &config)
            .into_iter()
            .map(|d| d.summary)
            .collect();
        assert!(summaries.contains(
            &r#"expected value of description to match regular expression "^[A-Z-_]+", got lower"#
                .to_string()
        ));
        assert!(summaries.contains(&"expected priority to be at least (1), got 0".to_string()));
    }

    #[test]
    fn test_rules_round_trip_through_state() {
        let rules = vec![AccessRule {
            description: Some("READ_ALL".to_string()),
            priority: Some(1),
            container: Some("/pci/".to_string()),
            transform: Some("mask".to_string()),
            permissions: vec!["token:read".to_string()],
        }];

        let data =
            ResourceData::new(json!({ "rule": ApplicationResource::flatten_rules(&rules) })).unwrap();
        assert_eq!(ApplicationResource::rules(&data), rules);
    }
}
