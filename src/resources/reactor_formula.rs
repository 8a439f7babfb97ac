//! `basistheory_reactor_formula`

use serde_json::{json, Value};
use tracing::{debug, info};

use super::{set_audit, with_audit_attributes, AttributeReader, Resource, ResourceData};
use crate::client::models::{
    ReactorFormulaConfiguration, ReactorFormulaRequest, ReactorFormulaRequestParameter,
};
use crate::diagnostics::api_error;
use crate::error::ProviderError;
use crate::provider::ProviderContext;
use crate::schema::{Attribute, Block, NestedBlock, Schema, Validator};

/// Reusable reactor code templates.
pub struct ReactorFormulaResource;

impl ReactorFormulaResource {
    fn request(data: &ResourceData) -> ReactorFormulaRequest {
        ReactorFormulaRequest {
            name: data.get_string("name"),
            description: data.get_optional_string("description"),
            formula_type: data.get_string("type"),
            icon: data.get_optional_string("icon"),
            code: data.get_string("code"),
            configuration: data
                .get_blocks("configuration")
                .iter()
                .map(|c| ReactorFormulaConfiguration {
                    name: c.get_string("name"),
                    description: c.get_optional_string("description"),
                    value_type: c.get_string("type"),
                })
                .collect(),
            request_parameters: data
                .get_blocks("request_parameter")
                .iter()
                .map(|p| ReactorFormulaRequestParameter {
                    name: p.get_string("name"),
                    description: p.get_optional_string("description"),
                    value_type: p.get_string("type"),
                    optional: p.get_bool("optional"),
                })
                .collect(),
        }
    }
}

#[async_trait::async_trait]
impl Resource for ReactorFormulaResource {
    fn type_name(&self) -> &'static str {
        "basistheory_reactor_formula"
    }

    fn schema(&self) -> Schema {
        let configuration = Block::new()
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_validator(Validator::uppercase_with("^[A-Z_]+", "_")),
            )
            .with_attribute("description", Attribute::optional_string())
            .with_attribute("type", Attribute::required_string());

        let request_parameter = Block::new()
            .with_attribute("name", Attribute::required_string())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute("type", Attribute::required_string())
            .with_attribute("optional", Attribute::optional_bool());

        with_audit_attributes(Schema::v0())
            .with_description("Reactor Formula")
            .with_attribute("name", Attribute::required_string())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute(
                "type",
                Attribute::required_string()
                    .with_validator(Validator::one_of(["official", "private"])),
            )
            .with_attribute("icon", Attribute::optional_string())
            .with_attribute("code", Attribute::required_string())
            .with_block("configuration", NestedBlock::set(configuration))
            .with_block("request_parameter", NestedBlock::set(request_parameter))
    }

    async fn create(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let formula = ctx
            .client
            .create_reactor_formula(&Self::request(data))
            .await
            .map_err(|e| api_error("Error creating Reactor Formula:", e))?;

        info!(id = %formula.id, "created reactor formula");
        data.set_id(formula.id);
        self.read(ctx, data).await
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let id = data.require_id()?;
        debug!(%id, "reading reactor formula");

        let formula = ctx
            .client
            .get_reactor_formula(&id)
            .await
            .map_err(|e| api_error("Error reading Reactor Formula:", e))?;

        data.set_id(formula.id);
        data.set("name", formula.name.unwrap_or_default());
        data.set("description", formula.description.unwrap_or_default());
        data.set("type", formula.formula_type.unwrap_or_default());
        data.set("icon", formula.icon.unwrap_or_default());
        data.set("code", formula.code.unwrap_or_default());
        data.set(
            "configuration",
            Value::Array(
                formula
                    .configuration
                    .iter()
                    .map(|c| {
                        json!({
                            "name": c.name,
                            "description": c.description.clone().unwrap_or_default(),
                            "type": c.value_type,
                        })
                    })
                    .collect(),
            ),
        );
        data.set(
            "request_parameter",
            Value::Array(
                formula
                    .request_parameters
                    .iter()
                    .map(|p| {
                        json!({
                            "name": p.name,
                            "description": p.description.clone().unwrap_or_default(),
                            "type": p.value_type,
                            "optional": p.optional,
                        })
                    })
                    .collect(),
            ),
        );
        set_audit(data, &formula.audit);

        Ok(())
    }

    async fn update(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let id = data.require_id()?;
        ctx.client
            .update_reactor_formula(&id, &Self::request(data))
            .await
            .map_err(|e| api_error("Error updating Reactor Formula:", e))?;
        info!(%id, "updated reactor formula");

        self.read(ctx, data).await
    }

    async fn delete(&self, ctx: &ProviderContext, data: &ResourceData) -> Result<(), ProviderError> {
        let id = data.require_id()?;
        ctx.client
            .delete_reactor_formula(&id)
            .await
            .map_err(|e| api_error("Error deleting Reactor Formula:", e))?;
        info!(%id, "deleted reactor formula");
        Ok(())
    }
}
