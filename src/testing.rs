//! Host-side harness for provider tests.
//!
//! [`ProviderTester`] plays the host: it drives a [`ProviderService`] through
//! the same plan/apply/read sequences a real host would, so lifecycle tests
//! need nothing but a provider and (usually) a mock API.
//!
//! # Example
//!
//! ```ignore
//! use basistheory_provider::testing::ProviderTester;
//! use basistheory_provider::BasisTheoryProvider;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_create_webhook() {
//!     let tester = ProviderTester::new(BasisTheoryProvider::new());
//!     tester.configure(json!({"api_key": "key_test", "api_url": mock_url})).await.unwrap();
//!
//!     let state = tester.lifecycle_create("basistheory_webhook", json!({
//!         "name": "hook",
//!         "url": "https://example.com/hook",
//!         "events": ["token:created"]
//!     })).await.unwrap();
//!
//!     assert_eq!(state["name"], "hook");
//! }
//! ```

use serde_json::Value;

use crate::error::ProviderError;
use crate::schema::{Diagnostic, ProviderSchema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult};

/// Drives a [`ProviderService`] the way a host does.
///
/// Calls that answer with diagnostics (`configure`, the validators) turn
/// error diagnostics into [`TestError::Diagnostics`]; everything else returns
/// the provider's own result.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Wrap `provider`.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The wrapped provider, for calls the harness does not wrap.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Full provider schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Resource type names, sorted.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    /// Check the provider block.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        check_diagnostics(self.provider.validate_provider_config(config).await?)
    }

    /// Configure the provider; error diagnostics fail the call.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        check_diagnostics(self.provider.configure(config).await?)
    }

    /// Run schema validators and pre-flight checks on a resource config.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        check_diagnostics(
            self.provider
                .validate_resource_config(resource_type, config)
                .await?,
        )
    }

    /// Plan with no prior state.
    pub async fn plan_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider.plan(resource_type, None, config).await
    }

    /// Plan `config` against existing state.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), config)
            .await
    }

    /// Plan removal of existing state.
    pub async fn plan_delete(
        &self,
        resource_type: &str,
        prior_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), Value::Null)
            .await
    }

    /// Apply a create plan.
    pub async fn create(&self, resource_type: &str, planned: Value) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned).await
    }

    /// Refresh state from the API.
    pub async fn read(&self, resource_type: &str, state: Value) -> Result<Value, ProviderError> {
        self.provider.read(resource_type, state).await
    }

    /// Apply an update plan.
    pub async fn update(
        &self,
        resource_type: &str,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.update(resource_type, prior, planned).await
    }

    /// Remove the object behind `state`.
    pub async fn delete(&self, resource_type: &str, state: Value) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, state).await
    }

    /// Turn an import ID into initial state.
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    // =========================================================================
    // Host sequences
    // =========================================================================

    /// Plan, create, then refresh. Returns the refreshed state.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let planned = self.plan_create(resource_type, config).await?.planned_state;
        let state = self.create(resource_type, planned).await?;
        self.read(resource_type, state).await
    }

    /// Import, then refresh every imported object.
    pub async fn lifecycle_import(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<Value>, ProviderError> {
        let mut states = Vec::new();
        for imported in self.import_resource(resource_type, id).await? {
            states.push(self.read(&imported.resource_type, imported.state).await?);
        }
        Ok(states)
    }

    /// Plan, update, then refresh. Returns the refreshed state.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior: Value,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let planned = self
            .plan_update(resource_type, prior.clone(), config)
            .await?
            .planned_state;
        let state = self.update(resource_type, prior, planned).await?;
        self.read(resource_type, state).await
    }

    /// Plan removal, then delete.
    pub async fn lifecycle_delete(
        &self,
        resource_type: &str,
        state: Value,
    ) -> Result<(), ProviderError> {
        self.plan_delete(resource_type, state.clone()).await?;
        self.delete(resource_type, state).await
    }

    /// Create, update to `updated`, then delete. Returns the state between
    /// update and delete.
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        initial: Value,
        updated: Value,
    ) -> Result<Value, ProviderError> {
        let created = self.lifecycle_create(resource_type, initial).await?;
        let state = self.lifecycle_update(resource_type, created, updated).await?;
        self.lifecycle_delete(resource_type, state.clone()).await?;
        Ok(state)
    }
}

/// Failure of a harness call that reports diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum TestError {
    /// The provider answered with error diagnostics.
    #[error("{}", render(.0))]
    Diagnostics(Vec<Diagnostic>),
    /// The call itself failed.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
}

fn render(diagnostics: &[Diagnostic]) -> String {
    let mut out = format!("{} error diagnostic(s):", diagnostics.len());
    for diag in diagnostics {
        out.push_str("\n  ");
        out.push_str(&diag.summary);
        if let Some(detail) = &diag.detail {
            out.push_str(" | ");
            out.push_str(detail);
        }
        if let Some(attribute) = &diag.attribute {
            out.push_str(" @ ");
            out.push_str(attribute);
        }
    }
    out
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors = errors(&diagnostics);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors.into_iter().cloned().collect()))
    }
}

fn errors(diagnostics: &[Diagnostic]) -> Vec<&Diagnostic> {
    diagnostics.iter().filter(|d| d.is_error()).collect()
}

fn summaries<'a>(diagnostics: impl IntoIterator<Item = &'a Diagnostic>) -> Vec<&'a str> {
    diagnostics.into_iter().map(|d| d.summary.as_str()).collect()
}

fn changed_paths(plan: &PlanResult) -> Vec<&str> {
    plan.changes.iter().map(|c| c.path.as_str()).collect()
}

// =========================================================================
// Assertion Helpers
// =========================================================================
//
// Each helper panics with the offending plan or diagnostics in the message.

/// The plan creates a new object: it has changes and no replacement.
pub fn assert_plan_creates(plan: &PlanResult) {
    assert!(!plan.changes.is_empty(), "create plan has no changes");
    assert!(!plan.requires_replace, "create plan asks for replacement");
}

/// The plan changes nothing.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.changes.is_empty(),
        "plan drifted on {:?}",
        changed_paths(plan)
    );
}

/// The plan changes something.
pub fn assert_plan_has_changes(plan: &PlanResult) {
    assert!(!plan.changes.is_empty(), "plan has no changes");
}

/// The plan replaces the object.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(
        plan.requires_replace,
        "plan updates {:?} in place, expected replacement",
        changed_paths(plan)
    );
}

/// The plan updates the object in place.
pub fn assert_plan_updates_in_place(plan: &PlanResult) {
    assert!(
        !plan.requires_replace,
        "plan replaces the object because of {:?}",
        changed_paths(plan)
    );
}

/// The plan changes `path`.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    let paths = changed_paths(plan);
    assert!(
        paths.contains(&path),
        "plan leaves {:?} unchanged; changes: {:?}",
        path,
        paths
    );
}

/// The plan leaves `path` alone.
pub fn assert_plan_does_not_change_attribute(plan: &PlanResult, path: &str) {
    assert!(
        !changed_paths(plan).contains(&path),
        "plan unexpectedly changes {:?}",
        path
    );
}

/// No diagnostic is an error.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors = errors(diagnostics);
    assert!(
        errors.is_empty(),
        "unexpected error diagnostics: {:?}",
        summaries(errors)
    );
}

/// At least one diagnostic is an error.
pub fn assert_has_errors(diagnostics: &[Diagnostic]) {
    assert!(
        !errors(diagnostics).is_empty(),
        "no error diagnostics in {:?}",
        summaries(diagnostics)
    );
}

/// Some error diagnostic's summary contains `substring`.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let errors = errors(diagnostics);
    assert!(
        errors.iter().any(|d| d.summary.contains(substring)),
        "no error diagnostic contains {:?}; errors: {:?}",
        substring,
        summaries(errors)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, Schema};
    use crate::types::AttributeChange;
    use serde_json::json;

    /// Keeps state in the plan and echoes it back, assigning a fixed ID.
    struct EchoProvider;

    #[async_trait::async_trait]
    impl ProviderService for EchoProvider {
        fn schema(&self) -> ProviderSchema {
            ProviderSchema::new()
                .with_provider_config(
                    Schema::v0().with_attribute("api_key", Attribute::optional_string()),
                )
                .with_resource(
                    "echo_resource",
                    Schema::v0()
                        .with_attribute("name", Attribute::required_string())
                        .with_attribute("id", Attribute::computed_string()),
                )
        }

        async fn configure(&self, _config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
            Ok(vec![])
        }

        async fn validate_resource_config(
            &self,
            _resource_type: &str,
            config: Value,
        ) -> Result<Vec<Diagnostic>, ProviderError> {
            if config.get("name").is_some() {
                Ok(vec![])
            } else {
                Ok(vec![Diagnostic::error("Missing required attribute 'name'")])
            }
        }

        async fn plan(
            &self,
            _resource_type: &str,
            prior_state: Option<Value>,
            config: Value,
        ) -> Result<PlanResult, ProviderError> {
            match prior_state {
                None => {
                    let mut planned = config.clone();
                    if let Value::Object(ref mut map) = planned {
                        map.insert("id".to_string(), json!("echo-1"));
                    }
                    Ok(PlanResult::with_changes(
                        planned,
                        vec![AttributeChange::added("name", config["name"].clone())],
                        false,
                    ))
                },
                Some(prior) if config.is_null() => Ok(PlanResult::with_changes(
                    Value::Null,
                    vec![AttributeChange::removed("name", prior["name"].clone())],
                    false,
                )),
                Some(prior) if prior.get("name") != config.get("name") => {
                    let mut planned = config.clone();
                    if let Value::Object(ref mut map) = planned {
                        map.insert("id".to_string(), prior["id"].clone());
                    }
                    Ok(PlanResult::with_changes(
                        planned,
                        vec![AttributeChange::modified(
                            "name",
                            prior["name"].clone(),
                            config["name"].clone(),
                        )],
                        false,
                    ))
                },
                Some(prior) => Ok(PlanResult::no_change(prior)),
            }
        }

        async fn create(
            &self,
            _resource_type: &str,
            planned_state: Value,
        ) -> Result<Value, ProviderError> {
            Ok(planned_state)
        }

        async fn read(
            &self,
            _resource_type: &str,
            current_state: Value,
        ) -> Result<Value, ProviderError> {
            let mut state = current_state;
            if state.get("name").is_none() {
                state["name"] = json!("imported");
            }
            Ok(state)
        }

        async fn update(
            &self,
            _resource_type: &str,
            _prior_state: Value,
            planned_state: Value,
        ) -> Result<Value, ProviderError> {
            Ok(planned_state)
        }

        async fn delete(
            &self,
            _resource_type: &str,
            _current_state: Value,
        ) -> Result<(), ProviderError> {
            Ok(())
        }

        async fn import_resource(
            &self,
            resource_type: &str,
            id: &str,
        ) -> Result<Vec<ImportedResource>, ProviderError> {
            Ok(vec![ImportedResource::new(resource_type, json!({"id": id}))])
        }
    }

    #[tokio::test]
    async fn test_tester_configure_and_schema() {
        let tester = ProviderTester::new(EchoProvider);
        assert!(tester.configure(json!({"api_key": "test"})).await.is_ok());
        assert!(tester.schema().resources.contains_key("echo_resource"));
        assert_eq!(tester.resource_types(), vec!["echo_resource".to_string()]);
    }

    #[tokio::test]
    async fn test_tester_validate_resource_config() {
        let tester = ProviderTester::new(EchoProvider);
        assert!(tester
            .validate_resource_config("echo_resource", json!({"name": "a"}))
            .await
            .is_ok());

        match tester
            .validate_resource_config("echo_resource", json!({}))
            .await
        {
            Err(TestError::Diagnostics(diags)) => {
                assert_error_contains(&diags, "Missing required attribute")
            },
            other => panic!("expected diagnostics, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tester_plans() {
        let tester = ProviderTester::new(EchoProvider);

        let plan = tester
            .plan_create("echo_resource", json!({"name": "test"}))
            .await
            .unwrap();
        assert_plan_creates(&plan);
        assert_eq!(plan.planned_state["id"], "echo-1");

        let prior = json!({"name": "old", "id": "echo-1"});
        let plan = tester
            .plan_update("echo_resource", prior.clone(), json!({"name": "new"}))
            .await
            .unwrap();
        assert_plan_changes_attribute(&plan, "name");
        assert_plan_updates_in_place(&plan);

        let plan = tester
            .plan_update("echo_resource", prior.clone(), json!({"name": "old"}))
            .await
            .unwrap();
        assert_plan_no_changes(&plan);

        let plan = tester.plan_delete("echo_resource", prior).await.unwrap();
        assert!(plan.planned_state.is_null());
    }

    #[tokio::test]
    async fn test_tester_lifecycle_crud() {
        let tester = ProviderTester::new(EchoProvider);
        let final_state = tester
            .lifecycle_crud(
                "echo_resource",
                json!({"name": "initial"}),
                json!({"name": "updated"}),
            )
            .await
            .unwrap();

        assert_eq!(final_state["name"], "updated");
        assert_eq!(final_state["id"], "echo-1");
    }

    #[tokio::test]
    async fn test_tester_lifecycle_import_reads_back() {
        let tester = ProviderTester::new(EchoProvider);
        let states = tester
            .lifecycle_import("echo_resource", "remote-7")
            .await
            .unwrap();

        assert_eq!(states, vec![json!({"id": "remote-7", "name": "imported"})]);
    }

    #[test]
    fn test_assert_no_errors() {
        let diagnostics = vec![Diagnostic::warning("Just a warning")];
        assert_no_errors(&diagnostics);
    }

    #[test]
    #[should_panic(expected = "unexpected error diagnostics")]
    fn test_assert_no_errors_fails() {
        let diagnostics = vec![Diagnostic::error("An error")];
        assert_no_errors(&diagnostics);
    }

    #[test]
    fn test_assert_has_errors() {
        let diagnostics = vec![Diagnostic::error("An error")];
        assert_has_errors(&diagnostics);
    }

    #[test]
    fn test_assert_plan_replaces() {
        let plan = PlanResult::with_changes(
            json!({}),
            vec![AttributeChange::modified("type", json!("private"), json!("public"))],
            true,
        );
        assert_plan_replaces(&plan);
        assert_plan_has_changes(&plan);
        assert_plan_does_not_change_attribute(&plan, "name");
    }

    #[test]
    fn test_test_error_display() {
        let err = TestError::Diagnostics(vec![
            Diagnostic::error("First error").with_attribute("field1"),
            Diagnostic::error("Second error").with_detail("More info"),
        ]);

        let display = format!("{}", err);
        assert!(display.contains("First error"));
        assert!(display.contains("Second error"));
        assert!(display.contains("field1"));
        assert!(display.contains("More info"));
    }
}
