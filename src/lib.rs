//! Basis Theory Provider
//!
//! An infrastructure-as-code provider that manages the configuration
//! resources of a Basis Theory tenant: applications and their keys, reactors
//! and reactor formulas, proxies, webhooks, client encryption keys and
//! Apple Pay domain registrations.
//!
//! # Overview
//!
//! - **ProviderService trait**: The host-facing surface (schema, configure,
//!   validate, plan, CRUD, import and state upgrades)
//! - **BasisTheoryProvider**: The implementation, dispatching by resource type
//! - **Resources**: One controller per resource type, mapping state to the API
//! - **Client**: A typed HTTP client for the Basis Theory management API
//! - **Diagnostics**: Translation of API failures into user-facing messages
//! - **Testing**: A harness that drives a provider the way a host does
//!
//! # Quick Start
//!
//! ```ignore
//! use basistheory_provider::{BasisTheoryProvider, testing::ProviderTester};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     basistheory_provider::init_logging();
//!
//!     let tester = ProviderTester::new(BasisTheoryProvider::new());
//!     tester.configure(json!({"api_key": "key_..."})).await?;
//!
//!     let state = tester
//!         .lifecycle_create(
//!             "basistheory_webhook",
//!             json!({
//!                 "name": "Orders",
//!                 "url": "https://example.com/hooks",
//!                 "events": ["token.created"]
//!             }),
//!         )
//!         .await?;
//!     println!("created webhook {}", state["id"]);
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! The provider block accepts `api_key`, `api_url` and `client_timeout`.
//! Each falls back to `BASISTHEORY_API_KEY`, `BASISTHEORY_API_URL` and
//! `BASISTHEORY_CLIENT_TIMEOUT` respectively, then to a built-in default.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod plan;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod service;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use config::{HostInfo, ProviderConfig};
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::{BasisTheoryProvider, ProviderContext};
pub use schema::ProviderSchema;
pub use service::ProviderService;
pub use types::{AttributeChange, ImportedResource, PlanResult, ProviderMetadata};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
