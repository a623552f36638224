//! apkforge Pipeline
//!
//! Turns a template project plus customization parameters into a signed
//! Android package.
//!
//! This crate contains:
//! - Leaf components: template materialization, asset download, template
//!   patching, toolchain invocation, signing material, artifact publication
//! - Build directory lifecycle and status derivation over the builds root
//! - The ordered stage list and the orchestrator running it
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use apkforge_core::domain::build::BuildParams;
//! use apkforge_pipeline::{HttpAssetFetcher, Pipeline, PipelineConfig, ProcessToolchain};
//!
//! # async fn demo() {
//! let pipeline = Pipeline::new(
//!     PipelineConfig::default(),
//!     Arc::new(ProcessToolchain::new()),
//!     Arc::new(HttpAssetFetcher::new()),
//! );
//!
//! let params = BuildParams {
//!     app_name: "Demo App".to_string(),
//!     app_url: "https://example.com".to_string(),
//!     logo_url: "https://example.com/icon.png".to_string(),
//!     package_id: "com.example.demo".to_string(),
//! };
//!
//! match pipeline.run(uuid::Uuid::new_v4(), params).await {
//!     Ok(outcome) => println!("Built {}", outcome.artifact_path.display()),
//!     Err(failure) => eprintln!("{}", failure),
//! }
//! # }
//! ```

pub mod archive;
pub mod artifact;
pub mod config;
pub mod context;
pub mod error;
pub mod fetch;
pub mod orchestrator;
pub mod patch;
pub mod signing;
pub mod stage;
pub mod status;
pub mod toolchain;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{PipelineConfig, TemplateSource};
pub use error::BuildError;
pub use fetch::{AssetFetcher, HttpAssetFetcher};
pub use orchestrator::{BuildFailure, BuildOutcome, Pipeline};
pub use status::{BuildRecord, StatusStore};
pub use toolchain::{ProcessToolchain, Toolchain};
pub use workspace::Workspace;
