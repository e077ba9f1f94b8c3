//! Typed client for the Azure DevOps REST API.
//!
//! Every service wraps a shared [`AzureClient`] and maps one method to one
//! REST call, optionally followed by a lookup (for example finding the
//! pipeline that builds a given repository).
//!
//! ```no_run
//! # async fn demo() -> azdo::Result<()> {
//! use azdo::{AzureClient, PipelineService, RepositoryKey, Token};
//!
//! let client = AzureClient::new(Some(Token::from("my-pat")))?;
//! let pipelines = PipelineService::new(client);
//! let key = RepositoryKey::new("alelltech", "labs", "azdo-tasks-tests");
//! if let Some(pipeline) = pipelines.get_by_repo_name(&key).await? {
//!     println!("{} ({})", pipeline.name, pipeline.id);
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod services;
pub mod types;

pub use auth::Token;
pub use client::AzureClient;
pub use error::{AzdoError, Result};
pub use services::*;
pub use types::{ListResult, ProjectKey, ProjectReference, RepositoryKey};
