pub mod entitlements;
pub mod organizations;
pub mod pipelines;
pub mod repositories;
pub mod service_connections;
pub mod variable_groups;

pub use entitlements::{EntitlementQuery, EntitlementsService, PagedUserEntitlements, UserEntitlement};
pub use organizations::{OrganizationService, TeamProject};
pub use pipelines::{BuildQuery, PipelineService, PipelineTemplate, RunOptions};
pub use repositories::{GitPush, Repository, RepositoryService};
pub use service_connections::{ServiceConnectionQuery, ServiceConnectionService, ServiceEndpoint};
pub use variable_groups::{VariableGroup, VariableGroupService};
