use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::comma_join;
use crate::types::ProjectReference;

/// Entry of the `pipelines` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineInfo {
    pub id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Build definition. Fields the client does not read are carried in
/// `extra` so a fetched definition can be sent back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildDefinition {
    pub id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectReference>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of queueing a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionReference {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A build as returned by `build/builds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<DefinitionReference>,
    #[serde(rename = "_links", default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Execution timeline of a build: stages, jobs and tasks as flat records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_id: Option<u32>,
    #[serde(default)]
    pub records: Vec<TimelineRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Timeline {
    /// Records of one kind ("Stage", "Job", "Task"), in execution order.
    pub fn records_of_type(&self, record_type: &str) -> Vec<&TimelineRecord> {
        let mut records: Vec<_> = self
            .records
            .iter()
            .filter(|r| r.record_type.as_deref() == Some(record_type))
            .collect();
        records.sort_by_key(|r| r.order.unwrap_or(u32::MAX));
        records
    }

    pub fn failed_records(&self) -> Vec<&TimelineRecord> {
        self.records
            .iter()
            .filter(|r| r.result.as_deref() == Some("failed"))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<LogReference>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogReference {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Repository ref a run checks out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResources {
    pub repositories: RunRepositories,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRepositories {
    #[serde(rename = "self")]
    pub self_repo: RepositoryRefName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryRefName {
    pub ref_name: String,
}

impl RunResources {
    pub fn for_ref(ref_name: impl Into<String>) -> Self {
        Self {
            repositories: RunRepositories {
                self_repo: RepositoryRefName {
                    ref_name: ref_name.into(),
                },
            },
        }
    }
}

/// Parameters of a pipeline run. Without resources the pipeline's own
/// default branch is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOptions {
    pub stages_to_skip: Vec<String>,
    pub resources: Option<RunResources>,
    pub template_parameters: IndexMap<String, Value>,
    pub variables: IndexMap<String, Value>,
}

/// Body of `POST pipelines/{id}/runs`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RunRequest<'a> {
    #[serde(skip_serializing_if = "no_stages")]
    pub stages_to_skip: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<&'a RunResources>,
    #[serde(skip_serializing_if = "no_entries")]
    pub template_parameters: &'a IndexMap<String, Value>,
    #[serde(skip_serializing_if = "no_entries")]
    pub variables: &'a IndexMap<String, Value>,
    pub preview_run: bool,
}

fn no_stages(stages: &&[String]) -> bool {
    stages.is_empty()
}

fn no_entries(map: &&IndexMap<String, Value>) -> bool {
    map.is_empty()
}

impl<'a> RunRequest<'a> {
    pub fn new(options: &'a RunOptions) -> Self {
        Self {
            stages_to_skip: &options.stages_to_skip,
            resources: options.resources.as_ref(),
            template_parameters: &options.template_parameters,
            variables: &options.variables,
            preview_run: false,
        }
    }
}

/// Filters of the `build/builds` query. Every set field becomes one query
/// parameter; list fields are sent comma-separated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildQuery {
    pub definitions: Option<Vec<u32>>,
    pub queues: Option<Vec<u32>>,
    pub build_number: Option<String>,
    pub min_time: Option<DateTime<Utc>>,
    pub max_time: Option<DateTime<Utc>>,
    pub requested_for: Option<String>,
    pub reason_filter: Option<String>,
    pub status_filter: Option<String>,
    pub result_filter: Option<String>,
    pub tag_filters: Option<Vec<String>>,
    pub properties: Option<Vec<String>>,
    pub top: Option<u32>,
    pub continuation_token: Option<String>,
    pub max_builds_per_definition: Option<u32>,
    pub deleted_filter: Option<String>,
    pub query_order: Option<String>,
    pub branch_name: Option<String>,
    pub build_ids: Option<Vec<u64>>,
    pub repository_id: Option<String>,
    pub repository_type: Option<String>,
}

impl BuildQuery {
    pub fn by_ids(build_ids: &[u64]) -> Self {
        Self {
            build_ids: Some(build_ids.to_vec()),
            ..Self::default()
        }
    }

    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();

        push_list(&mut query, "definitions", self.definitions.as_deref());
        push_list(&mut query, "queues", self.queues.as_deref());
        push_opt(&mut query, "buildNumber", self.build_number.as_ref());
        push_time(&mut query, "minTime", self.min_time);
        push_time(&mut query, "maxTime", self.max_time);
        push_opt(&mut query, "requestedFor", self.requested_for.as_ref());
        push_opt(&mut query, "reasonFilter", self.reason_filter.as_ref());
        push_opt(&mut query, "statusFilter", self.status_filter.as_ref());
        push_opt(&mut query, "resultFilter", self.result_filter.as_ref());
        push_list(&mut query, "tagFilters", self.tag_filters.as_deref());
        push_list(&mut query, "properties", self.properties.as_deref());
        push_opt(&mut query, "$top", self.top.as_ref());
        push_opt(&mut query, "continuationToken", self.continuation_token.as_ref());
        push_opt(&mut query, "maxBuildsPerDefinition", self.max_builds_per_definition.as_ref());
        push_opt(&mut query, "deletedFilter", self.deleted_filter.as_ref());
        push_opt(&mut query, "queryOrder", self.query_order.as_ref());
        push_opt(&mut query, "branchName", self.branch_name.as_ref());
        push_list(&mut query, "buildIds", self.build_ids.as_deref());
        push_opt(&mut query, "repositoryId", self.repository_id.as_ref());
        push_opt(&mut query, "repositoryType", self.repository_type.as_ref());

        query
    }
}

fn push_opt<T: ToString>(query: &mut Vec<(&'static str, String)>, name: &'static str, value: Option<&T>) {
    if let Some(value) = value {
        query.push((name, value.to_string()));
    }
}

fn push_list<T: std::fmt::Display>(
    query: &mut Vec<(&'static str, String)>,
    name: &'static str,
    values: Option<&[T]>,
) {
    if let Some(values) = values {
        query.push((name, comma_join(values)));
    }
}

fn push_time(query: &mut Vec<(&'static str, String)>, name: &'static str, value: Option<DateTime<Utc>>) {
    if let Some(value) = value {
        query.push((name, value.to_rfc3339_opts(SecondsFormat::Secs, true)));
    }
}
