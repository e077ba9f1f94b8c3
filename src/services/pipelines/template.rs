use serde_json::{json, Value};

use crate::services::repositories::Repository;

pub const DEFAULT_YAML_FILENAME: &str = ".azuredevops/pipeline-azure.yml";
pub const DEFAULT_BRANCH: &str = "refs/heads/master";
pub const DEFAULT_QUEUE: &str = "Default";

/// Settings of the build definition created for a repository.
///
/// Everything else in the payload is fixed: a batched CI trigger, ten days
/// of retention for branches and tags, one-hour job timeout and a clean
/// checkout without submodules or LFS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineTemplate {
    pub yaml_filename: String,
    pub default_branch: String,
    pub queue: String,
}

impl Default for PipelineTemplate {
    fn default() -> Self {
        Self {
            yaml_filename: DEFAULT_YAML_FILENAME.to_string(),
            default_branch: DEFAULT_BRANCH.to_string(),
            queue: DEFAULT_QUEUE.to_string(),
        }
    }
}

impl PipelineTemplate {
    /// Build definition body for `repository`, named after it.
    pub fn payload(&self, repository: &Repository) -> Value {
        json!({
            "variables": "",
            "triggers": [
                {
                    "branchFilters": [],
                    "pathFilters": [],
                    "settingsSourceType": 2,
                    "batchChanges": true,
                    "maxConcurrentBuildsPerBranch": 1,
                    "triggerType": "continuousIntegration"
                }
            ],
            "retentionRules": [
                {
                    "branches": ["+refs/heads/*", "+refs/tags/*"],
                    "daysToKeep": 10,
                    "minimumToKeep": 1,
                    "deleteBuildRecord": true,
                    "deleteTestResults": true
                }
            ],
            "queue": {
                "name": self.queue,
                "pool": { "name": self.queue }
            },
            "buildNumberFormat": "$(date:yyyyMMdd)$(rev:.r)",
            "jobAuthorizationScope": 1,
            "jobTimeoutInMinutes": 60,
            "jobCancelTimeoutInMinutes": 5,
            "process": {
                "yamlFilename": self.yaml_filename,
                "type": 2
            },
            "repository": {
                "properties": {
                    "safeRepository": repository.id,
                    "reportBuildStatus": true,
                    "fetchDepth": 0,
                    "cleanOptions": 3,
                    "gitLfsSupport": false,
                    "skipSyncSource": false,
                    "checkoutNestedSubmodules": false
                },
                "id": repository.id,
                "type": "TfsGit",
                "name": repository.id,
                "defaultBranch": self.default_branch,
                "clean": true,
                "checkoutSubmodules": false
            },
            "name": repository.name,
            "path": "\\",
            "type": 2,
            "project": {
                "id": repository.project.id
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repository() -> Repository {
        serde_json::from_value(json!({
            "id": "repo-1",
            "name": "azdo-tasks-tests",
            "project": {"id": "project-1", "name": "labs"}
        }))
        .unwrap()
    }

    #[test]
    fn test_default_payload() {
        let payload = PipelineTemplate::default().payload(&repository());

        assert_eq!(payload["name"], "azdo-tasks-tests");
        assert_eq!(payload["path"], "\\");
        assert_eq!(payload["project"]["id"], "project-1");
        assert_eq!(payload["repository"]["id"], "repo-1");
        assert_eq!(payload["repository"]["name"], "repo-1");
        assert_eq!(payload["repository"]["properties"]["safeRepository"], "repo-1");
        assert_eq!(payload["repository"]["defaultBranch"], "refs/heads/master");
        assert_eq!(payload["process"]["yamlFilename"], ".azuredevops/pipeline-azure.yml");
        assert_eq!(payload["queue"]["pool"]["name"], "Default");
        assert_eq!(payload["triggers"][0]["triggerType"], "continuousIntegration");
        assert_eq!(payload["retentionRules"][0]["daysToKeep"], 10);
        assert_eq!(payload["jobTimeoutInMinutes"], 60);
    }

    #[test]
    fn test_custom_template() {
        let template = PipelineTemplate {
            yaml_filename: "azure-pipelines.yml".to_string(),
            default_branch: "refs/heads/main".to_string(),
            queue: "Linux".to_string(),
        };
        let payload = template.payload(&repository());

        assert_eq!(payload["process"]["yamlFilename"], "azure-pipelines.yml");
        assert_eq!(payload["repository"]["defaultBranch"], "refs/heads/main");
        assert_eq!(payload["queue"]["name"], "Linux");
    }
}
