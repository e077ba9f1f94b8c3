use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::ProjectReference;

/// Git repository as returned by the `git/repositories` endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub id: String,
    pub name: String,
    pub project: ProjectReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_disabled: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// File or folder metadata, with content when requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitItem {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_object_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A push: ref updates plus the commits that produce them.
///
/// Used both as the request body and the response of the `pushes` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitPush {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_id: Option<u64>,
    #[serde(default)]
    pub ref_updates: Vec<GitRefUpdate>,
    #[serde(default)]
    pub commits: Vec<GitCommit>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GitPush {
    /// Builds a push committing `content` to `path` on top of `old_object_id`.
    pub fn edit_file(
        branch: &str,
        old_object_id: &str,
        path: &str,
        content: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            push_id: None,
            ref_updates: vec![GitRefUpdate {
                name: branch_ref(branch),
                old_object_id: Some(old_object_id.to_string()),
                new_object_id: None,
                extra: Map::new(),
            }],
            commits: vec![GitCommit {
                comment: Some(comment.into()),
                commit_id: None,
                changes: vec![GitChange {
                    change_type: ChangeType::Edit,
                    item: GitChangeItem {
                        path: path.to_string(),
                        extra: Map::new(),
                    },
                    new_content: Some(NewContent {
                        content: content.into(),
                        content_type: ContentType::RawText,
                    }),
                    extra: Map::new(),
                }],
                extra: Map::new(),
            }],
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitRefUpdate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_object_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_object_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitCommit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<GitChange>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitChange {
    pub change_type: ChangeType,
    pub item: GitChangeItem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_content: Option<NewContent>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitChangeItem {
    pub path: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContent {
    pub content: String,
    pub content_type: ContentType,
}

/// Kind of a change. Values outside the known set (`sourceRename`,
/// `edit, rename`, ...) are kept verbatim and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeType {
    Add,
    Edit,
    Delete,
    Rename,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentType {
    RawText,
    Base64Encoded,
}

/// Expands a short branch name to a full ref; full refs pass through.
pub fn branch_ref(branch: &str) -> String {
    if branch.starts_with("refs/") {
        branch.to_string()
    } else {
        format!("refs/heads/{branch}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_branch_ref() {
        assert_eq!(branch_ref("master"), "refs/heads/master");
        assert_eq!(branch_ref("refs/tags/v1"), "refs/tags/v1");
    }

    #[test]
    fn test_edit_file_push_body() {
        let push = GitPush::edit_file(
            "master",
            "abc123",
            "/catalog-info.yaml",
            "# updated",
            "Repository push test",
        );

        assert_eq!(
            serde_json::to_value(&push).unwrap(),
            json!({
                "refUpdates": [{"name": "refs/heads/master", "oldObjectId": "abc123"}],
                "commits": [{
                    "comment": "Repository push test",
                    "changes": [{
                        "changeType": "edit",
                        "item": {"path": "/catalog-info.yaml"},
                        "newContent": {"content": "# updated", "contentType": "rawText"}
                    }]
                }]
            })
        );
    }

    #[test]
    fn test_repository_deserializes_api_shape() {
        let repo: Repository = serde_json::from_value(json!({
            "id": "5febef5a-833d-4e14-b9c0-14cb638f91e6",
            "name": "azdo-tasks-tests",
            "url": "https://dev.azure.com/alelltech/_apis/git/repositories/5febef5a",
            "project": {"id": "6ce954b1-ce1f-45d1-b94d-e6bf2464ba2c", "name": "labs"},
            "defaultBranch": "refs/heads/main",
            "size": 1024,
            "isDisabled": false
        }))
        .unwrap();

        assert_eq!(repo.name, "azdo-tasks-tests");
        assert_eq!(repo.project.id, "6ce954b1-ce1f-45d1-b94d-e6bf2464ba2c");
        assert_eq!(repo.default_branch.as_deref(), Some("refs/heads/main"));
        assert!(repo.extra.contains_key("url"));
    }

    #[test]
    fn test_unknown_change_type_is_kept() {
        let change: ChangeType = serde_json::from_value(json!("sourceRename")).unwrap();
        assert_eq!(change, ChangeType::Other("sourceRename".to_string()));
        assert_eq!(serde_json::to_value(&change).unwrap(), json!("sourceRename"));

        let known: ChangeType = serde_json::from_value(json!("delete")).unwrap();
        assert_eq!(known, ChangeType::Delete);
    }

    #[test]
    fn test_push_response_keeps_nested_fields() {
        let raw = json!({
            "pushId": 42,
            "date": "2024-03-01T12:00:00Z",
            "refUpdates": [{
                "name": "refs/heads/master",
                "oldObjectId": "abc123",
                "newObjectId": "def456",
                "repositoryId": "5febef5a-833d-4e14-b9c0-14cb638f91e6"
            }],
            "commits": [{
                "commitId": "def456",
                "comment": "Repository push test",
                "author": {"name": "Build Service", "date": "2024-03-01T12:00:00Z"},
                "changes": [{
                    "changeType": "edit, rename",
                    "item": {"path": "/catalog-info.yaml", "gitObjectType": "blob"},
                    "sourceServerItem": "/old-info.yaml"
                }]
            }]
        });
        let push: GitPush = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(push.ref_updates[0].extra["repositoryId"], "5febef5a-833d-4e14-b9c0-14cb638f91e6");
        assert_eq!(push.commits[0].extra["author"]["name"], "Build Service");
        assert_eq!(
            push.commits[0].changes[0].change_type,
            ChangeType::Other("edit, rename".to_string())
        );
        assert_eq!(serde_json::to_value(&push).unwrap(), raw);
    }
}
