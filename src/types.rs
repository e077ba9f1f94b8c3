use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifies a project inside an organization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectKey {
    pub organization: String,
    pub project: String,
}

impl ProjectKey {
    pub fn new(organization: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            project: project.into(),
        }
    }
}

/// Identifies a repository, and by convention the pipeline and variable
/// group named after it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryKey {
    pub organization: String,
    pub project: String,
    pub repository: String,
}

impl RepositoryKey {
    pub fn new(
        organization: impl Into<String>,
        project: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self {
            organization: organization.into(),
            project: project.into(),
            repository: repository.into(),
        }
    }

    pub fn project_key(&self) -> ProjectKey {
        ProjectKey::new(self.organization.clone(), self.project.clone())
    }
}

/// Standard `{ count, value }` envelope returned by list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResult<T> {
    #[serde(default)]
    pub count: usize,
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

impl<T> ListResult<T> {
    pub fn into_vec(self) -> Vec<T> {
        self.value
    }
}

/// Reference to a team project embedded in other resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectReference {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProjectReference {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            extra: Map::new(),
        }
    }
}
