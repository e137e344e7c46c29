use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::errors::ProjectError;
use crate::identity::OwnerId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    #[default]
    Planning,
    InProgress,
    Completed,
    OnHold,
}

/// Fields supplied when creating a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: ProjectStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    pub client: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
}

/// In-memory project registry, one list per owner.
///
/// Projects are kept in creation order behind a `tokio::sync::Mutex` so the
/// registry can be shared across request handlers.
#[derive(Default)]
pub struct ProjectRegistry {
    projects: Mutex<HashMap<OwnerId, Vec<Project>>>,
}

impl ProjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a project. Names are unique per owner.
    pub async fn create(&self, owner: &OwnerId, input: NewProject) -> Result<Project, ProjectError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ProjectError::InvalidInput("name must not be empty".into()));
        }
        if let (Some(start), Some(end)) = (input.start_date, input.end_date) {
            if end < start {
                return Err(ProjectError::InvalidInput(format!(
                    "end date {end} is before start date {start}"
                )));
            }
        }

        let mut projects = self.projects.lock().await;
        let owned = projects.entry(owner.clone()).or_default();
        if owned.iter().any(|p| p.name == name) {
            return Err(ProjectError::Duplicate(name));
        }

        let project = Project {
            name,
            client: input.client.trim().to_string(),
            description: input.description.filter(|d| !d.trim().is_empty()),
            start_date: input.start_date,
            end_date: input.end_date,
            status: input.status,
            created_at: Utc::now(),
        };
        owned.push(project.clone());
        Ok(project)
    }

    /// List an owner's projects in creation order.
    pub async fn list(&self, owner: &OwnerId) -> Vec<Project> {
        let projects = self.projects.lock().await;
        projects.get(owner).cloned().unwrap_or_default()
    }

    /// Remove a project by name, returning it.
    pub async fn delete(&self, owner: &OwnerId, name: &str) -> Result<Project, ProjectError> {
        let mut projects = self.projects.lock().await;
        let owned = projects
            .get_mut(owner)
            .ok_or_else(|| ProjectError::NotFound(name.to_string()))?;
        let index = owned
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| ProjectError::NotFound(name.to_string()))?;
        Ok(owned.remove(index))
    }
}
