//! In-memory system of record for projects and tasks
//!
//! `MockApi` owns both collections and answers every call after an artificial
//! delay, the way a remote backend would. Reads hand out copies; writes happen
//! under one write lock, so a project delete and its task cascade are a single
//! mutation from every caller's point of view.

mod seed;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::MockConfig;
use crate::domain::{
    NewProject, NewTask, Project, ProjectId, ProjectPatch, Task, TaskId, TaskPatch,
};
use crate::error::{Error, Result};

pub use seed::{seed_projects, seed_tasks};

/// Default simulated round-trip time
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(500);

/// A removed record plus a confirmation message for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deleted<T> {
    pub data: T,
    pub message: String,
}

/// Result of deleting a project, including the tasks removed with it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDeletion {
    pub data: Project,
    pub removed_task_ids: Vec<TaskId>,
    pub message: String,
}

#[derive(Debug, Default)]
struct Collections {
    projects: Vec<Project>,
    tasks: Vec<Task>,
    /// Highest project id ever handed out since the last reset
    project_high_water: ProjectId,
    task_high_water: TaskId,
}

impl Collections {
    fn seeded() -> Self {
        let projects = seed_projects();
        let tasks = seed_tasks();
        Self {
            project_high_water: max_id(projects.iter().map(|p| p.id)),
            task_high_water: max_id(tasks.iter().map(|t| t.id)),
            projects,
            tasks,
        }
    }

    fn next_project_id(&mut self) -> ProjectId {
        let id = max_id(self.projects.iter().map(|p| p.id)).max(self.project_high_water) + 1;
        self.project_high_water = id;
        id
    }

    fn next_task_id(&mut self) -> TaskId {
        let id = max_id(self.tasks.iter().map(|t| t.id)).max(self.task_high_water) + 1;
        self.task_high_water = id;
        id
    }
}

fn max_id(ids: impl Iterator<Item = u64>) -> u64 {
    ids.max().unwrap_or(0)
}

/// Simulated backend with artificial latency
#[derive(Debug)]
pub struct MockApi {
    latency: Duration,
    data: RwLock<Collections>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new(DEFAULT_LATENCY)
    }
}

impl MockApi {
    /// Create a store loaded with the seed records
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            data: RwLock::new(Collections::seeded()),
        }
    }

    /// Create a store with no records
    pub fn empty(latency: Duration) -> Self {
        Self {
            latency,
            data: RwLock::new(Collections::default()),
        }
    }

    pub fn from_config(config: &MockConfig) -> Self {
        Self::new(Duration::from_millis(config.latency_ms))
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    /// Restore the two seed projects and two seed tasks
    pub async fn reset(&self) {
        let mut data = self.data.write().await;
        *data = Collections::seeded();
        info!("Mock store reset to seed data");
    }

    // ========== Projects ==========

    /// Snapshot of every project in store order
    pub async fn list_projects(&self) -> Vec<Project> {
        self.delay().await;
        self.data.read().await.projects.clone()
    }

    pub async fn get_project(&self, id: ProjectId) -> Result<Project> {
        self.delay().await;
        self.data
            .read()
            .await
            .projects
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(Error::ProjectNotFound(id))
    }

    /// Create a project, assigning the next id
    pub async fn create_project(&self, new: NewProject) -> Result<Project> {
        self.delay().await;

        if new.name.trim().is_empty() || new.description.trim().is_empty() {
            return Err(Error::Validation(
                "name and description are required".to_string(),
            ));
        }

        let mut data = self.data.write().await;
        let id = data.next_project_id();
        let project = Project::from_new(id, new);
        data.projects.push(project.clone());

        info!(project_id = id, name = %project.name, "Created project");
        Ok(project)
    }

    /// Shallow-merge `patch` over an existing project
    pub async fn update_project(&self, id: ProjectId, patch: ProjectPatch) -> Result<Project> {
        self.delay().await;

        let mut data = self.data.write().await;
        let project = data
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(Error::ProjectNotFound(id))?;
        patch.check_required_fields()?;
        patch.apply(project);

        debug!(project_id = id, "Updated project");
        Ok(project.clone())
    }

    /// Remove a project together with every task that references it
    pub async fn delete_project(&self, id: ProjectId) -> Result<ProjectDeletion> {
        self.delay().await;

        let mut data = self.data.write().await;
        let index = data
            .projects
            .iter()
            .position(|p| p.id == id)
            .ok_or(Error::ProjectNotFound(id))?;
        let project = data.projects.remove(index);

        let mut removed_task_ids = Vec::new();
        data.tasks.retain(|t| {
            if t.project_id == id {
                removed_task_ids.push(t.id);
                false
            } else {
                true
            }
        });

        info!(
            project_id = id,
            removed_tasks = removed_task_ids.len(),
            "Deleted project"
        );

        Ok(ProjectDeletion {
            message: format!("Project \"{}\" was deleted successfully", project.name),
            data: project,
            removed_task_ids,
        })
    }

    // ========== Tasks ==========

    pub async fn list_tasks(&self) -> Vec<Task> {
        self.delay().await;
        self.data.read().await.tasks.clone()
    }

    pub async fn get_task(&self, id: TaskId) -> Result<Task> {
        self.delay().await;
        self.data
            .read()
            .await
            .tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(Error::TaskNotFound(id))
    }

    /// Tasks belonging to `project_id`, in store order
    pub async fn get_tasks_by_project(&self, project_id: ProjectId) -> Vec<Task> {
        self.delay().await;
        self.data
            .read()
            .await
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect()
    }

    /// Create a task; the referenced project must exist right now
    pub async fn create_task(&self, new: NewTask) -> Result<Task> {
        self.delay().await;

        let project_id = match new.project_id {
            Some(project_id) if !new.title.trim().is_empty() => project_id,
            _ => {
                return Err(Error::Validation(
                    "title and project are required".to_string(),
                ));
            }
        };

        let mut data = self.data.write().await;
        if !data.projects.iter().any(|p| p.id == project_id) {
            return Err(Error::ProjectNotFound(project_id));
        }

        let id = data.next_task_id();
        let task = Task::from_new(id, project_id, new);
        data.tasks.push(task.clone());

        info!(task_id = id, project_id, "Created task");
        Ok(task)
    }

    /// Shallow-merge `patch` over an existing task; a project move must target a live project
    pub async fn update_task(&self, id: TaskId, patch: TaskPatch) -> Result<Task> {
        self.delay().await;

        let mut data = self.data.write().await;
        let index = data
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(Error::TaskNotFound(id))?;
        patch.check_required_fields()?;
        if let Some(project_id) = patch.project_id
            && !data.projects.iter().any(|p| p.id == project_id)
        {
            return Err(Error::ProjectNotFound(project_id));
        }

        let task = &mut data.tasks[index];
        patch.apply(task);

        debug!(task_id = id, "Updated task");
        Ok(task.clone())
    }

    pub async fn delete_task(&self, id: TaskId) -> Result<Deleted<Task>> {
        self.delay().await;

        let mut data = self.data.write().await;
        let index = data
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(Error::TaskNotFound(id))?;
        let task = data.tasks.remove(index);

        info!(task_id = id, "Deleted task");
        Ok(Deleted {
            message: format!("Task \"{}\" was deleted successfully", task.title),
            data: task,
        })
    }
}
