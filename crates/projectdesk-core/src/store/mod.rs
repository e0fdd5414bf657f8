//! Application store coordinating the slices with the mock backend
//!
//! Every operation runs as pending, then fulfilled or rejected. Each
//! transition is published once on a `watch` channel so observers always see
//! whole snapshots, and each operation also returns its own `Result`.

mod slice;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::MockConfig;
use crate::domain::{
    Entity, NewProject, NewTask, Project, ProjectId, ProjectPatch, Task, TaskId, TaskPatch,
};
use crate::error::{Error, Result};
use crate::mock::{Deleted, MockApi, ProjectDeletion};

pub use slice::{Notice, Operation, RequestId, SliceState, StoreState};

fn projects(state: &mut StoreState) -> &mut SliceState<Project> {
    &mut state.projects
}

fn tasks(state: &mut StoreState) -> &mut SliceState<Task> {
    &mut state.tasks
}

/// Client-side view of projects and tasks
///
/// Cloning is cheap and every clone shares the same state. A clone made with
/// [`AppStore::scoped`] stops applying results once its token is cancelled.
#[derive(Clone)]
pub struct AppStore {
    api: Arc<MockApi>,
    state: Arc<watch::Sender<StoreState>>,
    next_request: Arc<AtomicU64>,
    liveness: Option<CancellationToken>,
}

impl std::fmt::Debug for AppStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppStore")
            .field("latency", &self.api.latency())
            .field("scoped", &self.liveness.is_some())
            .finish()
    }
}

impl AppStore {
    pub fn new(api: Arc<MockApi>) -> Self {
        Self {
            api,
            state: Arc::new(watch::Sender::new(StoreState::default())),
            next_request: Arc::new(AtomicU64::new(0)),
            liveness: None,
        }
    }

    /// Store over a freshly seeded mock backend
    pub fn seeded(latency: Duration) -> Self {
        Self::new(Arc::new(MockApi::new(latency)))
    }

    pub fn from_config(config: &MockConfig) -> Self {
        Self::new(Arc::new(MockApi::from_config(config)))
    }

    /// Handle whose results are dropped once `token` is cancelled
    pub fn scoped(&self, token: CancellationToken) -> Self {
        Self {
            liveness: Some(token),
            ..self.clone()
        }
    }

    pub fn api(&self) -> &Arc<MockApi> {
        &self.api
    }

    /// Current snapshot
    pub fn state(&self) -> StoreState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    /// Tasks of one project from the current snapshot; no I/O
    pub fn tasks_by_project(&self, project_id: ProjectId) -> Vec<Task> {
        self.state
            .borrow()
            .tasks_by_project(project_id)
            .into_iter()
            .cloned()
            .collect()
    }

    // ========== Projects ==========

    pub async fn fetch_projects(&self) -> Result<Vec<Project>> {
        self.dispatch(
            projects,
            Operation::Fetch,
            async { Ok::<_, Error>(self.api.list_projects().await) },
            |state, items: &Vec<Project>| {
                state.projects.replace_all(items.clone());
                None
            },
        )
        .await
    }

    pub async fn create_project(&self, new: NewProject) -> Result<Project> {
        self.dispatch(
            projects,
            Operation::Create,
            self.api.create_project(new),
            |state, project: &Project| {
                state.projects.append(project.clone());
                Some(format!("Project \"{}\" created successfully!", project.name))
            },
        )
        .await
    }

    pub async fn update_project(&self, id: ProjectId, patch: ProjectPatch) -> Result<Project> {
        self.dispatch(
            projects,
            Operation::Update(id),
            self.api.update_project(id, patch),
            |state, project: &Project| {
                state.projects.replace_by_id(project.clone());
                Some(format!("Project \"{}\" updated successfully!", project.name))
            },
        )
        .await
    }

    /// Delete a project; its tasks leave the tasks slice in the same snapshot
    pub async fn delete_project(&self, id: ProjectId) -> Result<ProjectDeletion> {
        self.dispatch(
            projects,
            Operation::Delete(id),
            self.api.delete_project(id),
            |state, deletion: &ProjectDeletion| {
                state.remove_project_cascade(deletion.data.id);
                Some(deletion.message.clone())
            },
        )
        .await
    }

    // ========== Tasks ==========

    pub async fn fetch_tasks(&self) -> Result<Vec<Task>> {
        self.dispatch(
            tasks,
            Operation::Fetch,
            async { Ok::<_, Error>(self.api.list_tasks().await) },
            |state, items: &Vec<Task>| {
                state.tasks.replace_all(items.clone());
                None
            },
        )
        .await
    }

    pub async fn create_task(&self, new: NewTask) -> Result<Task> {
        self.dispatch(
            tasks,
            Operation::Create,
            self.api.create_task(new),
            |state, task: &Task| {
                state.tasks.append(task.clone());
                Some(format!("Task \"{}\" created successfully!", task.title))
            },
        )
        .await
    }

    pub async fn update_task(&self, id: TaskId, patch: TaskPatch) -> Result<Task> {
        self.dispatch(
            tasks,
            Operation::Update(id),
            self.api.update_task(id, patch),
            |state, task: &Task| {
                state.tasks.replace_by_id(task.clone());
                Some(format!("Task \"{}\" updated successfully!", task.title))
            },
        )
        .await
    }

    pub async fn delete_task(&self, id: TaskId) -> Result<Deleted<Task>> {
        self.dispatch(
            tasks,
            Operation::Delete(id),
            self.api.delete_task(id),
            |state, deleted: &Deleted<Task>| {
                state.tasks.remove_by_id(deleted.data.id);
                Some(deleted.message.clone())
            },
        )
        .await
    }

    /// Fetch both collections concurrently
    pub async fn load_all(&self) -> Result<()> {
        let (projects, tasks) = tokio::join!(self.fetch_projects(), self.fetch_tasks());
        projects?;
        tasks?;
        Ok(())
    }

    // ========== Housekeeping ==========

    pub fn clear_messages(&self) {
        self.state.send_modify(|state| state.projects.clear_messages());
    }

    pub fn clear_task_messages(&self) {
        self.state.send_modify(|state| state.tasks.clear_messages());
    }

    /// Reseed the backend and empty both slices
    pub async fn reset(&self) {
        self.api.reset().await;
        self.state.send_replace(StoreState::default());
        info!("Store reset");
    }

    fn is_cancelled(&self) -> bool {
        self.liveness
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    async fn dispatch<T, R, Fut, F>(
        &self,
        select: fn(&mut StoreState) -> &mut SliceState<T>,
        operation: Operation,
        call: Fut,
        settle: F,
    ) -> Result<R>
    where
        T: Entity,
        Fut: Future<Output = Result<R>>,
        F: FnOnce(&mut StoreState, &R) -> Option<String>,
    {
        let request_id = self.next_request.fetch_add(1, Ordering::Relaxed) + 1;
        self.state
            .send_modify(|state| select(state).begin(request_id, operation));
        debug!(request_id, ?operation, "Request pending");

        let result = call.await;

        if self.is_cancelled() {
            self.state
                .send_modify(|state| select(state).abandon(request_id));
            debug!(request_id, "Owner gone, dropping result");
            return Err(Error::Cancelled);
        }

        match result {
            Ok(value) => {
                self.state.send_modify(|state| {
                    let message = settle(state, &value);
                    select(state).fulfil(request_id, message);
                });
                debug!(request_id, "Request fulfilled");
                Ok(value)
            }
            Err(e) => {
                warn!(request_id, error = %e, "Request rejected");
                let message = e.to_string();
                self.state
                    .send_modify(|state| select(state).reject(request_id, message));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProjectStatus;

    async fn loaded() -> AppStore {
        let store = AppStore::seeded(Duration::ZERO);
        store.load_all().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_fetch_fills_slices() {
        let store = loaded().await;
        let state = store.state();
        assert_eq!(state.projects.items.len(), 2);
        assert_eq!(state.tasks.items.len(), 2);
        assert!(!state.loading());
        assert!(state.projects.success.is_none());
    }

    #[tokio::test]
    async fn test_update_sets_success_message() {
        let store = loaded().await;
        store
            .update_project(2, ProjectPatch::new().status(ProjectStatus::InProgress))
            .await
            .unwrap();

        let state = store.state();
        assert_eq!(state.projects.get(2).unwrap().status, ProjectStatus::InProgress);
        assert_eq!(
            state.projects.success_message(),
            Some("Project \"App Mobile Fitness\" updated successfully!")
        );
    }

    #[tokio::test]
    async fn test_rejection_keeps_items() {
        let store = loaded().await;
        let before = store.state().projects.items;

        let err = store
            .update_project(999, ProjectPatch::new().name("Ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ProjectNotFound(999)));

        let state = store.state();
        assert_eq!(state.projects.items, before);
        assert!(state.projects.error_message().unwrap().contains("999"));
    }

    #[tokio::test]
    async fn test_clear_messages_is_per_slice() {
        let store = loaded().await;
        store.delete_task(1).await.unwrap();
        store.update_project(999, ProjectPatch::new()).await.unwrap_err();

        store.clear_messages();
        let state = store.state();
        assert!(state.projects.error.is_none());
        assert!(state.tasks.success.is_some());

        store.clear_task_messages();
        assert!(store.state().tasks.success.is_none());
    }

    #[tokio::test]
    async fn test_reset_empties_slices() {
        let store = loaded().await;
        store.delete_project(1).await.unwrap();
        store.reset().await;

        assert_eq!(store.state(), StoreState::default());
        store.load_all().await.unwrap();
        assert_eq!(store.state().projects.items.len(), 2);
    }

    #[tokio::test]
    async fn test_tasks_by_project_reads_snapshot() {
        let store = loaded().await;
        let ids: Vec<_> = store.tasks_by_project(1).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(store.tasks_by_project(2).is_empty());
    }

    #[tokio::test]
    async fn test_request_ids_increase() {
        let store = AppStore::seeded(Duration::ZERO);
        store.create_task(NewTask::new(2, "One", "Ana")).await.unwrap();
        let first = store.state().tasks.success.unwrap().request_id;
        store.create_task(NewTask::new(2, "Two", "Ana")).await.unwrap();
        let second = store.state().tasks.success.unwrap().request_id;
        assert!(second > first);
    }
}
