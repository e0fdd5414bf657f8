//! Slice state and its pending / fulfilled / rejected transitions

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Entity, Project, ProjectId, Task};

/// Identifier handed to every dispatched operation, increasing per store
pub type RequestId = u64;

/// What an in-flight request is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "kebab-case")]
pub enum Operation {
    Fetch,
    Create,
    Update(u64),
    Delete(u64),
}

/// A message tagged with the request that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub request_id: RequestId,
    pub message: String,
}

/// One partition of application state
///
/// `in_flight` is keyed by request, so overlapping operations never clear each
/// other's loading state. The shared `error` and `success` notices always hold
/// the most recently settled request's message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceState<T> {
    pub items: Vec<T>,
    pub in_flight: BTreeMap<RequestId, Operation>,
    pub error: Option<Notice>,
    pub success: Option<Notice>,
}

impl<T> Default for SliceState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            in_flight: BTreeMap::new(),
            error: None,
            success: None,
        }
    }
}

impl<T: Entity> SliceState<T> {
    pub fn loading(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Whether an identical operation is already running
    pub fn is_pending(&self, operation: &Operation) -> bool {
        self.in_flight.values().any(|op| op == operation)
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|n| n.message.as_str())
    }

    pub fn success_message(&self) -> Option<&str> {
        self.success.as_ref().map(|n| n.message.as_str())
    }

    pub fn get(&self, id: u64) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    // ========== Transitions ==========

    /// Pending: register the request and clear the current error
    pub fn begin(&mut self, request_id: RequestId, operation: Operation) {
        self.in_flight.insert(request_id, operation);
        self.error = None;
    }

    /// Fulfilled: settle the request, optionally announcing `message`
    pub fn fulfil(&mut self, request_id: RequestId, message: Option<String>) {
        self.in_flight.remove(&request_id);
        if let Some(message) = message {
            self.success = Some(Notice {
                request_id,
                message,
            });
        }
    }

    /// Rejected: settle the request and store its failure; items are untouched
    pub fn reject(&mut self, request_id: RequestId, message: String) {
        self.in_flight.remove(&request_id);
        self.error = Some(Notice {
            request_id,
            message,
        });
    }

    /// Drop a request whose owner went away, leaving everything else as is
    pub fn abandon(&mut self, request_id: RequestId) {
        self.in_flight.remove(&request_id);
    }

    pub fn clear_messages(&mut self) {
        self.error = None;
        self.success = None;
    }

    // ========== Collection updates ==========

    pub fn replace_all(&mut self, items: Vec<T>) {
        self.items = items;
    }

    pub fn append(&mut self, item: T) {
        self.items.push(item);
    }

    /// Replace the item with the same id; unknown ids are ignored
    pub fn replace_by_id(&mut self, item: T) {
        if let Some(slot) = self.items.iter_mut().find(|i| i.id() == item.id()) {
            *slot = item;
        }
    }

    pub fn remove_by_id(&mut self, id: u64) {
        self.items.retain(|item| item.id() != id);
    }
}

/// Everything observers can see
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreState {
    pub projects: SliceState<Project>,
    pub tasks: SliceState<Task>,
}

impl StoreState {
    /// Tasks of one project in store order; no I/O
    pub fn tasks_by_project(&self, project_id: ProjectId) -> Vec<&Task> {
        self.tasks
            .items
            .iter()
            .filter(|t| t.project_id == project_id)
            .collect()
    }

    pub fn loading(&self) -> bool {
        self.projects.loading() || self.tasks.loading()
    }

    /// Remove a project and its tasks in one step
    pub(crate) fn remove_project_cascade(&mut self, project_id: ProjectId) {
        self.projects.remove_by_id(project_id);
        self.tasks.items.retain(|t| t.project_id != project_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{seed_projects, seed_tasks};

    fn slice() -> SliceState<Project> {
        SliceState {
            items: seed_projects(),
            ..SliceState::default()
        }
    }

    #[test]
    fn test_overlapping_requests_keep_loading() {
        let mut slice = slice();
        slice.begin(1, Operation::Delete(1));
        slice.begin(2, Operation::Delete(2));
        assert!(slice.loading());

        slice.fulfil(1, Some("first".to_string()));
        assert!(slice.loading());
        assert!(slice.is_pending(&Operation::Delete(2)));
        assert!(!slice.is_pending(&Operation::Delete(1)));

        slice.reject(2, "second failed".to_string());
        assert!(!slice.loading());
    }

    #[test]
    fn test_notices_carry_their_request() {
        let mut slice = slice();
        slice.begin(1, Operation::Create);
        slice.begin(2, Operation::Update(2));
        slice.reject(2, "boom".to_string());
        slice.fulfil(1, Some("created".to_string()));

        assert_eq!(slice.error.as_ref().unwrap().request_id, 2);
        assert_eq!(slice.success.as_ref().unwrap().request_id, 1);
        assert_eq!(slice.error_message(), Some("boom"));
        assert_eq!(slice.success_message(), Some("created"));
    }

    #[test]
    fn test_pending_clears_error_only() {
        let mut slice = slice();
        slice.begin(1, Operation::Create);
        slice.fulfil(1, Some("done".to_string()));
        slice.begin(2, Operation::Fetch);
        slice.reject(2, "offline".to_string());

        slice.begin(3, Operation::Fetch);
        assert!(slice.error.is_none());
        assert_eq!(slice.success_message(), Some("done"));
    }

    #[test]
    fn test_abandon_leaves_notices() {
        let mut slice = slice();
        slice.begin(1, Operation::Delete(1));
        slice.abandon(1);
        assert!(!slice.loading());
        assert!(slice.error.is_none() && slice.success.is_none());
        assert_eq!(slice.items.len(), 2);
    }

    #[test]
    fn test_replace_by_id_ignores_unknown() {
        let mut slice = slice();
        let mut ghost = seed_projects().remove(0);
        ghost.id = 99;
        slice.replace_by_id(ghost);
        assert_eq!(slice.items, seed_projects());

        let mut renamed = seed_projects().remove(1);
        renamed.name = "Renamed".to_string();
        slice.replace_by_id(renamed);
        assert_eq!(slice.get(2).unwrap().name, "Renamed");
    }

    #[test]
    fn test_cascade_removes_only_that_project() {
        let mut state = StoreState::default();
        state.projects.replace_all(seed_projects());
        state.tasks.replace_all(seed_tasks());

        state.remove_project_cascade(1);
        assert_eq!(state.projects.items.len(), 1);
        assert!(state.tasks.items.is_empty());
        assert!(state.tasks_by_project(1).is_empty());
    }

    #[test]
    fn test_state_serializes() {
        let mut state = StoreState::default();
        state.projects.begin(7, Operation::Update(3));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["projects"]["inFlight"]["7"]["kind"], "update");
        assert_eq!(json["projects"]["inFlight"]["7"]["id"], 3);
    }
}
