//! Domain model for projects and their tasks
//!
//! Plain data records plus the create / patch payloads the stores accept.
//! Nothing in here performs I/O.

mod form;
mod project;
mod task;

pub use form::{FieldError, format_team, parse_team};
pub use project::{NewProject, Priority, Project, ProjectId, ProjectPatch, ProjectStatus};
pub use task::{NewTask, Task, TaskId, TaskPatch, TaskStatus};

/// Record with a store-assigned integer id
pub trait Entity: Clone {
    fn id(&self) -> u64;
}

impl Entity for Project {
    fn id(&self) -> u64 {
        self.id
    }
}

impl Entity for Task {
    fn id(&self) -> u64 {
        self.id
    }
}

/// Deserialize helper that keeps an explicit `null` distinct from a missing field.
///
/// Used for patch fields of type `Option<Option<T>>`: missing leaves the value alone,
/// `null` clears it.
pub(crate) fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}
