//! Task records and payloads

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::form::{FieldError, check_min_len, check_required};
use super::project::{ProjectId, normalize_token};
use crate::error::{Error, Result};

/// Store-assigned task identifier, unique within the task collection
pub type TaskId = u64;

/// Task progress state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_token(s).as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            _ => Err(Error::Validation(format!("unknown status `{s}`"))),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A unit of work inside a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    /// Owning project; checked to exist on create and on a project move
    pub project_id: ProjectId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub assignee: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

impl Task {
    /// Build the stored record for a create payload whose project is already known
    pub fn from_new(id: TaskId, project_id: ProjectId, new: NewTask) -> Self {
        Self {
            id,
            project_id,
            title: new.title,
            description: new.description,
            status: new.status,
            assignee: new.assignee,
            due_date: new.due_date,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// Payload for creating a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    /// Required; `None` is rejected by the store
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub assignee: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    pub fn new(project_id: ProjectId, title: impl Into<String>, assignee: impl Into<String>) -> Self {
        Self {
            project_id: Some(project_id),
            title: title.into(),
            description: None,
            status: TaskStatus::default(),
            assignee: assignee.into(),
            due_date: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Field errors a task form would show
    pub fn form_errors(&self) -> Vec<FieldError> {
        task_form_errors(&self.title, &self.assignee)
    }

    pub fn validate_form(&self) -> Result<()> {
        FieldError::into_result(self.form_errors())
    }
}

fn task_form_errors(title: &str, assignee: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if let Some(err) = check_required("title", "Task title", title)
        .or_else(|| check_min_len("title", "Task title", title, 3))
    {
        errors.push(err);
    }
    if let Some(err) = check_required("assignee", "Assignee", assignee) {
        errors.push(err);
    }
    errors
}

/// Partial update; fields left `None` keep their stored value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::deserialize_some"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    /// `Some(None)` clears the due date
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::deserialize_some"
    )]
    pub due_date: Option<Option<NaiveDate>>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the task to another project
    pub fn project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    pub fn due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Shallow-merge this patch over `task`
    pub fn apply(&self, task: &mut Task) {
        if let Some(project_id) = self.project_id {
            task.project_id = project_id;
        }
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(assignee) = &self.assignee {
            task.assignee = assignee.clone();
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
    }

    pub(crate) fn check_required_fields(&self) -> Result<()> {
        if let Some(title) = &self.title
            && title.trim().is_empty()
        {
            return Err(Error::Validation("task title cannot be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Task {
        Task::from_new(
            3,
            1,
            NewTask::new(1, "Write copy", "Ana").with_due_date(
                NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
            ),
        )
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Completed".parse::<TaskStatus>().unwrap(), TaskStatus::Completed);
        assert_eq!("in progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert!("done".parse::<TaskStatus>().unwrap_err().is_validation());
    }

    #[test]
    fn test_patch_can_clear_due_date() {
        let mut task = sample();
        TaskPatch::new().due_date(None).apply(&mut task);
        assert_eq!(task.due_date, None);
        assert_eq!(task.title, "Write copy");
    }

    #[test]
    fn test_patch_json_distinguishes_null_from_missing() {
        let clear: TaskPatch = serde_json::from_str(r#"{"dueDate": null}"#).unwrap();
        assert_eq!(clear.due_date, Some(None));

        let keep: TaskPatch = serde_json::from_str(r#"{"title": "New"}"#).unwrap();
        assert_eq!(keep.due_date, None);
        assert_eq!(keep.title.as_deref(), Some("New"));
    }

    #[test]
    fn test_new_task_without_project_deserializes() {
        let new: NewTask = serde_json::from_str(r#"{"title": "Orphan"}"#).unwrap();
        assert_eq!(new.project_id, None);
        assert_eq!(new.status, TaskStatus::Pending);
    }

    #[test]
    fn test_form_errors() {
        let new = NewTask::new(1, "ab", " ");
        let fields: Vec<_> = new.form_errors().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["title", "assignee"]);
        assert!(NewTask::new(1, "Deploy", "Rui").validate_form().is_ok());
    }
}
