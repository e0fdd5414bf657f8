//! Project records and payloads

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::form::{FieldError, check_min_len, check_required};
use crate::error::{Error, Result};

/// Store-assigned project identifier
pub type ProjectId = u64;

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Planning,
    InProgress,
    Completed,
    Paused,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 4] = [
        ProjectStatus::Planning,
        ProjectStatus::InProgress,
        ProjectStatus::Completed,
        ProjectStatus::Paused,
    ];

    /// Machine-readable name
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Planning => "planning",
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Paused => "paused",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            ProjectStatus::Planning => "Planning",
            ProjectStatus::InProgress => "In Progress",
            ProjectStatus::Completed => "Completed",
            ProjectStatus::Paused => "Paused",
        }
    }
}

/// Accepts any of `in_progress`, `in-progress` or `In Progress`
impl FromStr for ProjectStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_token(s).as_str() {
            "planning" => Ok(ProjectStatus::Planning),
            "in_progress" => Ok(ProjectStatus::InProgress),
            "completed" => Ok(ProjectStatus::Completed),
            "paused" => Ok(ProjectStatus::Paused),
            _ => Err(Error::Validation(format!("unknown status `{s}`"))),
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Project priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_token(s).as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(Error::Validation(format!("unknown priority `{s}`"))),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub(crate) fn normalize_token(s: &str) -> String {
    s.trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect()
}

/// A tracked project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ProjectStatus,
    pub priority: Priority,
    /// Member names in display order
    pub team: Vec<String>,
}

impl Project {
    /// Build the stored record for a create payload
    pub fn from_new(id: ProjectId, new: NewProject) -> Self {
        Self {
            id,
            name: new.name,
            description: new.description,
            start_date: new.start_date,
            end_date: new.end_date,
            status: new.status,
            priority: new.priority,
            team: new.team.unwrap_or_default(),
        }
    }

    /// Form-level checks over the full record, used after merging an edit
    pub fn form_errors(&self) -> Vec<FieldError> {
        project_form_errors(&self.name, &self.description, self.start_date, self.end_date)
    }
}

/// Payload for creating a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub priority: Priority,
    /// Missing team defaults to an empty list on creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Vec<String>>,
}

impl NewProject {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            start_date,
            end_date,
            status: ProjectStatus::default(),
            priority: Priority::default(),
            team: None,
        }
    }

    pub fn with_status(mut self, status: ProjectStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_team<I, S>(mut self, team: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.team = Some(team.into_iter().map(Into::into).collect());
        self
    }

    /// Field errors a project form would show
    pub fn form_errors(&self) -> Vec<FieldError> {
        project_form_errors(&self.name, &self.description, self.start_date, self.end_date)
    }

    /// Run form checks, folding every field error into one `Validation` error
    pub fn validate_form(&self) -> Result<()> {
        FieldError::into_result(self.form_errors())
    }
}

fn project_form_errors(
    name: &str,
    description: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if let Some(err) = check_required("name", "Project name", name)
        .or_else(|| check_min_len("name", "Project name", name, 3))
    {
        errors.push(err);
    }
    if let Some(err) = check_required("description", "Description", description)
        .or_else(|| check_min_len("description", "Description", description, 10))
    {
        errors.push(err);
    }
    if end_date < start_date {
        errors.push(FieldError::new(
            "endDate",
            "End date must be on or after the start date",
        ));
    }

    errors
}

/// Partial update; fields left `None` keep their stored value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Vec<String>>,
}

impl ProjectPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    pub fn status(mut self, status: ProjectStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn team<I, S>(mut self, team: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.team = Some(team.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Shallow-merge this patch over `project`
    pub fn apply(&self, project: &mut Project) {
        if let Some(name) = &self.name {
            project.name = name.clone();
        }
        if let Some(description) = &self.description {
            project.description = description.clone();
        }
        if let Some(date) = self.start_date {
            project.start_date = date;
        }
        if let Some(date) = self.end_date {
            project.end_date = date;
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(priority) = self.priority {
            project.priority = priority;
        }
        if let Some(team) = &self.team {
            project.team = team.clone();
        }
    }

    /// Reject a patch that would blank out a required field
    pub(crate) fn check_required_fields(&self) -> Result<()> {
        if let Some(name) = &self.name
            && name.trim().is_empty()
        {
            return Err(Error::Validation("project name cannot be empty".to_string()));
        }
        if let Some(description) = &self.description
            && description.trim().is_empty()
        {
            return Err(Error::Validation(
                "project description cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Project {
        Project::from_new(
            7,
            NewProject::new(
                "Website",
                "Company website relaunch",
                date(2024, 1, 1),
                date(2024, 3, 1),
            ),
        )
    }

    #[test]
    fn test_status_parse_accepts_spellings() {
        for raw in ["in_progress", "In Progress", "in-progress"] {
            assert_eq!(raw.parse::<ProjectStatus>().unwrap(), ProjectStatus::InProgress);
        }
        assert_eq!("PAUSED".parse::<ProjectStatus>().unwrap(), ProjectStatus::Paused);
        assert!("archived".parse::<ProjectStatus>().unwrap_err().is_validation());
        assert_eq!(" High ".parse::<Priority>().unwrap(), Priority::High);

        let err = "urgent".parse::<Priority>().unwrap_err();
        assert!(err.to_string().contains("unknown priority `urgent`"));
    }

    #[test]
    fn test_from_new_defaults_team_to_empty() {
        let project = sample();
        assert_eq!(project.id, 7);
        assert!(project.team.is_empty());
        assert_eq!(project.status, ProjectStatus::Planning);
        assert_eq!(project.priority, Priority::Medium);
    }

    #[test]
    fn test_patch_preserves_missing_fields() {
        let mut project = sample();
        ProjectPatch::new()
            .status(ProjectStatus::InProgress)
            .team(["Ana", "Rui"])
            .apply(&mut project);

        assert_eq!(project.name, "Website");
        assert_eq!(project.description, "Company website relaunch");
        assert_eq!(project.status, ProjectStatus::InProgress);
        assert_eq!(project.team, vec!["Ana".to_string(), "Rui".to_string()]);
    }

    #[test]
    fn test_empty_patch_is_detected() {
        assert!(ProjectPatch::new().is_empty());
        assert!(!ProjectPatch::new().priority(Priority::Low).is_empty());
    }

    #[test]
    fn test_patch_rejects_blank_name() {
        let err = ProjectPatch::new().name("   ").check_required_fields();
        assert!(matches!(err, Err(Error::Validation(_))));
    }

    #[test]
    fn test_form_errors_cover_lengths_and_dates() {
        let new = NewProject::new("ab", "short", date(2024, 5, 1), date(2024, 4, 1));
        let fields: Vec<_> = new.form_errors().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "description", "endDate"]);
        assert!(new.validate_form().is_err());

        let ok = NewProject::new(
            "Warehouse",
            "Inventory tracking rollout",
            date(2024, 4, 1),
            date(2024, 4, 1),
        );
        assert!(ok.validate_form().is_ok());
    }

    #[test]
    fn test_project_serializes_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["startDate"], "2024-01-01");
        assert_eq!(json["status"], "planning");
        assert_eq!(json["priority"], "medium");
    }
}
