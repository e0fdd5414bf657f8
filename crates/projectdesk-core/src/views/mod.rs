//! Derived values computed from store snapshots
//!
//! Everything here is pure: same input, same output, no I/O.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Priority, Project, ProjectId, ProjectStatus, Task, TaskStatus};

/// Either every value or exactly one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Filter<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(wanted) => wanted == value,
        }
    }
}

impl<T> From<Option<T>> for Filter<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Filter::All, Filter::Only)
    }
}

/// Search text plus status and priority filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFilter {
    pub search: String,
    pub status: Filter<ProjectStatus>,
    pub priority: Filter<Priority>,
}

impl ProjectFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = text.into();
        self
    }

    pub fn status(mut self, status: impl Into<Filter<ProjectStatus>>) -> Self {
        self.status = status.into();
        self
    }

    pub fn priority(mut self, priority: impl Into<Filter<Priority>>) -> Self {
        self.priority = priority.into();
        self
    }

    /// Case-insensitive substring match on name or description, then both filters
    pub fn matches(&self, project: &Project) -> bool {
        let needle = self.search.to_lowercase();
        let text_match = needle.is_empty()
            || project.name.to_lowercase().contains(&needle)
            || project.description.to_lowercase().contains(&needle);

        text_match && self.status.matches(&project.status) && self.priority.matches(&project.priority)
    }
}

pub fn filter_projects<'a>(projects: &'a [Project], filter: &ProjectFilter) -> Vec<&'a Project> {
    projects.iter().filter(|p| filter.matches(p)).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCounts {
    pub total: usize,
    pub in_progress: usize,
    pub completed: usize,
}

pub fn project_counts(projects: &[Project]) -> ProjectCounts {
    projects.iter().fold(
        ProjectCounts {
            total: projects.len(),
            ..ProjectCounts::default()
        },
        |mut counts, project| {
            match project.status {
                ProjectStatus::InProgress => counts.in_progress += 1,
                ProjectStatus::Completed => counts.completed += 1,
                _ => {}
            }
            counts
        },
    )
}

/// Task breakdown for one project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub pending: usize,
}

impl TaskStats {
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        tasks.into_iter().fold(Self::default(), |mut stats, task| {
            stats.total += 1;
            match task.status {
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Pending => stats.pending += 1,
            }
            stats
        })
    }

    /// Rounded share of completed tasks; 0 when there are none
    pub fn progress_percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        (self.completed as f64 * 100.0 / self.total as f64).round() as u8
    }
}

pub fn task_stats(tasks: &[Task], project_id: ProjectId) -> TaskStats {
    TaskStats::from_tasks(tasks.iter().filter(|t| t.project_id == project_id))
}

/// Open task whose due date began before `now` (dates are taken as midnight UTC)
pub fn is_overdue(task: &Task, now: DateTime<Utc>) -> bool {
    if task.is_completed() {
        return false;
    }
    task.due_date
        .is_some_and(|due| due.and_time(NaiveTime::MIN).and_utc() < now)
}

pub fn overdue_tasks(tasks: &[Task], now: DateTime<Utc>) -> Vec<&Task> {
    tasks.iter().filter(|t| is_overdue(t, now)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{seed_projects, seed_tasks};
    use chrono::{NaiveDate, TimeZone};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_search_fitness_finds_one() {
        let projects = seed_projects();
        let found = filter_projects(&projects, &ProjectFilter::new().search("fitness"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "App Mobile Fitness");
    }

    #[test]
    fn test_search_matches_description() {
        let projects = seed_projects();
        let found = filter_projects(&projects, &ProjectFilter::new().search("VENDAS"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 1);
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let projects = seed_projects();
        assert_eq!(filter_projects(&projects, &ProjectFilter::new()).len(), 2);
        assert_eq!(
            filter_projects(&projects, &ProjectFilter::new().search("")).len(),
            2
        );
    }

    #[test]
    fn test_search_term_is_not_trimmed() {
        let projects = seed_projects();
        assert!(filter_projects(&projects, &ProjectFilter::new().search("fitness ")).is_empty());
        assert!(filter_projects(&projects, &ProjectFilter::new().search("   ")).is_empty());

        let found = filter_projects(&projects, &ProjectFilter::new().search("mobile fit"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 2);
    }

    #[test]
    fn test_filters_combine() {
        let projects = seed_projects();
        let filter = ProjectFilter::new()
            .status(Some(ProjectStatus::InProgress))
            .priority(Some(Priority::Medium));
        assert!(filter_projects(&projects, &filter).is_empty());

        let filter = ProjectFilter::new()
            .search("e")
            .priority(Filter::Only(Priority::High));
        let found = filter_projects(&projects, &filter);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 1);
    }

    #[test]
    fn test_project_counts() {
        let mut projects = seed_projects();
        projects[1].status = ProjectStatus::Completed;
        assert_eq!(
            project_counts(&projects),
            ProjectCounts {
                total: 2,
                in_progress: 1,
                completed: 1
            }
        );
        assert_eq!(project_counts(&[]), ProjectCounts::default());
    }

    #[test]
    fn test_progress_bounds() {
        let tasks = seed_tasks();
        assert_eq!(task_stats(&tasks, 2).progress_percent(), 0);

        let stats = task_stats(&tasks, 1);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.progress_percent(), 50);

        let done: Vec<Task> = tasks
            .into_iter()
            .map(|mut t| {
                t.status = TaskStatus::Completed;
                t
            })
            .collect();
        assert_eq!(task_stats(&done, 1).progress_percent(), 100);
    }

    #[test]
    fn test_progress_rounds() {
        let stats = TaskStats {
            total: 3,
            completed: 2,
            ..TaskStats::default()
        };
        assert_eq!(stats.progress_percent(), 67);
    }

    #[test]
    fn test_overdue_rules() {
        let mut task = seed_tasks().remove(1);
        task.due_date = NaiveDate::from_ymd_opt(2024, 4, 15);

        assert!(!is_overdue(&task, at(2024, 4, 14, 23)));
        assert!(is_overdue(&task, at(2024, 4, 15, 1)));

        task.status = TaskStatus::Completed;
        assert!(!is_overdue(&task, at(2025, 1, 1, 0)));

        task.status = TaskStatus::Pending;
        task.due_date = None;
        assert!(!is_overdue(&task, at(2025, 1, 1, 0)));
    }

    #[test]
    fn test_overdue_tasks_skips_completed() {
        let tasks = seed_tasks();
        let late = overdue_tasks(&tasks, at(2030, 1, 1, 0));
        assert_eq!(late.len(), 1);
        assert_eq!(late[0].id, 2);
    }
}
