//! Plain-text rendering shared by one-shot commands and the shell

use chrono::{DateTime, Utc};
use projectdesk_core::domain::{Project, Task, format_team};
use projectdesk_core::external::{Comment, Post, User};
use projectdesk_core::views::{ProjectCounts, TaskStats, is_overdue};

pub fn project_line(p: &Project) -> String {
    format!(
        "  {} - {} [{}, {} priority] {} to {}",
        p.id, p.name, p.status, p.priority, p.start_date, p.end_date
    )
}

pub fn project_detail(p: &Project) -> Vec<String> {
    let mut lines = vec![
        format!("Project: {}", p.name),
        format!("  ID: {}", p.id),
        format!("  Status: {}", p.status),
        format!("  Priority: {}", p.priority),
        format!("  Dates: {} to {}", p.start_date, p.end_date),
        format!("  Description: {}", p.description),
    ];
    if p.team.is_empty() {
        lines.push("  Team: (none)".to_string());
    } else {
        lines.push(format!("  Team: {}", format_team(&p.team)));
    }
    lines
}

pub fn task_line(t: &Task, now: DateTime<Utc>) -> String {
    let due = t
        .due_date
        .map(|d| format!(" due {d}"))
        .unwrap_or_default();
    let overdue = if is_overdue(t, now) { " [overdue]" } else { "" };
    format!(
        "  #{} {} [{}] - {} (project {}){}{}",
        t.id, t.title, t.status, t.assignee, t.project_id, due, overdue
    )
}

pub fn progress_line(stats: &TaskStats) -> String {
    format!(
        "Progress: {}% ({} of {} completed, {} in progress, {} pending)",
        stats.progress_percent(),
        stats.completed,
        stats.total,
        stats.in_progress,
        stats.pending
    )
}

pub fn counts_lines(counts: &ProjectCounts, tasks: &TaskStats) -> Vec<String> {
    vec![
        format!("Projects: {}", counts.total),
        format!("  In progress: {}", counts.in_progress),
        format!("  Completed: {}", counts.completed),
        format!("Tasks: {}", tasks.total),
        format!("  Completed: {}", tasks.completed),
        format!("  In progress: {}", tasks.in_progress),
        format!("  Pending: {}", tasks.pending),
    ]
}

pub fn user_line(u: &User) -> String {
    let company = u
        .company
        .as_ref()
        .map(|c| format!(" - {}", c.name))
        .unwrap_or_default();
    format!("  {} {} <{}>{}", u.id, u.name, u.email, company)
}

pub fn post_line(p: &Post) -> String {
    format!("  #{} (user {}) {}", p.id, p.user_id, p.title)
}

pub fn comment_lines(c: &Comment) -> Vec<String> {
    vec![
        format!("  #{} {} <{}>", c.id, c.name, c.email),
        format!("    {}", c.body.replace('\n', " ")),
    ]
}
