//! Interactive shell over one in-process store
//!
//! Mutations go through the store and the shell prints whatever notices the
//! store recorded, then clears them, the way a UI would show and dismiss a toast.

use std::collections::BTreeMap;
use std::str::FromStr;

use anyhow::{Context, anyhow, bail};
use chrono::{NaiveDate, Utc};
use projectdesk_core::config::Config;
use projectdesk_core::domain::{
    NewProject, NewTask, Priority, ProjectPatch, ProjectStatus, TaskPatch, TaskStatus, parse_team,
};
use projectdesk_core::store::{AppStore, StoreState};
use projectdesk_core::views::{
    ProjectFilter, TaskStats, filter_projects, project_counts, task_stats,
};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::render;

const PROMPT: &str = "projectdesk> ";

const HELP: &[&str] = &[
    "Commands:",
    "  list [text]                       list projects, optionally matching text",
    "  show <id>                         project details, tasks and progress",
    "  tasks [project-id]                list tasks",
    "  stats                             aggregate counts",
    "  add-project name=.. description=.. start=YYYY-MM-DD end=YYYY-MM-DD",
    "              [status=..] [priority=..] [team=\"A, B\"]",
    "  edit-project <id> field=value ...",
    "  rm-project <id>                   delete a project and its tasks",
    "  add-task project=<id> title=.. assignee=.. [description=..] [status=..] [due=YYYY-MM-DD]",
    "  edit-task <id> field=value ...    empty description= or due= clears the field",
    "  rm-task <id>",
    "  reset                             restore the seed records",
    "  help, quit",
];

/// What the loop should do after a line
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    Output(Vec<String>),
    Quit,
}

pub async fn run(config: &Config) -> anyhow::Result<()> {
    let shell = Shell::new(AppStore::from_config(&config.mock));
    shell.store.load_all().await?;

    let mut editor = DefaultEditor::new().context("Failed to start line editor")?;
    println!("Projectdesk shell. Type `help` for commands, `quit` to leave.");

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if let Err(e) = editor.add_history_entry(line) {
                    debug!(error = %e, "Could not record history");
                }
                match shell.execute(line).await {
                    Reply::Output(lines) => {
                        for line in lines {
                            println!("{line}");
                        }
                    }
                    Reply::Quit => break,
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

pub struct Shell {
    store: AppStore,
}

impl Shell {
    pub fn new(store: AppStore) -> Self {
        Self { store }
    }

    pub async fn execute(&self, line: &str) -> Reply {
        let args = match split_args(line) {
            Ok(args) => args,
            Err(e) => return Reply::Output(vec![format!("error: {e}")]),
        };
        let Some((command, rest)) = args.split_first() else {
            return Reply::Output(Vec::new());
        };

        let result = match command.as_str() {
            "quit" | "exit" => return Reply::Quit,
            "help" => Ok(HELP.iter().map(|s| s.to_string()).collect()),
            "list" => Ok(self.list(rest)),
            "show" => self.show(rest),
            "tasks" => self.tasks(rest),
            "stats" => Ok(self.stats()),
            "add-project" => self.add_project(rest).await,
            "edit-project" => self.edit_project(rest).await,
            "rm-project" => self.remove_project(rest).await,
            "add-task" => self.add_task(rest).await,
            "edit-task" => self.edit_task(rest).await,
            "rm-task" => self.remove_task(rest).await,
            "reset" => self.reset().await,
            other => Err(anyhow!("unknown command `{other}`, type `help`")),
        };

        match result {
            Ok(lines) => Reply::Output(lines),
            Err(e) => Reply::Output(vec![format!("error: {e}")]),
        }
    }

    fn state(&self) -> StoreState {
        self.store.state()
    }

    /// Render and dismiss the notices left by the last operation
    fn take_notices(&self) -> Vec<String> {
        let state = self.state();
        let mut lines = Vec::new();
        for notice in [&state.projects.success, &state.tasks.success]
            .into_iter()
            .flatten()
        {
            lines.push(notice.message.clone());
        }
        for notice in [&state.projects.error, &state.tasks.error]
            .into_iter()
            .flatten()
        {
            lines.push(format!("error: {}", notice.message));
        }
        self.store.clear_messages();
        self.store.clear_task_messages();
        lines
    }

    fn list(&self, args: &[String]) -> Vec<String> {
        let state = self.state();
        let filter = ProjectFilter::new().search(args.join(" "));
        let projects = filter_projects(&state.projects.items, &filter);
        if projects.is_empty() {
            return vec!["No projects found.".to_string()];
        }
        projects.into_iter().map(render::project_line).collect()
    }

    fn show(&self, args: &[String]) -> anyhow::Result<Vec<String>> {
        let id = parse_id(args, "project")?;
        let state = self.state();
        let project = state
            .projects
            .get(id)
            .ok_or_else(|| anyhow!("project {id} not found"))?;

        let tasks = state.tasks_by_project(id);
        let stats = TaskStats::from_tasks(tasks.iter().copied());
        let now = Utc::now();

        let mut lines = render::project_detail(project);
        lines.push(render::progress_line(&stats));
        lines.extend(tasks.into_iter().map(|t| render::task_line(t, now)));
        Ok(lines)
    }

    fn tasks(&self, args: &[String]) -> anyhow::Result<Vec<String>> {
        let state = self.state();
        let now = Utc::now();
        let tasks = match args.first() {
            Some(_) => state.tasks_by_project(parse_id(args, "project")?),
            None => state.tasks.items.iter().collect(),
        };
        if tasks.is_empty() {
            return Ok(vec!["No tasks found.".to_string()]);
        }
        Ok(tasks.into_iter().map(|t| render::task_line(t, now)).collect())
    }

    fn stats(&self) -> Vec<String> {
        let state = self.state();
        let mut lines = render::counts_lines(
            &project_counts(&state.projects.items),
            &TaskStats::from_tasks(&state.tasks.items),
        );
        for p in &state.projects.items {
            let stats = task_stats(&state.tasks.items, p.id);
            lines.push(format!("  {} - {}: {}%", p.id, p.name, stats.progress_percent()));
        }
        lines
    }

    async fn add_project(&self, args: &[String]) -> anyhow::Result<Vec<String>> {
        let fields = Fields::parse(
            args,
            &["name", "description", "start", "end", "status", "priority", "team"],
        )?;
        let mut new = NewProject::new(
            fields.text("name"),
            fields.text("description"),
            fields.required_date("start")?,
            fields.required_date("end")?,
        );
        if let Some(status) = fields.status()? {
            new = new.with_status(status);
        }
        if let Some(priority) = fields.priority()? {
            new = new.with_priority(priority);
        }
        if let Some(team) = fields.get("team") {
            new = new.with_team(parse_team(team));
        }

        let errors = new.form_errors();
        if !errors.is_empty() {
            return Ok(errors.iter().map(|e| format!("  {e}")).collect());
        }

        // the outcome is reported through the store's notices
        let _ = self.store.create_project(new).await;
        Ok(self.take_notices())
    }

    async fn edit_project(&self, args: &[String]) -> anyhow::Result<Vec<String>> {
        let id = parse_id(args, "project")?;
        let fields = Fields::parse(
            &args[1..],
            &["name", "description", "start", "end", "status", "priority", "team"],
        )?;

        let mut patch = ProjectPatch::new();
        if let Some(name) = fields.get("name") {
            patch = patch.name(name);
        }
        if let Some(description) = fields.get("description") {
            patch = patch.description(description);
        }
        if let Some(start) = fields.date("start")? {
            patch = patch.start_date(start);
        }
        if let Some(end) = fields.date("end")? {
            patch = patch.end_date(end);
        }
        if let Some(status) = fields.status()? {
            patch = patch.status(status);
        }
        if let Some(priority) = fields.priority()? {
            patch = patch.priority(priority);
        }
        if let Some(team) = fields.get("team") {
            patch = patch.team(parse_team(team));
        }
        if patch.is_empty() {
            bail!("nothing to change");
        }

        if let Some(current) = self.state().projects.get(id) {
            let mut preview = current.clone();
            patch.apply(&mut preview);
            let errors = preview.form_errors();
            if !errors.is_empty() {
                return Ok(errors.iter().map(|e| format!("  {e}")).collect());
            }
        }

        let _ = self.store.update_project(id, patch).await;
        Ok(self.take_notices())
    }

    async fn remove_project(&self, args: &[String]) -> anyhow::Result<Vec<String>> {
        let id = parse_id(args, "project")?;
        let _ = self.store.delete_project(id).await;
        Ok(self.take_notices())
    }

    async fn add_task(&self, args: &[String]) -> anyhow::Result<Vec<String>> {
        let fields = Fields::parse(
            args,
            &["project", "title", "assignee", "description", "status", "due"],
        )?;
        let project_id = fields
            .get("project")
            .ok_or_else(|| anyhow!("project=<id> is required"))?
            .parse()
            .context("project must be a numeric id")?;

        let mut new = NewTask::new(project_id, fields.text("title"), fields.text("assignee"));
        if let Some(description) = fields.get("description").filter(|d| !d.trim().is_empty()) {
            new = new.with_description(description);
        }
        if let Some(status) = fields.task_status()? {
            new = new.with_status(status);
        }
        if let Some(due) = fields.date("due")? {
            new = new.with_due_date(due);
        }

        let errors = new.form_errors();
        if !errors.is_empty() {
            return Ok(errors.iter().map(|e| format!("  {e}")).collect());
        }

        let _ = self.store.create_task(new).await;
        Ok(self.take_notices())
    }

    async fn edit_task(&self, args: &[String]) -> anyhow::Result<Vec<String>> {
        let id = parse_id(args, "task")?;
        let fields = Fields::parse(
            &args[1..],
            &["project", "title", "assignee", "description", "status", "due"],
        )?;

        let mut patch = TaskPatch::new();
        if let Some(project) = fields.get("project") {
            patch = patch.project(project.parse().context("project must be a numeric id")?);
        }
        if let Some(title) = fields.get("title") {
            patch = patch.title(title);
        }
        if let Some(assignee) = fields.get("assignee") {
            patch = patch.assignee(assignee);
        }
        if let Some(description) = fields.get("description") {
            let description = Some(description.trim())
                .filter(|d| !d.is_empty())
                .map(str::to_string);
            patch = patch.description(description);
        }
        if let Some(status) = fields.task_status()? {
            patch = patch.status(status);
        }
        if fields.get("due").is_some() {
            patch = patch.due_date(fields.date("due")?);
        }
        if patch.is_empty() {
            bail!("nothing to change");
        }

        let _ = self.store.update_task(id, patch).await;
        Ok(self.take_notices())
    }

    async fn remove_task(&self, args: &[String]) -> anyhow::Result<Vec<String>> {
        let id = parse_id(args, "task")?;
        let _ = self.store.delete_task(id).await;
        Ok(self.take_notices())
    }

    async fn reset(&self) -> anyhow::Result<Vec<String>> {
        self.store.reset().await;
        self.store.load_all().await?;
        Ok(vec!["Data reset to the seed records.".to_string()])
    }
}

fn parse_id(args: &[String], what: &str) -> anyhow::Result<u64> {
    let raw = args
        .first()
        .ok_or_else(|| anyhow!("missing {what} id"))?;
    raw.parse()
        .with_context(|| format!("invalid {what} id: {raw}"))
}

/// `key=value` arguments
struct Fields(BTreeMap<String, String>);

impl Fields {
    fn parse(args: &[String], allowed: &[&str]) -> anyhow::Result<Self> {
        let mut map = BTreeMap::new();
        for arg in args {
            let (key, value) = arg
                .split_once('=')
                .ok_or_else(|| anyhow!("expected field=value, got `{arg}`"))?;
            if !allowed.contains(&key) {
                bail!("unknown field `{key}` (expected one of: {})", allowed.join(", "));
            }
            map.insert(key.to_string(), value.to_string());
        }
        Ok(Self(map))
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    fn text(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    /// Empty value reads as no date
    fn date(&self, key: &str) -> anyhow::Result<Option<NaiveDate>> {
        match self.get(key).map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(Some)
                .with_context(|| format!("{key} must be a YYYY-MM-DD date, got `{raw}`")),
        }
    }

    fn required_date(&self, key: &str) -> anyhow::Result<NaiveDate> {
        self.date(key)?
            .ok_or_else(|| anyhow!("{key}=YYYY-MM-DD is required"))
    }

    fn parsed<T>(&self, key: &str) -> anyhow::Result<Option<T>>
    where
        T: FromStr<Err = projectdesk_core::Error>,
    {
        Ok(self.get(key).map(str::parse::<T>).transpose()?)
    }

    fn status(&self) -> anyhow::Result<Option<ProjectStatus>> {
        self.parsed("status")
    }

    fn task_status(&self) -> anyhow::Result<Option<TaskStatus>> {
        self.parsed("status")
    }

    fn priority(&self) -> anyhow::Result<Option<Priority>> {
        self.parsed("priority")
    }
}

/// Split a line on whitespace, keeping single- or double-quoted runs together
pub fn split_args(line: &str) -> Result<Vec<String>, String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_token = false;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    args.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if quote.is_some() {
        return Err("unterminated quote".to_string());
    }
    if in_token {
        args.push(current);
    }
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn shell() -> Shell {
        let shell = Shell::new(AppStore::seeded(Duration::ZERO));
        shell.store.load_all().await.unwrap();
        shell
    }

    async fn output(shell: &Shell, line: &str) -> Vec<String> {
        match shell.execute(line).await {
            Reply::Output(lines) => lines,
            Reply::Quit => panic!("unexpected quit"),
        }
    }

    #[test]
    fn test_split_args_handles_quotes() {
        assert_eq!(
            split_args(r#"add-project name="Site redo" team='Ana, Rui' empty="""#).unwrap(),
            vec!["add-project", "name=Site redo", "team=Ana, Rui", "empty="]
        );
        assert_eq!(split_args("   ").unwrap(), Vec::<String>::new());
        assert!(split_args("name=\"open").is_err());
    }

    #[tokio::test]
    async fn test_add_project_reports_success() {
        let shell = shell().await;
        let lines = output(
            &shell,
            r#"add-project name="Portal do Cliente" description="Self-service portal for clients" start=2024-03-01 end=2024-09-01 priority=high team="Ana, Rui""#,
        )
        .await;
        assert_eq!(lines, vec!["Project \"Portal do Cliente\" created successfully!"]);

        let state = shell.store.state();
        let created = state.projects.get(3).unwrap();
        assert_eq!(created.priority, Priority::High);
        assert_eq!(created.team, vec!["Ana".to_string(), "Rui".to_string()]);
        assert!(state.projects.success.is_none());
    }

    #[tokio::test]
    async fn test_form_errors_block_dispatch() {
        let shell = shell().await;
        let lines = output(
            &shell,
            "add-project name=ab description=short start=2024-05-01 end=2024-04-01",
        )
        .await;
        assert_eq!(lines.len(), 3);
        assert_eq!(shell.store.state().projects.items.len(), 2);
    }

    #[tokio::test]
    async fn test_rejection_is_shown_as_error() {
        let shell = shell().await;
        let lines = output(&shell, "rm-project 999").await;
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("error: "));
        assert!(lines[0].contains("999"));
    }

    #[tokio::test]
    async fn test_rm_project_cascades() {
        let shell = shell().await;
        output(&shell, "rm-project 1").await;
        assert_eq!(output(&shell, "tasks 1").await, vec!["No tasks found."]);
        assert_eq!(output(&shell, "list").await.len(), 1);
    }

    #[tokio::test]
    async fn test_task_lifecycle() {
        let shell = shell().await;
        let lines = output(
            &shell,
            "add-task project=2 title=Wireframes assignee='Carlos Souza' due=2024-03-10",
        )
        .await;
        assert_eq!(lines, vec!["Task \"Wireframes\" created successfully!"]);

        output(&shell, "edit-task 3 status=completed due=").await;
        let task = shell.store.state().tasks.get(3).cloned().unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.due_date, None);

        let lines = output(&shell, "rm-task 3").await;
        assert_eq!(lines, vec!["Task \"Wireframes\" was deleted successfully"]);
    }

    #[tokio::test]
    async fn test_list_filters_by_text() {
        let shell = shell().await;
        let lines = output(&shell, "list fitness").await;
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("App Mobile Fitness"));
    }

    #[tokio::test]
    async fn test_reset_restores_seed() {
        let shell = shell().await;
        output(&shell, "rm-project 2").await;
        output(&shell, "reset").await;
        assert_eq!(shell.store.state().projects.items.len(), 2);
    }

    #[tokio::test]
    async fn test_bad_input() {
        let shell = shell().await;
        assert!(output(&shell, "frobnicate").await[0].contains("unknown command"));
        assert!(output(&shell, "edit-project 1").await[0].contains("nothing to change"));
        assert!(output(&shell, "edit-project 1 colour=red").await[0].contains("unknown field"));
        assert!(output(&shell, "edit-project 1 status=done").await[0].contains("unknown status `done`"));
        assert!(output(&shell, "edit-project 1 priority=urgent").await[0].contains("unknown priority"));
        assert!(output(&shell, "show x").await[0].contains("invalid project id"));
        assert_eq!(shell.execute("quit").await, Reply::Quit);
    }
}
