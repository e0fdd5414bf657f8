//! Projectdesk CLI - projects, tasks and the demo REST API

mod render;
mod shell;

use chrono::Utc;
use clap::{Parser, Subcommand};
use projectdesk_core::Error;
use projectdesk_core::config::Config;
use projectdesk_core::domain::{Priority, ProjectId, ProjectStatus};
use projectdesk_core::external::{ExternalCache, PostId, UserId};
use projectdesk_core::store::AppStore;
use projectdesk_core::views::{
    Filter, ProjectFilter, TaskStats, filter_projects, overdue_tasks, project_counts, task_stats,
};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

#[derive(Parser)]
#[command(name = "projectdesk")]
#[command(author, version, about = "Project and task tracker over a simulated backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage projects
    Projects {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Manage tasks
    Tasks {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Aggregate project and task counts
    Stats,

    /// Team members from the demo API
    Users {
        /// Maximum number of users to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Recent posts from the demo API
    Posts {
        /// Maximum number of posts to show
        #[arg(short, long)]
        limit: Option<usize>,
        /// Only posts written by this user
        #[arg(short, long)]
        user: Option<UserId>,
    },

    /// Comments on a post from the demo API
    Comments { post_id: PostId },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Interactive session over one in-process store
    Shell,
}

#[derive(Subcommand)]
enum ProjectAction {
    /// List projects, optionally filtered
    List {
        /// Case-insensitive text matched against name and description
        #[arg(short, long)]
        search: Option<String>,
        /// Status filter (planning, in-progress, completed, paused, all)
        #[arg(long, value_parser = parse_status_filter, default_value = "all")]
        status: Filter<ProjectStatus>,
        /// Priority filter (low, medium, high, all)
        #[arg(long, value_parser = parse_priority_filter, default_value = "all")]
        priority: Filter<Priority>,
    },
    /// Show a project with its tasks and progress
    Show { id: ProjectId },
}

#[derive(Subcommand)]
enum TaskAction {
    /// List tasks
    List {
        /// Only tasks of this project
        #[arg(short, long)]
        project: Option<ProjectId>,
        /// Only open tasks past their due date
        #[arg(long)]
        overdue: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
    /// Reset to defaults
    Reset,
    /// Print the config file path
    Path,
}

/// `all` means no filter
fn parse_status_filter(s: &str) -> Result<Filter<ProjectStatus>, String> {
    if s.trim().eq_ignore_ascii_case("all") {
        return Ok(Filter::All);
    }
    s.parse::<ProjectStatus>().map(Filter::Only).map_err(|_| {
        format!("unknown status '{s}' (expected planning, in-progress, completed, paused or all)")
    })
}

fn parse_priority_filter(s: &str) -> Result<Filter<Priority>, String> {
    if s.trim().eq_ignore_ascii_case("all") {
        return Ok(Filter::All);
    }
    s.parse::<Priority>()
        .map(Filter::Only)
        .map_err(|_| format!("unknown priority '{s}' (expected low, medium, high or all)"))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let directive = if cli.verbose {
        "projectdesk=debug"
    } else {
        "projectdesk=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Config { action } => cmd_config(action, cli.quiet),
        command => run(command, cli.format, cli.quiet).await,
    }
}

async fn run(command: Commands, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    debug!(latency_ms = config.mock.latency_ms, "Loaded configuration");

    match command {
        Commands::Projects { action } => cmd_projects(&config, action, format).await,
        Commands::Tasks { action } => cmd_tasks(&config, action, format, quiet).await,
        Commands::Stats => cmd_stats(&config, format).await,
        Commands::Users { limit } => cmd_users(&config, limit, format).await,
        Commands::Posts { limit, user } => cmd_posts(&config, limit, user, format).await,
        Commands::Comments { post_id } => cmd_comments(&config, post_id, format).await,
        Commands::Shell => shell::run(&config).await,
        Commands::Config { action } => cmd_config(action, quiet),
    }
}

/// Fresh seeded store with both slices loaded
async fn load_store(config: &Config) -> anyhow::Result<AppStore> {
    let store = AppStore::from_config(&config.mock);
    store.load_all().await?;
    Ok(store)
}

async fn cmd_projects(
    config: &Config,
    action: ProjectAction,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let store = load_store(config).await?;
    let state = store.state();

    match action {
        ProjectAction::List {
            search,
            status,
            priority,
        } => {
            let filter = ProjectFilter::new()
                .search(search.unwrap_or_default())
                .status(status)
                .priority(priority);
            let projects = filter_projects(&state.projects.items, &filter);

            if format == OutputFormat::Json {
                return print_json(&projects);
            }
            if projects.is_empty() {
                println!("No projects found.");
            } else {
                println!("Projects:");
                for p in projects {
                    println!("{}", render::project_line(p));
                }
            }
        }
        ProjectAction::Show { id } => {
            let project = state
                .projects
                .get(id)
                .cloned()
                .ok_or(Error::ProjectNotFound(id))?;
            let tasks = store.tasks_by_project(id);
            let stats = TaskStats::from_tasks(&tasks);

            if format == OutputFormat::Json {
                return print_json(&json!({
                    "project": project,
                    "tasks": tasks,
                    "stats": stats,
                    "progress": stats.progress_percent(),
                }));
            }
            for line in render::project_detail(&project) {
                println!("{line}");
            }
            println!();
            println!("{}", render::progress_line(&stats));
            if tasks.is_empty() {
                println!("No tasks yet.");
            } else {
                println!("Tasks:");
                let now = Utc::now();
                for t in &tasks {
                    println!("{}", render::task_line(t, now));
                }
            }
        }
    }
    Ok(())
}

async fn cmd_tasks(
    config: &Config,
    action: TaskAction,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let store = load_store(config).await?;
    let TaskAction::List { project, overdue } = action;

    let state = store.state();
    let all = match project {
        // surface a NotFound instead of an empty list
        Some(id) if state.projects.get(id).is_none() => {
            return Err(Error::ProjectNotFound(id).into());
        }
        Some(id) => store.tasks_by_project(id),
        None => state.tasks.items,
    };
    let now = Utc::now();
    let tasks: Vec<_> = if overdue {
        overdue_tasks(&all, now).into_iter().cloned().collect()
    } else {
        all
    };

    if format == OutputFormat::Json {
        return print_json(&tasks);
    }
    if tasks.is_empty() {
        if !quiet {
            println!("No tasks found.");
        }
        return Ok(());
    }
    println!("Tasks:");
    for t in &tasks {
        println!("{}", render::task_line(t, now));
    }
    Ok(())
}

async fn cmd_stats(config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let store = load_store(config).await?;
    let state = store.state();
    let counts = project_counts(&state.projects.items);
    let tasks = TaskStats::from_tasks(&state.tasks.items);

    if format == OutputFormat::Json {
        let per_project: Vec<_> = state
            .projects
            .items
            .iter()
            .map(|p| {
                let stats = task_stats(&state.tasks.items, p.id);
                json!({ "projectId": p.id, "name": p.name, "progress": stats.progress_percent() })
            })
            .collect();
        return print_json(&json!({
            "projects": counts,
            "tasks": tasks,
            "progress": per_project,
        }));
    }

    for line in render::counts_lines(&counts, &tasks) {
        println!("{line}");
    }
    println!("Progress by project:");
    for p in &state.projects.items {
        let stats = task_stats(&state.tasks.items, p.id);
        println!("  {} - {}: {}%", p.id, p.name, stats.progress_percent());
    }
    Ok(())
}

async fn cmd_users(config: &Config, limit: Option<usize>, format: OutputFormat) -> anyhow::Result<()> {
    let cache = ExternalCache::from_config(&config.external)?;
    let users = cache
        .team_members(limit.unwrap_or(config.external.members_limit))
        .await?;

    if format == OutputFormat::Json {
        return print_json(&users);
    }
    println!("Team members:");
    for u in &users {
        println!("{}", render::user_line(u));
    }
    Ok(())
}

async fn cmd_posts(
    config: &Config,
    limit: Option<usize>,
    user: Option<UserId>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let cache = ExternalCache::from_config(&config.external)?;
    let limit = limit.unwrap_or(config.external.posts_limit);
    let posts = match user {
        Some(user_id) => {
            let mut posts = cache.posts_by_user(user_id).await?;
            posts.truncate(limit);
            posts
        }
        None => cache.recent_posts(limit).await?,
    };

    if format == OutputFormat::Json {
        return print_json(&posts);
    }
    if posts.is_empty() {
        println!("No posts found.");
        return Ok(());
    }
    println!("Posts:");
    for p in &posts {
        println!("{}", render::post_line(p));
    }
    Ok(())
}

async fn cmd_comments(config: &Config, post_id: PostId, format: OutputFormat) -> anyhow::Result<()> {
    let cache = ExternalCache::from_config(&config.external)?;
    let comments = cache.comments(post_id).await?;

    if format == OutputFormat::Json {
        return print_json(&comments);
    }
    println!("Comments on post {post_id}:");
    for c in &comments {
        for line in render::comment_lines(c) {
            println!("{line}");
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_from(&Config::config_path()?)?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, config.get(&key)?);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            for (key, value) in config.list()? {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
