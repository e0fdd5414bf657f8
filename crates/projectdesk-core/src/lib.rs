//! Projectdesk Core Library
//!
//! This crate provides the core functionality for Projectdesk, including:
//! - Domain model (projects, tasks, form validation)
//! - Mock backend (in-memory collections with simulated latency)
//! - External API access (HTTP client + read-through cache)
//! - Application store (slices with pending/fulfilled/rejected transitions)
//! - Derived views (filters, counts, progress, overdue tasks)

pub mod config;
pub mod domain;
pub mod error;
pub mod external;
pub mod mock;
pub mod store;
pub mod views;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::domain::{
        NewProject, NewTask, Priority, Project, ProjectId, ProjectPatch, ProjectStatus, Task,
        TaskId, TaskPatch, TaskStatus,
    };
    pub use crate::error::{Error, Result};
    pub use crate::external::{ExternalCache, ExternalSource};
    pub use crate::mock::MockApi;
    pub use crate::store::{AppStore, StoreState};
    pub use crate::views::{Filter, ProjectFilter};
}
