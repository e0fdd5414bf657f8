//! Form-level field checks and team list helpers

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

/// A single field failure as a form would display it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    /// `Ok(())` when empty, otherwise one `Validation` error listing every message
    pub fn into_result(errors: Vec<FieldError>) -> Result<()> {
        if errors.is_empty() {
            return Ok(());
        }
        let joined = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        Err(Error::Validation(joined))
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub(crate) fn check_required(field: &'static str, label: &str, value: &str) -> Option<FieldError> {
    if value.trim().is_empty() {
        Some(FieldError::new(field, format!("{label} is required")))
    } else {
        None
    }
}

pub(crate) fn check_min_len(
    field: &'static str,
    label: &str,
    value: &str,
    min: usize,
) -> Option<FieldError> {
    if value.trim().chars().count() < min {
        Some(FieldError::new(
            field,
            format!("{label} must be at least {min} characters"),
        ))
    } else {
        None
    }
}

/// Split a comma-separated member list, dropping blanks
pub fn parse_team(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Inverse of [`parse_team`] for editing
pub fn format_team(team: &[String]) -> String {
    team.join(", ")
}
