//! Task status and priority enums with the canonical status → progress mapping
//!
//! Progress percentages are assigned by workflow stage, not measured:
//! a task under review counts as 90% done, a blocked task holds at 25%.
//! The mapping is total over arbitrary input strings so that a bad status
//! value in the database can never fail a progress roll-up.

use serde::{Deserialize, Serialize};

/// Production status of a task
///
/// Each status carries a canonical progress percentage:
/// - NotStarted: 0
/// - InProgress: 50
/// - UnderReview: 90
/// - Completed: 100
/// - Blocked: 25 (some work done, currently stalled)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// No work performed yet
    NotStarted,

    /// Actively being worked
    InProgress,

    /// Work finished, awaiting review sign-off
    UnderReview,

    /// Reviewed and accepted
    Completed,

    /// Stalled on an external dependency
    Blocked,
}

impl TaskStatus {
    /// Canonical progress percentage for this status
    pub fn progress_percent(&self) -> i64 {
        match self {
            TaskStatus::NotStarted => 0,
            TaskStatus::InProgress => 50,
            TaskStatus::UnderReview => 90,
            TaskStatus::Completed => 100,
            TaskStatus::Blocked => 25,
        }
    }

    /// Parse status from string (from database or API)
    ///
    /// Accepts canonical snake_case values plus hyphenated aliases:
    /// - 'not_started', 'not-started'
    /// - 'in_progress', 'in-progress'
    /// - 'under_review', 'under-review'
    /// - 'completed'
    /// - 'blocked'
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "not_started" | "not-started" => Some(TaskStatus::NotStarted),
            "in_progress" | "in-progress" => Some(TaskStatus::InProgress),
            "under_review" | "under-review" => Some(TaskStatus::UnderReview),
            "completed" => Some(TaskStatus::Completed),
            "blocked" => Some(TaskStatus::Blocked),
            _ => None,
        }
    }

    /// Convert to database string representation
    ///
    /// Returns canonical database value (lowercase, underscored)
    pub fn to_db_string(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::UnderReview => "under_review",
            TaskStatus::Completed => "completed",
            TaskStatus::Blocked => "blocked",
        }
    }

    /// Get human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "Not Started",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::UnderReview => "Under Review",
            TaskStatus::Completed => "Completed",
            TaskStatus::Blocked => "Blocked",
        }
    }

    /// Get all available status variants
    ///
    /// Useful for UI dropdowns and validation
    pub fn all_variants() -> &'static [TaskStatus] {
        &[
            TaskStatus::NotStarted,
            TaskStatus::InProgress,
            TaskStatus::UnderReview,
            TaskStatus::Completed,
            TaskStatus::Blocked,
        ]
    }
}

impl Default for TaskStatus {
    /// New tasks start as NotStarted
    fn default() -> Self {
        TaskStatus::NotStarted
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Total status → progress mapping over arbitrary strings
///
/// Unrecognized or malformed status values map to 0 rather than erroring,
/// so aggregation keeps working over dirty data.
pub fn progress_for_status(status: &str) -> i64 {
    TaskStatus::from_str(status)
        .map(|s| s.progress_percent())
        .unwrap_or(0)
}

/// Scheduling priority of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    /// Parse priority from string (from database or API)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(TaskPriority::Low),
            "medium" => Some(TaskPriority::Medium),
            "high" => Some(TaskPriority::High),
            "urgent" => Some(TaskPriority::Urgent),
            _ => None,
        }
    }

    /// Convert to database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }

    /// Get human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
            TaskPriority::Urgent => "Urgent",
        }
    }

    /// Get all available priority variants
    pub fn all_variants() -> &'static [TaskPriority] {
        &[
            TaskPriority::Low,
            TaskPriority::Medium,
            TaskPriority::High,
            TaskPriority::Urgent,
        ]
    }
}

impl Default for TaskPriority {
    /// Bulk-generated and unspecified tasks default to Medium
    fn default() -> Self {
        TaskPriority::Medium
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
