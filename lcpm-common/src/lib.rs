//! # LCPM Common Library
//!
//! Shared code for the Learning Content Production Manager including:
//! - Database models and schema initialization
//! - Event types (LcpmEvent enum) and the EventBus
//! - Task status and priority enums with progress mapping
//! - Weight validation and even distribution
//! - Weighted progress rollup across the content hierarchy
//! - Bulk task generation planning
//! - Configuration loading

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod generate;
pub mod progress;
pub mod status;
pub mod weights;

pub use error::{Error, Result};
pub use status::{TaskPriority, TaskStatus};
