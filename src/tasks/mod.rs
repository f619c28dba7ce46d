//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Usage Report: Logs memory cache usage at configured intervals

mod report;

pub use report::spawn_usage_report_task;
