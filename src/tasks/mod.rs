//! Background Tasks Module
//!
//! Contains background tasks that run alongside a shared store.
//!
//! # Tasks
//! - Retirement: drains queued retirement passes when puts signal work

mod retirement;

pub use retirement::spawn_retirement_task;
