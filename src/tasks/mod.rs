//! Background Tasks Module
//!
//! Contains background tasks that run alongside client operations.
//!
//! # Tasks
//! - Sweeper: Removes expired cache entries at configured intervals

mod sweeper;

pub use sweeper::{spawn_sweeper, spawn_sweeper_from_config};
