//! Taskdeck: a task tracker whose JSON endpoints sit behind a read-through
//! cache with tag-based invalidation and a soft-delete lifecycle.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
