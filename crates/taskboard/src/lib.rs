//! Taskboard - role-based task tracking with task dependencies.
//!
//! This crate provides the core of the taskboard service: domain types, the
//! storage abstraction with an in-memory (optionally JSONL-backed) backend,
//! and the services that sit on top of it:
//!
//! - [`engine::DependencyEngine`] maintains the acyclic dependency graph and
//!   answers completion-readiness queries.
//! - [`service::TaskService`] runs the task lifecycle (creation, updates,
//!   status transitions, deletion) under the same serialization point.
//! - [`access`] holds the role rules shared by both.

#![forbid(unsafe_code)]

pub mod access;
pub mod cycle;
pub mod domain;
pub mod engine;
pub mod error;
pub mod service;
pub mod storage;
pub mod users;

pub use engine::DependencyEngine;
pub use error::{Error, Result};
pub use service::TaskService;
pub use storage::SharedStorage;
