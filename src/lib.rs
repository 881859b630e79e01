//! Taskmate: a task collaboration backend.
//!
//! Users create tasks and assign other users as collaborators. Creating a
//! task is a single atomic operation: the task, the creator's membership and
//! every assignee membership are committed together or not at all.
//!
//! # Architecture
//!
//! Taskmate follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (in-memory, `PostgreSQL`)
//!
//! # Modules
//!
//! - [`identity`]: User accounts referenced by tasks
//! - [`task`]: Task creation, membership links and lookups
//! - [`database`]: `PostgreSQL` connection configuration

pub mod database;
pub mod identity;
pub mod task;
