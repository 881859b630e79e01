//! Tasks and their role-tagged memberships.
//!
//! The centre of this module is [`services::TaskCreationService`], which
//! persists a task, its creator link and its assignee links in one unit of
//! work. Everything is split the hexagonal way:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
