//! Identity store for taskmate users.
//!
//! Users are owned by this module; the task core only reads user identifiers
//! to validate collaborators. The module follows the same hexagonal split as
//! [`crate::task`]:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;
