//! Roster Library
//!
//! Member and Team entities, a typed query builder over them, and the
//! persistence contexts and repositories that execute those queries.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod query;
