// Team domain module
// Contains the team entity, its identity, query paths and domain events

#![allow(clippy::module_inception)]

pub mod events;
pub mod paths;
pub mod team;
pub mod value_objects;

// Re-export main types for convenience
pub use events::TeamEvent;
pub use paths::{QTeam, TEAM};
pub use team::Team;
pub use value_objects::TeamId;
