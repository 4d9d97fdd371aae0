// Domain layer module exports
// Entities, their typed query paths, and the ports infrastructure implements

pub mod member;
pub mod persistence;
pub mod repositories;
pub mod team;
