// Infrastructure layer module
// Contains persistence contexts and repository adapters
// Follows Hexagonal Architecture

pub mod persistence;
pub mod repositories;
