// Member domain module
// Contains the member entity, its identity and query paths

#![allow(clippy::module_inception)]

pub mod member;
pub mod paths;
pub mod value_objects;

pub use member::Member;
pub use paths::{QMember, MEMBER};
pub use value_objects::MemberId;
