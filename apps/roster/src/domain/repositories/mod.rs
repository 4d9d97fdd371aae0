// Repository ports
// Implemented in infrastructure::repositories

pub mod member_repository;

pub use member_repository::MemberRepository;
