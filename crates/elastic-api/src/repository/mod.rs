//! Resource repositories binding a path prefix to the client verbs.

mod auth;
mod base;
mod habits;

pub use auth::AuthRepository;
pub use base::Repository;
pub use habits::HabitsRepository;
