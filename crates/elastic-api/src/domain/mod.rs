//! Payload types exchanged with the habits backend.

mod auth;
mod habit;

pub use auth::{AuthResponse, AuthUser, LoginCredentials, RefreshTokenRequest, RegisterRequest};
pub use habit::{Activity, Habit, HabitInput, HabitStats, TrackingEntry, TrackingKey};
