//! Core types and application wiring for the smartbin waste monitoring client.

/// Map layer projection of bins, routes, and the vehicle.
pub mod map;
/// Domain models and identifiers.
pub mod model;
/// Time-driven navigation simulation.
pub mod navigation;
/// Short-lived user notifications.
pub mod notify;
/// Trait describing the backend gateway.
pub mod ports;
/// In-memory bin collection.
pub mod registry;
/// Backend requests and their responses.
pub mod request;
/// Recurring timers and the events they emit.
pub mod scheduler;
/// Application context used by front ends.
pub mod service;

pub use model::*;
pub use ports::*;
pub use service::*;
