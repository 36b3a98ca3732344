// Re-export core modules for use by the binary or other consumers
pub mod config;
pub mod core;
pub mod library;
pub mod rules;
pub mod simulation;
pub mod systems;
pub mod ui;

// Expose the rule-set registry and the types needed to drive it
pub use crate::core::serialization::RuleSetData;
pub use crate::core::world::World;
pub use crate::library::{JsonLibrary, LibraryError, RuleSetRepository, SqliteLibrary};
pub use crate::rules::{ActionResult, RuleError, Value, ValueKind};
pub use crate::simulation::event::{EndCondition, EventStatus, TurnUnit};
