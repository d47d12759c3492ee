//! Process-level orchestration
//!
//! `controller` owns the platform layer for the lifetime of the process;
//! `state` holds the lifecycle state machines of managers and contexts.

pub mod controller;
pub mod state;

pub use controller::{AppError, Application};
pub use state::{ContextEvent, ContextState, LifecycleEvent, ManagerState, StateMachine};
