//! App layer - tab sessions and the orchestrator around them
//!
//! The App actor owns every [`TabSession`], receives UI events and exchange
//! results, updates state, and emits render state.

pub mod state;
pub mod actor;
pub mod commands;
pub mod session;

pub use state::AppState;
pub use actor::AppActor;
pub use session::{EditableField, SendPhase, SessionEvent, TabSession};
