//! Journal de eventos del flow.

pub mod store;
pub mod types;

pub use store::{EventStore, InMemoryEventStore};
pub use types::{FlowEvent, FlowEventKind};
