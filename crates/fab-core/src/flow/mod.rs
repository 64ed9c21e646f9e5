//! Secuenciador de flows.

pub mod checkpoint;
pub mod fanout;
pub mod range;
pub mod sequencer;

pub use checkpoint::Checkpoint;
pub use fanout::{evaluate_variants, Objective, Variant};
pub use range::{FlowRange, StepSelector};
pub use sequencer::Flow;
