//! Modelos del motor: estado inmutable del diseño.

pub mod state;

pub use state::{DesignState, StateDiff, StateView};
