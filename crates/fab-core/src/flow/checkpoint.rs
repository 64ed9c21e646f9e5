//! Checkpoint: el par (cursor, estado) que habilita re-ejecución parcial.

use serde::{Deserialize, Serialize};

use crate::model::DesignState;

/// Persistido tras cada avance del flow. Una corrida posterior puede
/// sembrarse desde aquí sin repetir steps ya exitosos, siempre que la
/// definición del flow (hash) coincida.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub cursor: usize,
    pub definition_hash: String,
    pub state: DesignState,
}
