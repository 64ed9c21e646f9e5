//! Tipos de evento del flow y estructura `FlowEvent`.
//!
//! Rol en el flujo:
//! - Cada corrida emite eventos a un `EventStore` append-only.
//! - El journal es el registro de observabilidad del run directory: permite
//!   reconstruir qué pasó (y con qué fingerprints) sin depender de estructuras
//!   mutables del motor.
//! - `FlowEventKind` es el contrato observable y estable del motor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::StepError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FlowEventKind {
    /// Emisión inicial de una corrida: fija `definition_hash` y cantidad de
    /// steps. Invariante: debe ser el primer evento de un `run_id`.
    FlowInitialized { definition_hash: String, step_count: usize },
    /// Un step comenzó su ejecución. No implica éxito.
    StepStarted { ordinal: usize, step_id: String },
    /// Un step terminó correctamente; el fingerprint es la identidad
    /// estructural del estado de salida.
    StepFinished {
        ordinal: usize,
        step_id: String,
        state_fingerprint: String,
    },
    /// Un step fuera del rango seleccionado reutilizó su salida persistida.
    StepReused { ordinal: usize, step_id: String },
    /// Un step terminó con error terminal. El flow no continúa
    /// (stop-on-failure).
    StepFailed {
        ordinal: usize,
        step_id: String,
        error: StepError,
    },
    /// Cierre normal con fingerprint agregado de la corrida.
    FlowCompleted { flow_fingerprint: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowEvent {
    pub seq: u64, // asignado por el EventStore (orden de append)
    pub run_id: Uuid,
    pub kind: FlowEventKind,
    pub ts: DateTime<Utc>, // metadato (no entra en ningún fingerprint)
}
