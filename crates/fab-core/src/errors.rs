//! Errores del motor.
//!
//! Un enum por frontera: configuración, step, flow, proceso externo y store.
//! Nada se traga silenciosamente; cada variante lleva el contexto necesario
//! para reproducir (step, variable, exit code). `StepError` es serializable
//! porque viaja dentro del journal de eventos.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use fab_domain::DesignFormat;

/// Una violación individual detectada al construir la configuración.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Variable (o clave cruda) afectada.
    pub variable: String,
    pub message: String,
}

impl Violation {
    pub fn new(variable: impl Into<String>, message: impl Into<String>) -> Self {
        Self { variable: variable.into(), message: message.into() }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.variable, self.message)
    }
}

/// Errores de construcción de configuración. `Invalid` agrupa todas las
/// violaciones del input completo en un solo error (validación atómica).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("configuration invalid ({} violation(s)):\n{}", violations.len(), render(violations))]
    Invalid { violations: Vec<Violation> },
    #[error("variable '{name}' declared by both '{first}' and '{second}' with different descriptors")]
    DuplicateVariable { name: String, first: String, second: String },
    #[error("cannot read configuration file {path}: {detail}")]
    Read { path: PathBuf, detail: String },
    #[error("configuration file {path} is not a JSON object")]
    NotAnObject { path: PathBuf },
}

fn render(violations: &[Violation]) -> String {
    violations.iter().map(|v| format!("  - {v}")).collect::<Vec<_>>().join("\n")
}

/// Fallos de un step, con kind distinguible (contrato de §fallos).
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum StepError {
    #[error("step '{step}': missing required input '{format}'")]
    MissingInput { step: String, format: DesignFormat },
    #[error("step '{step}': input '{format}' invalid: {detail}")]
    InvalidInput { step: String, format: DesignFormat, detail: String },
    #[error("step '{step}': tool '{tool}' exited with code {code}")]
    Tool { step: String, tool: String, code: i32 },
    #[error("step '{step}': tool '{tool}' killed after {seconds}s timeout")]
    Timeout { step: String, tool: String, seconds: u64 },
    #[error("step '{step}': output contract violated: {detail}")]
    OutputContract { step: String, detail: String },
    #[error("step '{step}': io error: {detail}")]
    Io { step: String, detail: String },
    #[error("internal: {0}")]
    Internal(String),
}

impl StepError {
    /// Traduce un fallo del bridge de procesos al contrato del step.
    pub fn from_exec(step: &str, err: ExecError) -> Self {
        match err {
            ExecError::Exit { program, code } => StepError::Tool { step: step.to_string(), tool: program, code },
            ExecError::Killed { program } => StepError::Tool { step: step.to_string(), tool: program, code: -1 },
            ExecError::Timeout { program, seconds } => {
                StepError::Timeout { step: step.to_string(), tool: program, seconds }
            }
            ExecError::Spawn { program, detail } => {
                StepError::Io { step: step.to_string(), detail: format!("cannot spawn '{program}': {detail}") }
            }
            ExecError::Io { detail } => StepError::Io { step: step.to_string(), detail },
        }
    }

    pub fn io(step: &str, err: std::io::Error) -> Self {
        StepError::Io { step: step.to_string(), detail: err.to_string() }
    }
}

/// Errores del bridge hacia herramientas externas.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExecError {
    #[error("cannot spawn '{program}': {detail}")]
    Spawn { program: String, detail: String },
    #[error("'{program}' exited with code {code}")]
    Exit { program: String, code: i32 },
    #[error("'{program}' terminated by signal")]
    Killed { program: String },
    #[error("'{program}' killed after {seconds}s timeout")]
    Timeout { program: String, seconds: u64 },
    #[error("io error: {detail}")]
    Io { detail: String },
}

/// Errores de persistencia (run directory / checkpoints).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("io error at {path}: {detail}")]
    Io { path: PathBuf, detail: String },
    #[error("encode error: {detail}")]
    Encode { detail: String },
    #[error("decode error at {path}: {detail}")]
    Decode { path: PathBuf, detail: String },
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        StoreError::Io { path: path.into(), detail: err.to_string() }
    }
}

/// Errores del secuenciador.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("flow already completed")]
    Completed,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("step '{step}' failed")]
    Step {
        step: String,
        #[source]
        source: StepError,
    },
    #[error("no step matches selector '{0}'")]
    UnknownStep(String),
    #[error("invalid range: {0}")]
    InvalidRange(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("checkpoint belongs to another flow (expected {expected}, found {found})")]
    CheckpointMismatch { expected: String, found: String },
    #[error("variant fan-out produced no usable result: {0}")]
    FanOut(String),
    #[error("internal: {0}")]
    Internal(String),
}
