//! Contexto de ejecución entregado a `Step::run`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;

/// Todo lo que un step puede ver: configuración compartida read-only, su
/// sandbox y su posición en el flow. No hay acceso al estado de otros steps
/// salvo por las rutas registradas en el estado de entrada.
#[derive(Debug, Clone)]
pub struct StepContext {
    config: Arc<Config>,
    step_dir: PathBuf,
    ordinal: usize,
    timeout: Option<Duration>,
}

impl StepContext {
    pub fn new(config: Arc<Config>, step_dir: PathBuf, ordinal: usize) -> Self {
        let timeout = config.number("TOOL_TIMEOUT_SECS")
                            .filter(|s| *s > 0.0)
                            .map(Duration::from_secs_f64);
        Self { config, step_dir, ordinal, timeout }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn shared_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Sandbox propio del step: el único lugar donde puede escribir.
    pub fn step_dir(&self) -> &Path {
        &self.step_dir
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Presupuesto de pared para una invocación de herramienta externa.
    pub fn tool_timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
