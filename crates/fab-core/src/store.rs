//! Puerto de persistencia del run directory.
//!
//! El motor no conoce el layout final en disco: habla con un `RunStore` que
//! resuelve sandboxes por step, checkpoints y agregados. La implementación de
//! filesystem completa vive en `fab-persistence`; aquí hay una variante
//! scratch para tests y corridas efímeras (checkpoint y métricas en memoria,
//! sandboxes bajo una raíz provista).

use indexmap::IndexMap;
use serde_json::Value as Json;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::constants::STATE_OUT_FILE;
use crate::errors::StoreError;
use crate::flow::Checkpoint;
use crate::model::DesignState;

/// Nombre de sandbox de un step: ordinal + identidad slugificada.
pub fn step_dir_name(ordinal: usize, step_id: &str) -> String {
    format!("{:02}-{}", ordinal + 1, slugify(step_id))
}

/// Slug estable: minúsculas, alfanumérico y guiones, sin repeticiones.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_dash = true;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Puerto de persistencia de una corrida.
pub trait RunStore {
    /// Raíz de la corrida (directorio compartido único; la disciplina
    /// sandbox-por-step es lo que permite sub-flows concurrentes sin locks).
    fn root(&self) -> &Path;

    /// Crea (o reutiliza al reanudar) el sandbox del step.
    fn step_dir(&mut self, ordinal: usize, step_id: &str) -> Result<PathBuf, StoreError>;

    /// Sandbox ya existente de una corrida previa, sin crear nada.
    fn find_step_dir(&self, ordinal: usize, step_id: &str) -> Option<PathBuf>;

    fn save_checkpoint(&mut self, checkpoint: &Checkpoint) -> Result<(), StoreError>;

    fn load_checkpoint(&self) -> Result<Option<Checkpoint>, StoreError>;

    fn save_resolved_config(&mut self, config: &Config) -> Result<(), StoreError>;

    /// Persiste los agregados de métricas de la corrida.
    fn save_metrics(&mut self, metrics: &IndexMap<String, Json>) -> Result<(), StoreError>;

    /// Estado de salida persistido de un step (para reutilización fuera de
    /// rango). El layout del archivo lo fija el wrapper de ejecución.
    fn load_step_output(&self, ordinal: usize, step_id: &str) -> Result<Option<DesignState>, StoreError> {
        let Some(dir) = self.find_step_dir(ordinal, step_id) else {
            return Ok(None);
        };
        let path = dir.join(STATE_OUT_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        let state = serde_json::from_str(&text).map_err(|e| StoreError::Decode { path: path.clone(),
                                                                                 detail: e.to_string() })?;
        Ok(Some(state))
    }
}

/// Store scratch: sandboxes reales bajo `root`, todo lo demás en memoria.
#[derive(Debug)]
pub struct InMemoryRunStore {
    root: PathBuf,
    checkpoint: Option<Checkpoint>,
    metrics: IndexMap<String, Json>,
    config_fingerprint: Option<String>,
}

impl InMemoryRunStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(),
               checkpoint: None,
               metrics: IndexMap::new(),
               config_fingerprint: None }
    }

    pub fn metrics(&self) -> &IndexMap<String, Json> {
        &self.metrics
    }

    /// Fingerprint de la configuración resuelta persistida (si ya se guardó).
    pub fn config_fingerprint(&self) -> Option<&str> {
        self.config_fingerprint.as_deref()
    }

    /// Sub-store para una variante de fan-out, bajo su propio namespace.
    pub fn branch(&self, name: &str) -> InMemoryRunStore {
        InMemoryRunStore::new(self.root.join(slugify(name)))
    }
}

impl RunStore for InMemoryRunStore {
    fn root(&self) -> &Path {
        &self.root
    }

    fn step_dir(&mut self, ordinal: usize, step_id: &str) -> Result<PathBuf, StoreError> {
        let dir = self.root.join(step_dir_name(ordinal, step_id));
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        Ok(dir)
    }

    fn find_step_dir(&self, ordinal: usize, step_id: &str) -> Option<PathBuf> {
        let dir = self.root.join(step_dir_name(ordinal, step_id));
        dir.is_dir().then_some(dir)
    }

    fn save_checkpoint(&mut self, checkpoint: &Checkpoint) -> Result<(), StoreError> {
        self.checkpoint = Some(checkpoint.clone());
        Ok(())
    }

    fn load_checkpoint(&self) -> Result<Option<Checkpoint>, StoreError> {
        Ok(self.checkpoint.clone())
    }

    fn save_resolved_config(&mut self, config: &Config) -> Result<(), StoreError> {
        self.config_fingerprint = Some(config.fingerprint());
        Ok(())
    }

    fn save_metrics(&mut self, metrics: &IndexMap<String, Json>) -> Result<(), StoreError> {
        self.metrics = metrics.clone();
        Ok(())
    }
}
