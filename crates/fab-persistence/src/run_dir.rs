//! Layout en disco de una corrida.
//!
//! ```text
//! <run root>/
//!   resolved_config.json    configuración final resuelta
//!   events.jsonl            journal de eventos
//!   checkpoint.json         (cursor, estado) para reanudación
//!   metrics.json            agregado legible por máquina
//!   metrics.csv             agregado tabular
//!   NN-<slug>/              sandbox de cada step ejecutado
//!     config.json           slice de configuración consumido
//!     state_in.json         estado consumido
//!     state_out.json        estado producido
//!     metrics.json          fragmento de métricas del step
//!     <logs y artefactos de la herramienta>
//! ```
//! Los archivos internos del sandbox los escribe el wrapper de ejecución del
//! core; este store resuelve directorios y persiste lo del nivel del run.

use indexmap::IndexMap;
use serde_json::Value as Json;
use std::path::{Path, PathBuf};

use fab_core::flow::Checkpoint;
use fab_core::store::{step_dir_name, RunStore};
use fab_core::{Config, StoreError};

use crate::metrics;

pub const RESOLVED_CONFIG_FILE: &str = "resolved_config.json";
pub const CHECKPOINT_FILE: &str = "checkpoint.json";
pub const METRICS_JSON_FILE: &str = "metrics.json";
pub const METRICS_CSV_FILE: &str = "metrics.csv";

/// Store de corrida sobre filesystem.
#[derive(Debug, Clone)]
pub struct FsRunStore {
    root: PathBuf,
}

impl FsRunStore {
    /// Crea (o reutiliza, al reanudar) el directorio `runs_root/tag`.
    pub fn create(runs_root: &Path, tag: &str) -> Result<Self, StoreError> {
        let root = runs_root.join(tag);
        std::fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        log::info!("run directory at {}", root.display());
        Ok(Self { root })
    }

    /// Abre un run directory existente (para reanudar o inspeccionar).
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        if !root.is_dir() {
            return Err(StoreError::Io { path: root.to_path_buf(),
                                        detail: "run directory does not exist".to_string() });
        }
        Ok(Self { root: root.to_path_buf() })
    }

    /// Sub-store para una variante de fan-out, bajo su propio namespace.
    pub fn branch(&self, name: &str) -> Result<FsRunStore, StoreError> {
        let root = self.root.join(fab_core::slugify(name));
        std::fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        Ok(Self { root })
    }

    fn write_json<T: serde::Serialize>(&self, file: &str, value: &T) -> Result<(), StoreError> {
        let path = self.root.join(file);
        let text = serde_json::to_string_pretty(value).map_err(|e| StoreError::Encode { detail: e.to_string() })?;
        std::fs::write(&path, text).map_err(|e| StoreError::io(&path, e))
    }
}

impl RunStore for FsRunStore {
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
        self.write_json(CHECKPOINT_FILE, checkpoint)
    }

    fn load_checkpoint(&self) -> Result<Option<Checkpoint>, StoreError> {
        let path = self.root.join(CHECKPOINT_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        let cp = serde_json::from_str(&text).map_err(|e| StoreError::Decode { path: path.clone(),
                                                                              detail: e.to_string() })?;
        Ok(Some(cp))
    }

    fn save_resolved_config(&mut self, config: &Config) -> Result<(), StoreError> {
        self.write_json(RESOLVED_CONFIG_FILE, &config.to_json())
    }

    fn save_metrics(&mut self, metrics: &IndexMap<String, Json>) -> Result<(), StoreError> {
        self.write_json(METRICS_JSON_FILE, metrics)?;
        let csv_path = self.root.join(METRICS_CSV_FILE);
        std::fs::write(&csv_path, metrics::render_csv(metrics)).map_err(|e| StoreError::io(&csv_path, e))
    }
}
