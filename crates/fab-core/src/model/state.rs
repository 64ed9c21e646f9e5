//! Estado inmutable del diseño.
//!
//! Un `DesignState` es el snapshot que se enhebra de step en step: vistas de
//! artefacto (tag de formato → ruta tipada, o grupo anidado tag → ruta) más un
//! mapa de métricas. Nunca se muta en sitio: `derive` y `with_metrics`
//! producen estados nuevos por copia estructural. Dos estados son
//! intercambiables si sus mapas son estructuralmente iguales, sin importar
//! identidad — esa regla sustenta el determinismo de los steps.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::path::{Path, PathBuf};

use fab_domain::DesignFormat;

use crate::hashing::hash_value;

/// Una vista de artefacto: ruta única o grupo anidado (p. ej. esquinas de
/// extracción nom/min/max).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateView {
    Path(PathBuf),
    Group(IndexMap<String, PathBuf>),
}

impl StateView {
    pub fn path(&self) -> Option<&Path> {
        match self {
            StateView::Path(p) => Some(p),
            StateView::Group(_) => None,
        }
    }

    pub fn group(&self) -> Option<&IndexMap<String, PathBuf>> {
        match self {
            StateView::Path(_) => None,
            StateView::Group(g) => Some(g),
        }
    }
}

impl From<PathBuf> for StateView {
    fn from(p: PathBuf) -> Self {
        StateView::Path(p)
    }
}

/// Snapshot inmutable: vistas + métricas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignState {
    #[serde(default)]
    views: IndexMap<DesignFormat, StateView>,
    #[serde(default)]
    metrics: IndexMap<String, Json>,
}

/// Diferencia estructural entre dos estados.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDiff {
    pub added_views: Vec<DesignFormat>,
    pub removed_views: Vec<DesignFormat>,
    pub changed_views: Vec<DesignFormat>,
    pub changed_metrics: Vec<String>,
    pub removed_metrics: Vec<String>,
}

impl StateDiff {
    pub fn is_empty(&self) -> bool {
        self.added_views.is_empty()
            && self.removed_views.is_empty()
            && self.changed_views.is_empty()
            && self.changed_metrics.is_empty()
            && self.removed_metrics.is_empty()
    }
}

impl DesignState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_views(views: IndexMap<DesignFormat, StateView>) -> Self {
        Self { views, metrics: IndexMap::new() }
    }

    pub fn view(&self, format: DesignFormat) -> Option<&StateView> {
        self.views.get(&format)
    }

    /// Ruta de una vista simple; `None` si no existe o es grupo.
    pub fn path_of(&self, format: DesignFormat) -> Option<&Path> {
        self.views.get(&format).and_then(StateView::path)
    }

    pub fn views(&self) -> &IndexMap<DesignFormat, StateView> {
        &self.views
    }

    pub fn metric(&self, name: &str) -> Option<&Json> {
        self.metrics.get(name)
    }

    pub fn metrics(&self) -> &IndexMap<String, Json> {
        &self.metrics
    }

    /// Estado nuevo con vistas fusionadas (copy-on-write). El receptor no
    /// cambia.
    pub fn derive(&self, changes: IndexMap<DesignFormat, StateView>) -> DesignState {
        let mut views = self.views.clone();
        for (k, v) in changes {
            views.insert(k, v);
        }
        DesignState { views, metrics: self.metrics.clone() }
    }

    /// Estado nuevo con métricas fusionadas; mismo nombre: el último gana.
    pub fn with_metrics(&self, updates: IndexMap<String, Json>) -> DesignState {
        let mut metrics = self.metrics.clone();
        for (k, v) in updates {
            metrics.insert(k, v);
        }
        DesignState { views: self.views.clone(), metrics }
    }

    /// Fusión conservadora para reanudación: `other` sólo rellena lo que el
    /// estado vivo no tiene; en conflicto gana el receptor.
    pub fn merge_missing_from(&self, other: &DesignState) -> DesignState {
        let mut views = self.views.clone();
        for (k, v) in &other.views {
            if !views.contains_key(k) {
                views.insert(*k, v.clone());
            }
        }
        let mut metrics = self.metrics.clone();
        for (k, v) in &other.metrics {
            if !metrics.contains_key(k) {
                metrics.insert(k.clone(), v.clone());
            }
        }
        DesignState { views, metrics }
    }

    /// Identidad estructural de contenido: hash del JSON canónico. Dos estados
    /// estructuralmente iguales comparten fingerprint sin importar el orden de
    /// inserción.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_value(self).expect("state serializa a JSON");
        hash_value(&json)
    }

    /// Diferencia estructural contra `other` (self = después, other = antes).
    pub fn diff(&self, other: &DesignState) -> StateDiff {
        let mut diff = StateDiff::default();
        for (k, v) in &self.views {
            match other.views.get(k) {
                None => diff.added_views.push(*k),
                Some(old) if old != v => diff.changed_views.push(*k),
                Some(_) => {}
            }
        }
        for k in other.views.keys() {
            if !self.views.contains_key(k) {
                diff.removed_views.push(*k);
            }
        }
        for (k, v) in &self.metrics {
            if other.metrics.get(k) != Some(v) {
                diff.changed_metrics.push(k.clone());
            }
        }
        for k in other.metrics.keys() {
            if !self.metrics.contains_key(k) {
                diff.removed_metrics.push(k.clone());
            }
        }
        diff
    }
}
