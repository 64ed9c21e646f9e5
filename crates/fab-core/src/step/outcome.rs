//! Resultado declarado de la transformación interna de un step.

use indexmap::IndexMap;
use serde_json::Value as Json;
use std::path::PathBuf;

use fab_domain::DesignFormat;

use crate::model::StateView;

/// Lo que un step reporta al wrapper: vistas nuevas/actualizadas (sólo de sus
/// outputs declarados) y métricas. El wrapper lo fusiona sobre el estado de
/// entrada; el step nunca construye el estado de salida directamente.
#[derive(Debug, Clone, Default)]
pub struct StepOutcome {
    views: IndexMap<DesignFormat, StateView>,
    metrics: IndexMap<String, Json>,
}

impl StepOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_view(mut self, format: DesignFormat, path: impl Into<PathBuf>) -> Self {
        self.views.insert(format, StateView::Path(path.into()));
        self
    }

    pub fn with_group(mut self, format: DesignFormat, group: IndexMap<String, PathBuf>) -> Self {
        self.views.insert(format, StateView::Group(group));
        self
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: Json) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    pub fn views(&self) -> &IndexMap<DesignFormat, StateView> {
        &self.views
    }

    pub fn metrics(&self) -> &IndexMap<String, Json> {
        &self.metrics
    }

    pub(crate) fn into_parts(self) -> (IndexMap<DesignFormat, StateView>, IndexMap<String, Json>) {
        (self.views, self.metrics)
    }
}
