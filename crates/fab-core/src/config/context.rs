//! Contexto ambiente de construcción de configuración.

use std::path::{Path, PathBuf};

/// Valores ambiente contra los que se resuelven overlays y atajos de ruta.
/// No es configuración del diseño: describe dónde y sobre qué proceso se está
/// construyendo.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildContext {
    /// Directorio raíz del diseño; ancla de `dir::` y `glob::`.
    design_dir: PathBuf,
    /// Identificador del proceso activo (clave de overlays `pdk::`).
    pdk: String,
    /// Librería de celdas estándar activa (clave de overlays `scl::`).
    scl: String,
}

impl BuildContext {
    pub fn new(design_dir: impl Into<PathBuf>, pdk: impl Into<String>, scl: impl Into<String>) -> Self {
        Self { design_dir: design_dir.into(), pdk: pdk.into(), scl: scl.into() }
    }

    pub fn design_dir(&self) -> &Path {
        &self.design_dir
    }

    pub fn pdk(&self) -> &str {
        &self.pdk
    }

    pub fn scl(&self) -> &str {
        &self.scl
    }
}
