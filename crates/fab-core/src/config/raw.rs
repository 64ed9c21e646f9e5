//! Input crudo de configuración.
//!
//! Un `RawConfig` es el mapeo declarativo tal como lo escribió el usuario:
//! literales JSON más directivas de preprocesamiento codificadas como strings
//! (`ref::`, `dir::`, `glob::`, `expr::`) y claves de overlay (`pdk::`,
//! `scl::`). El orden de declaración se preserva porque la precedencia
//! overlay-vs-top-level y la resolución de referencias dependen de él.
//! Se consume exactamente una vez por el builder.

use indexmap::IndexMap;
use serde_json::Value as Json;
use std::path::Path;

use crate::errors::ConfigError;

/// Prefijo de overlay condicionado al proceso activo.
pub const OVERLAY_PDK: &str = "pdk::";
/// Prefijo de overlay condicionado a la librería de celdas activa.
pub const OVERLAY_SCL: &str = "scl::";
/// Directiva de referencia cruzada a una variable string ya resuelta.
pub const DIRECTIVE_REF: &str = "ref::";
/// Directiva de ruta relativa al directorio de diseño.
pub const DIRECTIVE_DIR: &str = "dir::";
/// Directiva de glob no recursivo bajo el directorio de diseño.
pub const DIRECTIVE_GLOB: &str = "glob::";
/// Directiva de expresión aritmética.
pub const DIRECTIVE_EXPR: &str = "expr::";

/// Mapeo crudo ordenado por declaración.
#[derive(Debug, Clone, PartialEq)]
pub struct RawConfig {
    entries: IndexMap<String, Json>,
}

impl RawConfig {
    pub fn new() -> Self {
        Self { entries: IndexMap::new() }
    }

    /// Construye desde un `serde_json::Value` que debe ser objeto.
    pub fn from_value(value: Json, origin: &Path) -> Result<Self, ConfigError> {
        match value {
            Json::Object(map) => {
                let mut entries = IndexMap::new();
                for (k, v) in map {
                    entries.insert(k, v);
                }
                Ok(Self { entries })
            }
            _ => Err(ConfigError::NotAnObject { path: origin.to_path_buf() }),
        }
    }

    /// Lee un archivo declarativo JSON.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read { path: path.to_path_buf(),
                                                                                 detail: e.to_string() })?;
        let value: Json = serde_json::from_str(&text).map_err(|e| ConfigError::Read { path: path.to_path_buf(),
                                                                                      detail: e.to_string() })?;
        Self::from_value(value, path)
    }

    /// Declaración programática; equivale a una entrada más del archivo.
    pub fn set(mut self, key: impl Into<String>, value: Json) -> Self {
        self.entries.insert(key.into(), value);
        self
    }

    pub(crate) fn entries(&self) -> &IndexMap<String, Json> {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RawConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn declaration_order_is_preserved() {
        let raw = RawConfig::from_value(json!({"Z": 1, "pdk::sky130*": {"A": 2}, "A": 3}),
                                        Path::new("<test>")).unwrap();
        let keys: Vec<&str> = raw.entries().keys().map(|s| s.as_str()).collect();
        assert_eq!(keys, vec!["Z", "pdk::sky130*", "A"]);
    }

    #[test]
    fn non_object_input_is_rejected() {
        let err = RawConfig::from_value(json!([1, 2]), Path::new("cfg.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotAnObject { .. }));
    }
}
