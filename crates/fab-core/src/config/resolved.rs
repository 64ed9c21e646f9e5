//! Configuración resuelta e inmutable.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fab_domain::Value;

use crate::config::BuildContext;
use crate::hashing::hash_value;

/// Mapeo completamente tipado y libre de directivas, junto con el contexto
/// bajo el que se resolvió. Nunca se muta: toda "actualización" produce un
/// objeto nuevo (`derived`). Se comparte read-only con cada step vía `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    variables: IndexMap<String, Value>,
    design_dir: PathBuf,
    pdk: String,
    scl: String,
}

impl Config {
    pub(crate) fn new(variables: IndexMap<String, Value>, ctx: BuildContext) -> Self {
        Self { variables,
               design_dir: ctx.design_dir().to_path_buf(),
               pdk: ctx.pdk().to_string(),
               scl: ctx.scl().to_string() }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_number)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn path(&self, name: &str) -> Option<&Path> {
        self.get(name).and_then(Value::as_path)
    }

    /// Lista de rutas (p. ej. fuentes RTL globadas).
    pub fn paths(&self, name: &str) -> Option<Vec<&Path>> {
        self.get(name)
            .and_then(Value::as_list)
            .map(|items| items.iter().filter_map(Value::as_path).collect())
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

    pub fn variables(&self) -> &IndexMap<String, Value> {
        &self.variables
    }

    /// Config nueva con overrides aplicados; la original queda intacta.
    pub fn derived(&self, overrides: IndexMap<String, Value>) -> Config {
        let mut variables = self.variables.clone();
        for (k, v) in overrides {
            variables.insert(k, v);
        }
        Config { variables,
                 design_dir: self.design_dir.clone(),
                 pdk: self.pdk.clone(),
                 scl: self.scl.clone() }
    }

    /// Proyección del subconjunto consumido por un step (para persistirlo en
    /// su sandbox). Nombres inexistentes se omiten.
    pub fn slice<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> IndexMap<String, Value> {
        let mut out = IndexMap::new();
        for name in names {
            if let Some(v) = self.variables.get(name) {
                out.insert(name.to_string(), v.clone());
            }
        }
        out
    }

    /// Forma JSON persistible de la configuración completa.
    pub fn to_json(&self) -> serde_json::Value {
        let mut vars = serde_json::Map::new();
        for (k, v) in &self.variables {
            vars.insert(k.clone(), v.to_json());
        }
        json!({
            "design_dir": self.design_dir.display().to_string(),
            "pdk": self.pdk,
            "scl": self.scl,
            "variables": serde_json::Value::Object(vars),
        })
    }

    /// Identidad de contenido (hash del JSON canónico).
    pub fn fingerprint(&self) -> String {
        hash_value(&self.to_json())
    }

    pub fn into_shared(self) -> Arc<Config> {
        Arc::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        let mut vars = IndexMap::new();
        vars.insert("DESIGN_NAME".to_string(), Value::from("spm"));
        vars.insert("CLOCK_PERIOD".to_string(), Value::from(10.0));
        Config::new(vars, BuildContext::new("/d/spm", "sky130A", "sky130_fd_sc_hd"))
    }

    #[test]
    fn derived_leaves_the_original_untouched() {
        let base = sample();
        let before = base.fingerprint();
        let mut overrides = IndexMap::new();
        overrides.insert("CLOCK_PERIOD".to_string(), Value::from(12.5));
        let derived = base.derived(overrides);
        assert_eq!(base.fingerprint(), before);
        assert_eq!(derived.number("CLOCK_PERIOD"), Some(12.5));
        assert_eq!(base.number("CLOCK_PERIOD"), Some(10.0));
    }

    #[test]
    fn slice_projects_only_known_names() {
        let cfg = sample();
        let slice = cfg.slice(["CLOCK_PERIOD", "MISSING"]);
        assert_eq!(slice.len(), 1);
        assert_eq!(slice.get("CLOCK_PERIOD"), Some(&Value::from(10.0)));
    }

    #[test]
    fn fingerprint_is_content_identity() {
        assert_eq!(sample().fingerprint(), sample().fingerprint());
    }
}
