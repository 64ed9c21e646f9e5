//! Builder de configuración.
//!
//! `ConfigBuilder::build` es una función pura de (esquema, input crudo,
//! contexto). Procesa el input en orden de declaración:
//! 1. overlays `pdk::`/`scl::` se funden al nivel superior sólo si su patrón
//!    calza con el valor activo del contexto; la precedencia entre overlay y
//!    declaración top-level es estrictamente por orden de declaración.
//! 2. `ref::` interpola exactamente una variable string ya resuelta.
//! 3. `dir::`/`glob::` anclan rutas al directorio de diseño; `glob::` expande
//!    no recursivamente y siempre produce lista; una ruta que escapa del
//!    directorio de diseño se resuelve literal, sin expansión.
//! 4. `expr::` evalúa aritmética sobre variables numéricas ya resueltas.
//! 5. Coerción contra el tipo declarado. Todas las violaciones del input
//!    completo se reportan juntas en un único error.

use indexmap::IndexMap;
use serde_json::Value as Json;
use std::path::{Component, Path, PathBuf};

use fab_domain::Value;

use crate::config::expr;
use crate::config::glob::glob_match;
use crate::config::raw::{DIRECTIVE_DIR, DIRECTIVE_EXPR, DIRECTIVE_GLOB, DIRECTIVE_REF, OVERLAY_PDK, OVERLAY_SCL};
use crate::config::{BuildContext, Config, ConfigSchema, RawConfig, VariableType};
use crate::errors::{ConfigError, Violation};

pub struct ConfigBuilder {
    schema: ConfigSchema,
    ctx: BuildContext,
}

impl ConfigBuilder {
    pub fn new(schema: ConfigSchema, ctx: BuildContext) -> Self {
        Self { schema, ctx }
    }

    /// Consume el input crudo y produce una configuración inmutable, o un
    /// único `ConfigError::Invalid` con todas las violaciones encontradas.
    pub fn build(&self, raw: RawConfig) -> Result<Config, ConfigError> {
        let mut violations: Vec<Violation> = Vec::new();
        let flattened = self.flatten_overlays(&raw, &mut violations);

        let mut resolved: IndexMap<String, Value> = IndexMap::new();
        for (name, raw_value) in &flattened {
            let Some(var) = self.schema.resolve_name(name) else {
                violations.push(Violation::new(name.clone(), "unknown variable"));
                continue;
            };
            if var.name != *name {
                log::warn!("'{}' is a compatibility alias of '{}'", name, var.name);
            }
            let mut errors: Vec<String> = Vec::new();
            let pre = self.preprocess(raw_value, &resolved, &mut errors);
            if !errors.is_empty() {
                violations.extend(errors.into_iter().map(|e| Violation::new(name.clone(), e)));
                continue;
            }
            match coerce(&pre, &var.kind) {
                Ok(value) => {
                    resolved.insert(var.name.clone(), value);
                }
                Err(detail) => {
                    violations.push(Violation::new(name.clone(), format!("expected {}: {detail}", var.kind)));
                }
            }
        }

        for var in self.schema.variables() {
            if resolved.contains_key(&var.name) {
                continue;
            }
            if let Some(default) = &var.default {
                resolved.insert(var.name.clone(), default.clone());
            } else if var.required {
                violations.push(Violation::new(var.name.clone(), "required variable missing"));
            }
        }

        if !violations.is_empty() {
            return Err(ConfigError::Invalid { violations });
        }
        log::debug!("configuration resolved: {} variable(s)", resolved.len());
        Ok(Config::new(resolved, self.ctx.clone()))
    }

    /// Paso 1: aplana overlays condicionales preservando el orden de
    /// declaración. `IndexMap::insert` conserva la posición de la primera
    /// aparición y sobrescribe el valor: el último escritor gana.
    fn flatten_overlays(&self, raw: &RawConfig, violations: &mut Vec<Violation>) -> IndexMap<String, Json> {
        let mut out: IndexMap<String, Json> = IndexMap::new();
        for (key, value) in raw.entries() {
            let overlay = if let Some(pattern) = key.strip_prefix(OVERLAY_PDK) {
                Some((pattern, self.ctx.pdk()))
            } else if let Some(pattern) = key.strip_prefix(OVERLAY_SCL) {
                Some((pattern, self.ctx.scl()))
            } else {
                None
            };
            match overlay {
                Some((pattern, active)) => {
                    let Some(map) = value.as_object() else {
                        violations.push(Violation::new(key.clone(), "overlay value must be an object"));
                        continue;
                    };
                    if glob_match(pattern, active) {
                        for (k, v) in map {
                            out.insert(k.clone(), v.clone());
                        }
                    } else {
                        log::debug!("overlay '{key}' skipped: '{pattern}' does not match '{active}'");
                    }
                }
                None => {
                    out.insert(key.clone(), value.clone());
                }
            }
        }
        out
    }

    /// Pasos 2–4: expansión recursiva de directivas codificadas en strings.
    /// Los errores se acumulan en `errors`; el valor devuelto sólo es
    /// significativo cuando `errors` queda vacío.
    fn preprocess(&self, value: &Json, resolved: &IndexMap<String, Value>, errors: &mut Vec<String>) -> Json {
        match value {
            Json::String(s) => {
                if let Some(rest) = s.strip_prefix(DIRECTIVE_REF) {
                    return self.resolve_ref(rest, resolved, errors);
                }
                if let Some(rest) = s.strip_prefix(DIRECTIVE_DIR) {
                    let anchored = normalize_lexical(&self.ctx.design_dir().join(rest));
                    return Json::String(anchored.display().to_string());
                }
                if let Some(rest) = s.strip_prefix(DIRECTIVE_GLOB) {
                    return self.expand_glob(rest);
                }
                if let Some(rest) = s.strip_prefix(DIRECTIVE_EXPR) {
                    let lookup = |name: &str| resolved.get(name).and_then(Value::as_number);
                    return match expr::evaluate(rest, &lookup) {
                        Ok(n) => serde_json::json!(n),
                        Err(e) => {
                            errors.push(e.to_string());
                            value.clone()
                        }
                    };
                }
                value.clone()
            }
            Json::Array(items) => {
                Json::Array(items.iter().map(|v| self.preprocess(v, resolved, errors)).collect())
            }
            Json::Object(map) => {
                let mut out = serde_json::Map::new();
                for (k, v) in map {
                    out.insert(k.clone(), self.preprocess(v, resolved, errors));
                }
                Json::Object(out)
            }
            _ => value.clone(),
        }
    }

    /// `ref::`: exactamente una ocurrencia `$NAME`, que debe nombrar una
    /// variable string resuelta antes en el orden de declaración.
    fn resolve_ref(&self, rest: &str, resolved: &IndexMap<String, Value>, errors: &mut Vec<String>) -> Json {
        let refs = scan_references(rest);
        let name = match refs.as_slice() {
            [single] => single,
            [] => {
                errors.push("ref:: value contains no '$VARIABLE' reference".to_string());
                return Json::String(rest.to_string());
            }
            _ => {
                errors.push(format!("ref:: value must reference exactly one variable, found {}", refs.len()));
                return Json::String(rest.to_string());
            }
        };
        match resolved.get(name.as_str()) {
            Some(Value::String(s)) => Json::String(rest.replacen(&format!("${name}"), s, 1)),
            Some(other) => {
                errors.push(format!("'${name}' does not reference a string variable (found {other})"));
                Json::String(rest.to_string())
            }
            None => {
                errors.push(format!("'${name}' references an unknown or not-yet-resolved variable"));
                Json::String(rest.to_string())
            }
        }
    }

    /// `glob::`: expansión no recursiva bajo el directorio de diseño, lista
    /// ordenada. Fuera del directorio de diseño la ruta se devuelve literal.
    fn expand_glob(&self, rest: &str) -> Json {
        let root = normalize_lexical(self.ctx.design_dir());
        let anchored = normalize_lexical(&self.ctx.design_dir().join(rest));
        if !anchored.starts_with(&root) {
            log::warn!("glob target '{}' escapes the design directory; resolving literally", rest);
            return Json::String(anchored.display().to_string());
        }
        let (parent, pattern) = match (anchored.parent(), anchored.file_name()) {
            (Some(p), Some(f)) => (p.to_path_buf(), f.to_string_lossy().into_owned()),
            _ => (root, "*".to_string()),
        };
        let mut matches: Vec<String> = Vec::new();
        match std::fs::read_dir(&parent) {
            Ok(entries) => {
                for entry in entries.flatten() {
                    let file_name = entry.file_name().to_string_lossy().into_owned();
                    if glob_match(&pattern, &file_name) {
                        matches.push(parent.join(file_name).display().to_string());
                    }
                }
                matches.sort();
            }
            Err(e) => {
                log::warn!("glob '{rest}': cannot read {}: {e}", parent.display());
            }
        }
        Json::Array(matches.into_iter().map(Json::String).collect())
    }
}

/// Ocurrencias `$IDENT` dentro de un valor `ref::`.
fn scan_references(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut refs = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '$' {
            let start = i + 1;
            let mut end = start;
            while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_') {
                end += 1;
            }
            if end > start {
                refs.push(chars[start..end].iter().collect());
            }
            i = end;
        } else {
            i += 1;
        }
    }
    refs
}

/// Normalización léxica (`.` y `..`), sin tocar el filesystem.
fn normalize_lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Paso 5: coerción de un JSON preprocesado contra el tipo declarado.
fn coerce(value: &Json, kind: &VariableType) -> Result<Value, String> {
    match kind {
        VariableType::String => match value {
            Json::String(s) => Ok(Value::String(s.clone())),
            Json::Number(n) => Ok(Value::String(render_number(n))),
            other => Err(describe_json(other)),
        },
        VariableType::Number => match value {
            Json::Number(n) => n.as_f64().map(Value::Number).ok_or_else(|| "number out of range".to_string()),
            Json::String(s) => s.trim()
                                .parse::<f64>()
                                .map(Value::Number)
                                .map_err(|_| format!("'{s}' is not a number")),
            other => Err(describe_json(other)),
        },
        VariableType::Bool => match value {
            Json::Bool(b) => Ok(Value::Bool(*b)),
            Json::String(s) => match s.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(format!("'{s}' is not a boolean")),
            },
            Json::Number(n) => match n.as_f64() {
                Some(f) if f == 1.0 => Ok(Value::Bool(true)),
                Some(f) if f == 0.0 => Ok(Value::Bool(false)),
                _ => Err("only 0/1 coerce to boolean".to_string()),
            },
            other => Err(describe_json(other)),
        },
        VariableType::Enum(choices) => match value {
            Json::String(s) if choices.iter().any(|c| c == s) => Ok(Value::String(s.clone())),
            Json::String(s) => Err(format!("'{s}' is not one of [{}]", choices.join(", "))),
            other => Err(describe_json(other)),
        },
        VariableType::Path => match value {
            Json::String(s) => Ok(Value::Path(PathBuf::from(s))),
            other => Err(describe_json(other)),
        },
        VariableType::List(inner) => match value {
            Json::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(coerce(item, inner)?);
                }
                Ok(Value::List(out))
            }
            Json::Null => Err("null is not a value".to_string()),
            // un escalar se promueve a lista de un elemento
            scalar => Ok(Value::List(vec![coerce(scalar, inner)?])),
        },
        VariableType::Dict(inner) => match value {
            Json::Object(map) => {
                let mut out = IndexMap::new();
                for (k, v) in map {
                    out.insert(k.clone(), coerce(v, inner)?);
                }
                Ok(Value::Dict(out))
            }
            other => Err(describe_json(other)),
        },
    }
}

fn render_number(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 9e15 => format!("{}", f as i64),
        Some(f) => format!("{f}"),
        None => n.to_string(),
    }
}

fn describe_json(value: &Json) -> String {
    match value {
        Json::Null => "found null".to_string(),
        Json::Bool(_) => "found a boolean".to_string(),
        Json::Number(_) => "found a number".to_string(),
        Json::String(s) => format!("found string '{s}'"),
        Json::Array(_) => "found a list".to_string(),
        Json::Object(_) => "found an object".to_string(),
    }
}
