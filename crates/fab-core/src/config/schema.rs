//! Esquema de configuración: descriptores de variable y su agregación.
//!
//! Cada step contribuye su propio slice de descriptores; el flow agrega los
//! slices más los descriptores universales en un `ConfigSchema`. Los nombres
//! son globalmente únicos dentro del esquema agregado: una colisión entre
//! contribuyentes con descriptores distintos es error de construcción.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;

use fab_domain::Value;

use crate::errors::ConfigError;

/// Tipo declarado de una variable, anidable recursivamente.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableType {
    String,
    Number,
    Bool,
    Path,
    Enum(Vec<String>),
    List(Box<VariableType>),
    Dict(Box<VariableType>),
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableType::String => write!(f, "string"),
            VariableType::Number => write!(f, "number"),
            VariableType::Bool => write!(f, "bool"),
            VariableType::Path => write!(f, "path"),
            VariableType::Enum(choices) => write!(f, "enum({})", choices.join("|")),
            VariableType::List(inner) => write!(f, "list of {inner}"),
            VariableType::Dict(inner) => write!(f, "dict of {inner}"),
        }
    }
}

/// Descriptor de una variable reconocida.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub kind: VariableType,
    pub default: Option<Value>,
    pub required: bool,
    /// Nombres antiguos aceptados por compatibilidad.
    pub aliases: Vec<String>,
    pub description: String,
}

impl Variable {
    pub fn new(name: impl Into<String>, kind: VariableType) -> Self {
        Self { name: name.into(),
               kind,
               default: None,
               required: false,
               aliases: Vec::new(),
               description: String::new() }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }
}

/// Agregación ordenada de descriptores con control de unicidad.
#[derive(Debug, Clone, Default)]
pub struct ConfigSchema {
    variables: IndexMap<String, Variable>,
    owners: HashMap<String, String>,
    aliases: HashMap<String, String>,
}

impl ConfigSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptores universales presentes en todo flow, independientes de los
    /// steps que lo compongan.
    pub fn universal() -> Vec<Variable> {
        vec![Variable::new("DESIGN_NAME", VariableType::String).required()
                                                               .describe("Top-level module name of the design"),
             Variable::new("TOOL_TIMEOUT_SECS", VariableType::Number)
                 .with_default(3600.0)
                 .describe("Wall-clock budget for a single external tool invocation")]
    }

    /// Registra un descriptor aportado por `owner`.
    ///
    /// Dos contribuyentes pueden declarar la misma variable sólo si sus
    /// descriptores son idénticos (variable compartida).
    pub fn add(&mut self, owner: &str, var: Variable) -> Result<(), ConfigError> {
        if let Some(existing) = self.variables.get(&var.name) {
            if *existing != var {
                return Err(ConfigError::DuplicateVariable { name: var.name.clone(),
                                                            first: self.owners
                                                                       .get(&var.name)
                                                                       .cloned()
                                                                       .unwrap_or_default(),
                                                            second: owner.to_string() });
            }
            return Ok(());
        }
        for alias in &var.aliases {
            self.aliases.insert(alias.clone(), var.name.clone());
        }
        self.owners.insert(var.name.clone(), owner.to_string());
        self.variables.insert(var.name.clone(), var);
        Ok(())
    }

    pub fn extend(&mut self, owner: &str, vars: Vec<Variable>) -> Result<(), ConfigError> {
        for v in vars {
            self.add(owner, v)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// Busca por nombre canónico o alias de compatibilidad.
    pub fn resolve_name(&self, raw: &str) -> Option<&Variable> {
        if let Some(v) = self.variables.get(raw) {
            return Some(v);
        }
        self.aliases.get(raw).and_then(|canonical| self.variables.get(canonical))
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    pub fn owner_of(&self, name: &str) -> Option<&str> {
        self.owners.get(name).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_with_identical_descriptor_is_shared() {
        let mut schema = ConfigSchema::new();
        let v = Variable::new("CLOCK_PERIOD", VariableType::Number).required();
        schema.add("synthesis", v.clone()).unwrap();
        schema.add("sta", v).unwrap();
        assert_eq!(schema.len(), 1);
        assert_eq!(schema.owner_of("CLOCK_PERIOD"), Some("synthesis"));
    }

    #[test]
    fn duplicate_with_different_descriptor_is_rejected() {
        let mut schema = ConfigSchema::new();
        schema.add("a", Variable::new("X", VariableType::Number)).unwrap();
        let err = schema.add("b", Variable::new("X", VariableType::String)).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateVariable { .. }));
    }

    #[test]
    fn alias_resolves_to_canonical() {
        let mut schema = ConfigSchema::new();
        schema.add("synthesis",
                   Variable::new("SYNTH_STRATEGY", VariableType::String).with_alias("STRATEGY"))
              .unwrap();
        assert_eq!(schema.resolve_name("STRATEGY").unwrap().name, "SYNTH_STRATEGY");
    }
}
