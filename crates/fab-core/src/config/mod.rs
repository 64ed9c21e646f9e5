//! Configuración tipada: esquema, input crudo y builder.
//!
//! El pipeline de construcción es una función pura de (esquema, input crudo,
//! contexto): overlays condicionales → referencias cruzadas → atajos de ruta →
//! expresiones aritméticas → coerción de tipos. O produce una `Config`
//! inmutable completa, o falla atómicamente con todas las violaciones juntas.

pub mod builder;
pub mod context;
pub mod expr;
pub mod glob;
pub mod raw;
pub mod resolved;
pub mod schema;

pub use builder::ConfigBuilder;
pub use context::BuildContext;
pub use raw::RawConfig;
pub use resolved::Config;
pub use schema::{ConfigSchema, Variable, VariableType};
