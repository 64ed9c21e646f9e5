//! fab-domain: vocabulario compartido del motor de flujos EDA.
//!
//! Este crate no conoce steps ni flows; define únicamente:
//! - `Value`: primitivas tipadas de configuración (path ≠ string).
//! - `DesignFormat`: registro cerrado de artefactos de diseño que los steps
//!   intercambian vía estado.
//! - `DomainError`: errores de validación del dominio.

pub mod errors;
pub mod format;
pub mod value;

pub use errors::DomainError;
pub use format::DesignFormat;
pub use value::Value;
