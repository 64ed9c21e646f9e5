//! Errores del dominio (simples, sin contexto de ejecución).

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum DomainError {
    #[error("unknown design format tag '{0}'")] UnknownFormat(String),
    #[error("validation error: {0}")] Validation(String),
}
