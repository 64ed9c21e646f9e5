//! Contrato de ejecución de steps.
//!
//! Un step es la unidad atómica y determinista del flow: consume la
//! configuración y un estado, produce exactamente un estado nuevo. El módulo
//! separa:
//! - `Step`: la interfaz de capacidad con una sola transformación sustituible
//!   (`run`), más declaraciones de identidad, dependencias y variables.
//! - `execute_step`: el wrapper fijo no sustituible — validación de inputs,
//!   sandbox, persistencia y validación del contrato de salida. Es la única
//!   puerta de entrada que usa el flow.

pub mod context;
pub mod definition;
pub mod harness;
pub mod outcome;
mod status;

pub use context::StepContext;
pub use definition::Step;
pub use harness::execute_step;
pub use outcome::StepOutcome;
pub use status::StepStatus;
