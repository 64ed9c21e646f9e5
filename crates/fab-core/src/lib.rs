//! fab-core: motor de orquestación determinista para pipelines EDA.
//!
//! El núcleo compone cuatro piezas:
//! - `config`: esquema tipado + builder que resuelve overlays condicionales,
//!   referencias cruzadas, rutas relativas al diseño y expresiones aritméticas
//!   en una configuración inmutable.
//! - `model`: el estado inmutable (vistas de artefactos + métricas) que se
//!   enhebra de step en step.
//! - `step`: contrato de ejecución — wrapper fijo de validación alrededor de
//!   una transformación sustituible, con sandbox por step.
//! - `flow`: secuenciador con selección de rango, checkpoints y fan-out de
//!   variantes en paralelo.
//!
//! Los stores (eventos y run directory) son traits; las implementaciones en
//! filesystem viven en `fab-persistence`. Nada aquí es un singleton: todo
//! registro se construye y se pasa explícitamente.

pub mod config;
pub mod constants;
pub mod errors;
pub mod event;
pub mod exec;
pub mod flow;
pub mod hashing;
pub mod model;
pub mod step;
pub mod store;

pub use config::{BuildContext, Config, ConfigBuilder, ConfigSchema, RawConfig, Variable, VariableType};
pub use errors::{ConfigError, ExecError, FlowError, StepError, StoreError, Violation};
pub use event::{EventStore, FlowEvent, FlowEventKind, InMemoryEventStore};
pub use exec::{write_script, ToolCommand, ToolOutput};
pub use flow::{evaluate_variants, Checkpoint, Flow, FlowRange, Objective, StepSelector, Variant};
pub use model::{DesignState, StateDiff, StateView};
pub use step::{execute_step, Step, StepContext, StepOutcome, StepStatus};
pub use store::{slugify, step_dir_name, InMemoryRunStore, RunStore};
